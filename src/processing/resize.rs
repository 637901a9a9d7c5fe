//! Resampling and JPEG encoding

use std::io::Write;

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Quality;
use crate::error::{Result, ResizeError};

/// Available resize filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Nearest neighbor (fastest, lowest quality)
    Nearest,
    /// Triangle (linear interpolation)
    Triangle,
    /// Catmull-Rom bicubic spline
    #[default]
    CatmullRom,
    /// Gaussian blur
    Gaussian,
    /// Lanczos with radius 3
    Lanczos3,
}

impl From<FilterType> for image::imageops::FilterType {
    fn from(filter: FilterType) -> Self {
        match filter {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Triangle => image::imageops::FilterType::Triangle,
            FilterType::CatmullRom => image::imageops::FilterType::CatmullRom,
            FilterType::Gaussian => image::imageops::FilterType::Gaussian,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// Scales decoded images to a target width and encodes them as JPEG
pub struct ImageResizer {
    filter: FilterType,
}

impl ImageResizer {
    /// Create a resizer using bicubic interpolation
    pub fn new() -> Self {
        Self {
            filter: FilterType::CatmullRom,
        }
    }

    /// Create a resizer with custom filter
    pub fn with_filter(filter: FilterType) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> FilterType {
        self.filter
    }

    /// Render `image` into a raster of exactly `width` x `height`
    pub fn resize_exact(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        debug!(
            "Resizing {}x{} -> {}x{} using {:?}",
            image.width(),
            image.height(),
            width,
            height,
            self.filter
        );

        image.resize_exact(width, height, self.filter.into())
    }
}

impl Default for ImageResizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode `image` as baseline JPEG at the given quality
pub fn encode_jpeg<W: Write>(image: &DynamicImage, quality: Quality, mut writer: W) -> Result<()> {
    let (width, height) = (image.width(), image.height());

    {
        let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality.value());

        // JPEG has no alpha channel; everything but grayscale goes through RGB
        match image {
            DynamicImage::ImageLuma8(buffer) => {
                encoder.encode(buffer.as_raw(), width, height, ColorType::L8)?;
            }
            DynamicImage::ImageRgb8(buffer) => {
                encoder.encode(buffer.as_raw(), width, height, ColorType::Rgb8)?;
            }
            other => {
                let buffer = other.to_rgb8();
                encoder.encode(buffer.as_raw(), width, height, ColorType::Rgb8)?;
            }
        }
    }

    writer.flush().map_err(ResizeError::from)
}
