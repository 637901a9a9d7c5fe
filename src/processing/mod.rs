//! Core image processing functionality

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use serde::Serialize;
use tracing::debug;

use crate::config::{Quality, ResizeJob};
use crate::error::{ErrorContext, Result};
use crate::output::{same_file, stage_replacement, write_atomically, OutputPlan, StagedReplacement};

pub mod dimensions;
pub mod formats;
pub mod resize;
pub mod validation;

pub use dimensions::*;
pub use formats::*;
pub use resize::*;
pub use validation::*;

/// Files at least this large are decoded through a memory map
#[cfg(feature = "mmap")]
const MMAP_THRESHOLD: u64 = 100 * 1024 * 1024; // 100MB

/// What happened to one source image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageAction {
    /// Rescaled and re-encoded
    Resized,
    /// Already small enough; copied byte for byte
    Copied,
    /// Already small enough and already at its destination
    Unchanged,
}

/// Per-image result
#[derive(Debug, Clone, Serialize)]
pub struct ImageReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub action: ImageAction,
    pub orientation: Orientation,
    pub original_width: u32,
    pub original_height: u32,
    pub output_width: u32,
    pub output_height: u32,
    pub input_size: u64,
    pub output_size: u64,
    pub processing_time: Duration,
}

impl ImageReport {
    /// Get size reduction percentage
    pub fn size_reduction(&self) -> f64 {
        if self.input_size == 0 {
            return 0.0;
        }
        let reduction = self.input_size.saturating_sub(self.output_size);
        (reduction as f64 / self.input_size as f64) * 100.0
    }
}

/// An image that has been processed; in-place outputs still await commit
#[derive(Debug)]
pub struct ProcessedImage {
    pub report: ImageReport,
    pub staged: Option<StagedReplacement>,
}

/// Processes single images according to a resize job
pub struct ProcessingEngine {
    validator: ImageValidator,
    resizer: ImageResizer,
    target_width: u32,
    quality: Quality,
}

impl ProcessingEngine {
    /// Create an engine for the given job
    pub fn new(job: &ResizeJob) -> Self {
        let resizer = ImageResizer::with_filter(job.filter);
        debug!(
            "Engine: {}px, quality {}, {:?} filter",
            job.target_width,
            job.quality,
            resizer.filter()
        );

        Self {
            validator: ImageValidator::with_limits(job.max_file_size, job.max_image_pixels),
            resizer,
            target_width: job.target_width,
            quality: job.quality,
        }
    }

    /// Process one source image into the output plan
    pub fn process_file(&self, source: &Path, plan: &OutputPlan) -> Result<ProcessedImage> {
        let start_time = Instant::now();
        let info = self.validator.validate_file(source)?;
        let target = plan.target_for(source)?;
        let permissions = std::fs::metadata(source).ok().map(|m| m.permissions());

        debug!("Processing {:?} ({}x{}) -> {:?}", source, info.width, info.height, target);

        let orientation = Orientation::of(info.width, info.height);
        // Outputs landing on their own source wait for the batch to finish
        let overwrites_source = matches!(plan, OutputPlan::InPlace) || same_file(source, &target);
        let mut staged = None;

        let (action, output_width, output_height, output_size) =
            match plan_resize(info.width, info.height, self.target_width)? {
                ResizePlan::Copy => {
                    if overwrites_source {
                        debug!("{:?} already fits, leaving it in place", source);
                        (ImageAction::Unchanged, info.width, info.height, info.file_size)
                    } else {
                        debug!("{:?} already fits, copying unchanged", source);
                        let size = write_atomically(&target, permissions, |writer| {
                            copy_file_into(source, writer)
                        })?;
                        (ImageAction::Copied, info.width, info.height, size)
                    }
                }
                ResizePlan::Scale { width, height } => {
                    let image = self.load_image(&info)?;
                    let resized = self.resizer.resize_exact(&image, width, height);
                    drop(image);

                    let quality = self.quality;
                    let encode = |writer: &mut dyn Write| encode_jpeg(&resized, quality, writer);

                    let size = if overwrites_source {
                        let replacement = stage_replacement(source, permissions, encode)?;
                        let size = std::fs::metadata(replacement.staged_path())
                            .map(|m| m.len())
                            .unwrap_or(0);
                        staged = Some(replacement);
                        size
                    } else {
                        write_atomically(&target, permissions, encode)?
                    };

                    (ImageAction::Resized, width, height, size)
                }
            };

        let report = ImageReport {
            source: source.to_path_buf(),
            output: target,
            action,
            orientation,
            original_width: info.width,
            original_height: info.height,
            output_width,
            output_height,
            input_size: info.file_size,
            output_size,
            processing_time: start_time.elapsed(),
        };

        debug!(
            "{:?}: {:?} {}x{} -> {}x{} ({:.1}% smaller)",
            report.source,
            report.action,
            report.original_width,
            report.original_height,
            report.output_width,
            report.output_height,
            report.size_reduction()
        );

        Ok(ProcessedImage { report, staged })
    }

    /// Decode a validated source image
    fn load_image(&self, info: &SourceInfo) -> Result<image::DynamicImage> {
        #[cfg(feature = "mmap")]
        if info.file_size >= MMAP_THRESHOLD {
            return load_image_mmap(&info.path);
        }

        let data = std::fs::read(&info.path).with_file_context(info.path.clone())?;
        image::load_from_memory_with_format(&data, image::ImageFormat::Jpeg)
            .with_file_context(info.path.clone())
    }
}

/// Decode using a memory map instead of reading the file into memory
#[cfg(feature = "mmap")]
fn load_image_mmap(path: &Path) -> Result<image::DynamicImage> {
    use memmap2::MmapOptions;

    debug!("Using memory mapping for large file: {:?}", path);

    let file = File::open(path).with_file_context(path.to_path_buf())?;

    // SAFETY: the map is read-only and dropped before this function returns.
    let mmap = unsafe { MmapOptions::new().map(&file) }.with_file_context(path.to_path_buf())?;

    image::load_from_memory_with_format(&mmap, image::ImageFormat::Jpeg)
        .with_file_context(path.to_path_buf())
}

fn copy_file_into(source: &Path, writer: &mut dyn Write) -> Result<()> {
    let mut file = File::open(source)?;
    std::io::copy(&mut file, writer)?;
    Ok(())
}
