//! Orientation and target-size arithmetic

use serde::Serialize;
use crate::error::{Result, ResizeError};

/// Image orientation, decides which side is the primary dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
    Square,
}

impl Orientation {
    pub fn of(width: u32, height: u32) -> Self {
        use std::cmp::Ordering;

        match width.cmp(&height) {
            Ordering::Greater => Self::Landscape,
            Ordering::Less => Self::Portrait,
            Ordering::Equal => Self::Square,
        }
    }
}

/// What to do with one source image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizePlan {
    /// Primary dimension already fits; keep the file as is
    Copy,
    /// Rescale to exactly these dimensions
    Scale { width: u32, height: u32 },
}

/// Primary dimension: width for landscape and square images, height for portrait
pub fn primary_dimension(width: u32, height: u32) -> u32 {
    match Orientation::of(width, height) {
        Orientation::Portrait => height,
        Orientation::Landscape | Orientation::Square => width,
    }
}

/// Decide how an image of the given size is brought to `target_width`.
///
/// The target applies to the primary dimension. Images never grow. The
/// secondary side is `round(target * secondary / primary)`, half rounding
/// up, and never drops below one pixel.
pub fn plan_resize(width: u32, height: u32, target_width: u32) -> Result<ResizePlan> {
    if target_width == 0 {
        return Err(ResizeError::invalid_parameters("Target width must be greater than 0"));
    }
    if width == 0 || height == 0 {
        return Err(ResizeError::invalid_parameters(format!(
            "Image has an empty dimension: {}x{}",
            width, height
        )));
    }

    let orientation = Orientation::of(width, height);
    let primary = primary_dimension(width, height);
    let secondary = width.min(height);

    if primary <= target_width {
        return Ok(ResizePlan::Copy);
    }

    let scaled = scale_rounded(target_width, secondary, primary).max(1);

    Ok(match orientation {
        Orientation::Portrait => ResizePlan::Scale {
            width: scaled,
            height: target_width,
        },
        Orientation::Landscape | Orientation::Square => ResizePlan::Scale {
            width: target_width,
            height: scaled,
        },
    })
}

/// `round(target * other / primary)` in integer arithmetic
fn scale_rounded(target: u32, other: u32, primary: u32) -> u32 {
    let numerator = u64::from(target) * u64::from(other);
    let primary = u64::from(primary);
    // other <= primary here, so the quotient never exceeds target
    ((2 * numerator + primary) / (2 * primary)) as u32
}
