//! Narrow, purpose-specific views over the loaded library.
//!
//! Each façade is bound to the [`NativeHandle`](crate::NativeHandle) that was
//! current when the loader handed it out.

mod contours;
mod imgproc;
mod mat;
mod segmentation;
mod tracking;

pub use contours::{Contours, Points};
pub use imgproc::{HistogramEqualization, ImgProc};
pub use mat::{MatSpace, MatType, MatVectorSpace};
pub use segmentation::{IntelligentScissors, ScissorsParams, Segmentation};
pub use tracking::{SingleObjectTracker, TrackerDescriptor, Tracking};

use crate::error::{Result, VisionError};

/// Borrowed RGBA frame, as a canvas hands it over.
#[derive(Debug, Clone, Copy)]
pub struct ImageData<'a> {
    width: usize,
    height: usize,
    rgba: &'a [u8],
}

impl<'a> ImageData<'a> {
    pub fn new(width: usize, height: usize, rgba: &'a [u8]) -> Result<Self> {
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| {
                VisionError::InvalidInput(format!("{width}x{height} RGBA frame is too large"))
            })?;
        if rgba.len() != expected {
            return Err(VisionError::InvalidInput(format!(
                "{width}x{height} RGBA frame needs {expected} bytes, got {}",
                rgba.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn rgba(&self) -> &'a [u8] {
        self.rgba
    }

    /// BT.601 luma, one byte per pixel.
    pub(crate) fn luma(&self) -> Vec<u8> {
        self.rgba
            .chunks_exact(4)
            .map(|px| luma(px[0], px[1], px[2]).round().clamp(0.0, 255.0) as u8)
            .collect()
    }
}

pub(crate) fn luma(r: u8, g: u8, b: u8) -> f32 {
    0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b)
}
