//! Image files in and out.

use anyhow::{Context, Result};
use image::{GrayImage, RgbaImage};
use std::path::Path;

/// Decode an image file as 8-bit RGBA.
pub fn load_rgba(path: &Path) -> Result<RgbaImage> {
    let image = image::open(path).with_context(|| format!("cannot read {}", path.display()))?;
    Ok(image.to_rgba8())
}

/// Decode an image file as a binary mask: pixels whose gray level is at
/// least `level` become 255, the rest 0.
pub fn load_mask(path: &Path, level: u8) -> Result<GrayImage> {
    let image = image::open(path).with_context(|| format!("cannot read {}", path.display()))?;
    let mut gray = image.to_luma8();
    for pixel in gray.pixels_mut() {
        pixel.0[0] = if pixel.0[0] >= level { 255 } else { 0 };
    }
    Ok(gray)
}

pub fn save_rgba(path: &Path, width: u32, height: u32, rgba: Vec<u8>) -> Result<()> {
    let image = RgbaImage::from_raw(width, height, rgba)
        .with_context(|| format!("pixel buffer does not fit {width}x{height}"))?;
    image
        .save(path)
        .with_context(|| format!("cannot write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_load_mask_thresholds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.png");
        GrayImage::from_fn(4, 1, |x, _| Luma([x as u8 * 60]))
            .save(&path)
            .unwrap();

        let mask = load_mask(&path, 120).unwrap();
        let values: Vec<u8> = mask.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, vec![0, 0, 255, 255]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_rgba(Path::new("/nonexistent/frame.png")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/frame.png"));
    }
}
