//! `cvat-vision contours <image>`

use crate::{frames, output};
use anyhow::{Context, Result};
use cvat_vision::{Loader, MatType};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct ContourReport {
    /// Longest external contour, flat `[x0, y0, x1, y1, ...]`.
    pub contour: Vec<i32>,
    /// The contour simplified at the requested threshold.
    pub polygon: Vec<[f64; 2]>,
}

pub fn extract(loader: &Loader, image: &Path, threshold: f64, binarize: u8) -> Result<ContourReport> {
    let mask = frames::load_mask(image, binarize)?;
    let (width, height) = (mask.width() as usize, mask.height() as usize);
    let src = loader
        .mat()?
        .from_data(width, height, MatType::Cv8UC1, mask.into_raw())?;
    let mut contours = loader.mat_vector()?.empty();

    let found = loader.contours()?.find_contours(&src, &mut contours)?;
    let Some(contour) = found.into_iter().next() else {
        return Ok(ContourReport {
            contour: Vec::new(),
            polygon: Vec::new(),
        });
    };
    let polygon = loader
        .contours()?
        .approx_poly(contour.as_slice(), threshold, true)
        .context("polygon approximation failed")?;
    Ok(ContourReport { contour, polygon })
}

pub fn run(loader: &Loader, image: &Path, threshold: f64, binarize: u8) -> Result<()> {
    let report = extract(loader, image, threshold, binarize)?;
    output::print_json(&report)
}
