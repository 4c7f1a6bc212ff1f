//! `cvat-vision equalize <input> <output>`

use crate::frames;
use anyhow::Result;
use cvat_vision::{ImageData, Loader};
use std::path::Path;
use tracing::info;

pub fn run(loader: &Loader, input: &Path, output: &Path) -> Result<()> {
    let frame = frames::load_rgba(input)?;
    let (width, height) = frame.dimensions();
    let image = ImageData::new(width as usize, height as usize, frame.as_raw())?;

    let equalized = loader.imgproc()?.hist().equalize(0, &image)?;
    frames::save_rgba(output, width, height, equalized)?;
    info!(input = %input.display(), output = %output.display(), "equalized");
    Ok(())
}
