//! `cvat-vision track <frames...> --bbox x,y,w,h`

use crate::{frames, output};
use anyhow::{Context, Result};
use cvat_vision::{ImageData, Loader};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
struct TrackLine<'a> {
    frame: usize,
    path: &'a str,
    found: bool,
    /// `[x, y, width, height]`
    bbox: [f64; 4],
}

/// Parse `x,y,w,h` into an `[x1, y1, x2, y2]` box.
pub fn parse_bbox(s: &str) -> std::result::Result<[f64; 4], String> {
    let values: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("{v:?}: {e}")))
        .collect::<std::result::Result<_, _>>()?;
    match values.as_slice() {
        &[x, y, w, h] if w > 0.0 && h > 0.0 => Ok([x, y, x + w, y + h]),
        &[_, _, _, _] => Err("width and height must be positive".to_string()),
        _ => Err(format!("expected x,y,width,height, got {s:?}")),
    }
}

fn to_xywh(b: [f64; 4]) -> [f64; 4] {
    [b[0], b[1], b[2] - b[0], b[3] - b[1]]
}

pub fn run(loader: &Loader, paths: &[PathBuf], bbox: [f64; 4]) -> Result<()> {
    let mut tracker = loader.tracking()?.tracker_mil.model();

    for (index, path) in paths.iter().enumerate() {
        let frame = frames::load_rgba(path)?;
        let (width, height) = frame.dimensions();
        let image = ImageData::new(width as usize, height as usize, frame.as_raw())?;

        let (found, current) = if index == 0 {
            tracker
                .init(&image, bbox)
                .with_context(|| format!("cannot start tracking on {}", path.display()))?;
            (true, bbox)
        } else {
            tracker.update(&image)?
        };

        let shown = path.display().to_string();
        output::print_json_line(&TrackLine {
            frame: index,
            path: &shown,
            found,
            bbox: to_xywh(current),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        assert_eq!(parse_bbox("1,2,3,4"), Ok([1.0, 2.0, 4.0, 6.0]));
        assert_eq!(parse_bbox(" 0.5, 1 ,2,2"), Ok([0.5, 1.0, 2.5, 3.0]));
        assert!(parse_bbox("1,2,3").is_err());
        assert!(parse_bbox("1,2,0,4").is_err());
        assert!(parse_bbox("a,2,3,4").is_err());
    }

    #[test]
    fn test_to_xywh() {
        assert_eq!(to_xywh([10.0, 20.0, 15.0, 26.0]), [10.0, 20.0, 5.0, 6.0]);
    }
}
