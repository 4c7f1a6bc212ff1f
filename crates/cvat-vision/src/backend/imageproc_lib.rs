//! Built-in native library on top of `imageproc`.

use crate::error::{Result, VisionError};
use crate::native::{Mat, MatData, MatVector, NativeHeap, NativeLibrary, RetrievalMode};
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;
use imageproc::template_matching::{match_template, MatchTemplateMethod};
use tracing::debug;

/// Pure-Rust vision library bound as the `cv` global.
#[derive(Debug, Default)]
pub struct ImageprocLibrary {
    heap: NativeHeap,
}

impl ImageprocLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    fn lease_mat(&self, rows: usize, cols: usize, channels: usize, data: MatData) -> Result<Mat> {
        Mat::new(rows, cols, channels, data, self.heap.lease())
    }
}

/// Borrow an 8UC1 buffer as a grayscale image.
fn gray_image(src: &Mat, op: &str) -> Result<GrayImage> {
    let bytes = match (src.channels(), src.data_u8()) {
        (1, Some(bytes)) => bytes,
        _ => {
            return Err(VisionError::InvalidBuffer(format!(
                "{op} expects a single-channel 8-bit buffer, got {src:?}"
            )))
        }
    };
    GrayImage::from_raw(src.cols() as u32, src.rows() as u32, bytes.to_vec()).ok_or_else(|| {
        VisionError::InvalidBuffer(format!("{op}: buffer does not match its dimensions"))
    })
}

impl NativeLibrary for ImageprocLibrary {
    fn name(&self) -> &str {
        "imageproc"
    }

    fn mat_empty(&self) -> Mat {
        Mat::empty(self.heap.lease())
    }

    fn mat_from_array(
        &self,
        rows: usize,
        cols: usize,
        channels: usize,
        data: MatData,
    ) -> Result<Mat> {
        self.lease_mat(rows, cols, channels, data)
    }

    fn find_contours(
        &self,
        src: &Mat,
        contours: &mut MatVector,
        hierarchy: &mut Mat,
        mode: RetrievalMode,
    ) -> Result<()> {
        let image = gray_image(src, "find_contours")?;
        let found = find_contours::<i32>(&image);

        contours.clear();
        for contour in found.iter().filter(|c| match mode {
            RetrievalMode::External => {
                c.parent.is_none() && matches!(c.border_type, BorderType::Outer)
            }
            RetrievalMode::List => true,
        }) {
            let flat: Vec<i32> = contour.points.iter().flat_map(|p| [p.x, p.y]).collect();
            let rows = contour.points.len();
            contours.push(self.lease_mat(rows, 1, 2, MatData::S32(flat))?);
        }

        // Flat topology: siblings only, no children or parents reported.
        let n = contours.size() as i32;
        let links: Vec<i32> = (0..n)
            .flat_map(|i| {
                let next = if i + 1 < n { i + 1 } else { -1 };
                let prev = if i > 0 { i - 1 } else { -1 };
                [next, prev, -1, -1]
            })
            .collect();
        hierarchy.assign(1, n as usize, 4, MatData::S32(links))?;

        debug!(
            found = found.len(),
            kept = contours.size(),
            "find_contours on {}x{}",
            src.cols(),
            src.rows()
        );
        Ok(())
    }

    fn approx_poly_dp(
        &self,
        curve: &Mat,
        approx: &mut Mat,
        epsilon: f64,
        closed: bool,
    ) -> Result<()> {
        let values = curve.data32_f().ok_or_else(|| {
            VisionError::InvalidBuffer(format!("approx_poly_dp expects a 32F curve, got {curve:?}"))
        })?;
        if curve.cols() * curve.channels() != 2 {
            return Err(VisionError::InvalidBuffer(format!(
                "approx_poly_dp expects two coordinates per row, got {curve:?}"
            )));
        }
        let points: Vec<Point<f32>> = values
            .chunks_exact(2)
            .map(|xy| Point::new(xy[0], xy[1]))
            .collect();

        let simplified = if epsilon > 0.0 && points.len() >= 3 {
            approximate_polygon_dp(&points, epsilon, closed)
        } else {
            points
        };

        let rows = simplified.len();
        let flat = simplified.iter().flat_map(|p| [p.x, p.y]).collect();
        approx.assign(rows, 2, 1, MatData::F32(flat))
    }

    fn equalize_hist(&self, src: &Mat, dst: &mut Mat) -> Result<()> {
        let image = gray_image(src, "equalize_hist")?;
        let equalized = imageproc::contrast::equalize_histogram(&image);
        dst.assign(src.rows(), src.cols(), 1, MatData::U8(equalized.into_raw()))
    }

    fn sobel_magnitude(&self, src: &Mat, dst: &mut Mat) -> Result<()> {
        let image = gray_image(src, "sobel_magnitude")?;
        let gradients = imageproc::gradients::sobel_gradients(&image);
        let magnitude = gradients.into_raw().into_iter().map(f32::from).collect();
        dst.assign(src.rows(), src.cols(), 1, MatData::F32(magnitude))
    }

    fn match_template(&self, image: &Mat, templ: &Mat, result: &mut Mat) -> Result<()> {
        let haystack = gray_image(image, "match_template")?;
        let needle = gray_image(templ, "match_template")?;
        if needle.width() == 0
            || needle.height() == 0
            || needle.width() > haystack.width()
            || needle.height() > haystack.height()
        {
            return Err(VisionError::InvalidInput(format!(
                "template {}x{} does not fit in image {}x{}",
                needle.width(),
                needle.height(),
                haystack.width(),
                haystack.height()
            )));
        }
        let scores = match_template(
            &haystack,
            &needle,
            MatchTemplateMethod::SumOfSquaredErrorsNormalized,
        );
        let (w, h) = scores.dimensions();
        result.assign(h as usize, w as usize, 1, MatData::F32(scores.into_raw()))
    }

    fn live_buffers(&self) -> usize {
        self.heap.live()
    }
}
