use crate::error::{Result, VisionError};
use crate::native::{Mat, MatData, MatVector, NativeHandle, RetrievalMode};

/// Polygon coordinates, either `[x0, y0, x1, y1, ...]` or `[[x0, y0], ...]`.
#[derive(Debug, Clone, PartialEq)]
pub enum Points {
    Flat(Vec<f64>),
    Nested(Vec<[f64; 2]>),
}

impl Points {
    /// Number of coordinate pairs.
    pub fn len(&self) -> usize {
        match self {
            Points::Flat(v) => v.len() / 2,
            Points::Nested(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalize to coordinate pairs.
    pub fn into_nested(self) -> Result<Vec<[f64; 2]>> {
        match self {
            Points::Nested(v) => Ok(v),
            Points::Flat(v) if v.len() % 2 == 0 => {
                Ok(v.chunks_exact(2).map(|xy| [xy[0], xy[1]]).collect())
            }
            Points::Flat(v) => Err(VisionError::InvalidInput(format!(
                "flat coordinate list has odd length {}",
                v.len()
            ))),
        }
    }
}

impl From<Vec<f64>> for Points {
    fn from(v: Vec<f64>) -> Self {
        Points::Flat(v)
    }
}

impl From<Vec<[f64; 2]>> for Points {
    fn from(v: Vec<[f64; 2]>) -> Self {
        Points::Nested(v)
    }
}

impl From<&[i32]> for Points {
    fn from(v: &[i32]) -> Self {
        Points::Flat(v.iter().map(|&c| f64::from(c)).collect())
    }
}

/// Contour extraction and polygon approximation.
#[derive(Debug, Clone)]
pub struct Contours {
    cv: NativeHandle,
}

impl Contours {
    pub(crate) fn new(cv: NativeHandle) -> Self {
        Self { cv }
    }

    /// Find the external contours of `src` and return the longest one as
    /// flat `[x0, y0, x1, y1, ...]` coordinates.
    ///
    /// The result holds at most one contour; on equal lengths the first one
    /// found wins. `contours` receives every external contour.
    pub fn find_contours(&self, src: &Mat, contours: &mut MatVector) -> Result<Vec<Vec<i32>>> {
        let mut hierarchy = self.cv.mat_empty();
        self.cv
            .find_contours(src, contours, &mut hierarchy, RetrievalMode::External)?;

        let mut longest: Option<&[i32]> = None;
        for contour in contours.iter() {
            let points = contour.data32_s().ok_or_else(|| {
                VisionError::InvalidBuffer(format!("contour is not 32S: {contour:?}"))
            })?;
            if longest.map_or(true, |best| points.len() > best.len()) {
                longest = Some(points);
            }
        }
        Ok(longest.map(|points| points.to_vec()).into_iter().collect())
    }

    /// Simplify a polygon with Douglas-Peucker at distance `threshold`.
    ///
    /// Fewer than three points cannot be approximated and come back as they
    /// are, whatever the threshold.
    pub fn approx_poly(
        &self,
        points: impl Into<Points>,
        threshold: f64,
        closed: bool,
    ) -> Result<Vec<[f64; 2]>> {
        let points = points.into().into_nested()?;
        if points.len() < 3 {
            return Ok(points);
        }
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(VisionError::InvalidInput(format!(
                "approximation threshold must be a non-negative number, got {threshold}"
            )));
        }

        let flat = points
            .iter()
            .flat_map(|p| [p[0] as f32, p[1] as f32])
            .collect();
        let contour = self.cv.mat_from_array(points.len(), 2, 1, MatData::F32(flat))?;
        let mut approx = self.cv.mat_empty();
        self.cv
            .approx_poly_dp(&contour, &mut approx, threshold, closed)?;

        (0..approx.rows())
            .map(|row| match (approx.float_at(row, 0), approx.float_at(row, 1)) {
                (Some(x), Some(y)) => Ok([f64::from(x), f64::from(y)]),
                _ => Err(VisionError::InvalidBuffer(format!(
                    "approximation row {row} out of range in {approx:?}"
                ))),
            })
            .collect()
    }
}
