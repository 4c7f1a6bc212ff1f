use super::ImageData;
use crate::error::{Result, VisionError};
use crate::native::{Mat, MatData, NativeHandle};
use std::fmt;

/// Match scores above this are treated as "object lost".
const MAX_MATCH_SCORE: f32 = 0.25;

/// Scores below this refresh the stored template.
const TEMPLATE_REFRESH_SCORE: f32 = 0.05;

/// A single-object tracker bound to the loaded library.
///
/// Boxes are `[x1, y1, x2, y2]` in frame pixels.
pub trait SingleObjectTracker: Send + fmt::Debug {
    /// Start tracking the object inside `bbox` on `frame`.
    fn init(&mut self, frame: &ImageData<'_>, bbox: [f64; 4]) -> Result<()>;

    /// Locate the object on the next frame. Returns whether it was found and
    /// its box (the last known box when lost).
    fn update(&mut self, frame: &ImageData<'_>) -> Result<(bool, [f64; 4])>;
}

/// Describes a tracker the UI can offer and builds fresh instances of it.
#[derive(Debug, Clone)]
pub struct TrackerDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: &'static str,
    cv: NativeHandle,
}

impl TrackerDescriptor {
    /// A new, uninitialized tracker.
    pub fn model(&self) -> Box<dyn SingleObjectTracker> {
        Box::new(TemplateTracker::new(self.cv.clone()))
    }
}

/// Object tracking.
#[derive(Debug, Clone)]
pub struct Tracking {
    pub tracker_mil: TrackerDescriptor,
}

impl Tracking {
    pub(crate) fn new(cv: NativeHandle) -> Self {
        Self {
            tracker_mil: TrackerDescriptor {
                name: "TrackerMIL",
                description: "Light client-side model useful to track simple objects",
                kind: "opencv_tracker_mil",
                cv,
            },
        }
    }
}

/// Integer pixel rectangle, half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rect {
    x: usize,
    y: usize,
    w: usize,
    h: usize,
}

impl Rect {
    /// Clamp a `[x1, y1, x2, y2]` box to a `width x height` frame.
    fn from_box(bbox: [f64; 4], width: usize, height: usize) -> Option<Self> {
        let [x1, y1, x2, y2] = bbox;
        if !bbox.iter().all(|v| v.is_finite()) {
            return None;
        }
        let clamp = |v: f64, max: usize| v.round().clamp(0.0, max as f64) as usize;
        let (left, right) = (clamp(x1.min(x2), width), clamp(x1.max(x2), width));
        let (top, bottom) = (clamp(y1.min(y2), height), clamp(y1.max(y2), height));
        (right > left && bottom > top).then_some(Self {
            x: left,
            y: top,
            w: right - left,
            h: bottom - top,
        })
    }

    fn to_box(self) -> [f64; 4] {
        [
            self.x as f64,
            self.y as f64,
            (self.x + self.w) as f64,
            (self.y + self.h) as f64,
        ]
    }

    /// Grow by `margin` on every side, clamped to the frame.
    fn expand(self, margin: usize, width: usize, height: usize) -> Self {
        let x = self.x.saturating_sub(margin);
        let y = self.y.saturating_sub(margin);
        let right = (self.x + self.w + margin).min(width);
        let bottom = (self.y + self.h + margin).min(height);
        Self {
            x,
            y,
            w: right.saturating_sub(x),
            h: bottom.saturating_sub(y),
        }
    }
}

fn crop(luma: &[u8], stride: usize, rect: Rect) -> Vec<u8> {
    (rect.y..rect.y + rect.h)
        .flat_map(|row| &luma[row * stride + rect.x..row * stride + rect.x + rect.w])
        .copied()
        .collect()
}

/// Template-matching tracker: searches a window around the last known box
/// for the best normalized squared-difference match of the object patch.
struct TemplateTracker {
    cv: NativeHandle,
    template: Option<Mat>,
    rect: Option<Rect>,
}

impl TemplateTracker {
    fn new(cv: NativeHandle) -> Self {
        Self {
            cv,
            template: None,
            rect: None,
        }
    }

    fn patch(&self, luma: &[u8], stride: usize, rect: Rect) -> Result<Mat> {
        self.cv
            .mat_from_array(rect.h, rect.w, 1, MatData::U8(crop(luma, stride, rect)))
    }
}

impl fmt::Debug for TemplateTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateTracker")
            .field("rect", &self.rect)
            .finish()
    }
}

impl SingleObjectTracker for TemplateTracker {
    fn init(&mut self, frame: &ImageData<'_>, bbox: [f64; 4]) -> Result<()> {
        let rect = Rect::from_box(bbox, frame.width(), frame.height()).ok_or_else(|| {
            VisionError::InvalidInput(format!("bounding box {bbox:?} is empty inside the frame"))
        })?;
        let luma = frame.luma();
        self.template = Some(self.patch(&luma, frame.width(), rect)?);
        self.rect = Some(rect);
        Ok(())
    }

    fn update(&mut self, frame: &ImageData<'_>) -> Result<(bool, [f64; 4])> {
        let (template, rect) = match (&self.template, self.rect) {
            (Some(template), Some(rect)) => (template, rect),
            _ => {
                return Err(VisionError::InvalidInput(
                    "tracker must be initialized with a bounding box first".into(),
                ))
            }
        };

        let margin = rect.w.max(rect.h);
        let window = rect.expand(margin, frame.width(), frame.height());
        if window.w < rect.w || window.h < rect.h {
            return Ok((false, rect.to_box()));
        }

        let luma = frame.luma();
        let search = self.patch(&luma, frame.width(), window)?;
        let mut scores = self.cv.mat_empty();
        self.cv.match_template(&search, template, &mut scores)?;

        let values = scores.data32_f().ok_or_else(|| {
            VisionError::InvalidBuffer(format!("match scores are not 32F: {scores:?}"))
        })?;
        let best = values
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_finite())
            .min_by(|a, b| a.1.total_cmp(b.1));
        let (index, score) = match best {
            Some((index, &score)) if score <= MAX_MATCH_SCORE => (index, score),
            _ => return Ok((false, rect.to_box())),
        };

        let found = Rect {
            x: window.x + index % scores.cols(),
            y: window.y + index / scores.cols(),
            w: rect.w,
            h: rect.h,
        };
        if score <= TEMPLATE_REFRESH_SCORE {
            self.template = Some(self.patch(&luma, frame.width(), found)?);
        }
        self.rect = Some(found);
        Ok((true, found.to_box()))
    }
}
