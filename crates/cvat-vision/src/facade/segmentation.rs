use super::ImageData;
use crate::error::{Result, VisionError};
use crate::native::{MatData, NativeHandle};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::Arc;

/// Callback told when the tool blocks or unblocks canvas interaction.
pub type BlockerCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Interactive segmentation tools.
#[derive(Debug, Clone)]
pub struct Segmentation {
    cv: NativeHandle,
}

impl Segmentation {
    pub(crate) fn new(cv: NativeHandle) -> Self {
        Self { cv }
    }

    /// A fresh intelligent-scissors tool.
    pub fn intelligent_scissors_factory<F>(&self, on_blocker_change: F) -> IntelligentScissors
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        IntelligentScissors::new(self.cv.clone(), Arc::new(on_blocker_change))
    }
}

/// How the canvas should drive the tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScissorsParams {
    pub shape_type: &'static str,
    pub min_pos_vertices: usize,
    pub enable_threshold: bool,
    pub enable_sliding: bool,
    pub allow_remove_only_last: bool,
}

impl Default for ScissorsParams {
    fn default() -> Self {
        Self {
            shape_type: "polygon",
            min_pos_vertices: 1,
            enable_threshold: true,
            enable_sliding: true,
            allow_remove_only_last: true,
        }
    }
}

type Pixel = (usize, usize);

/// Live-wire boundary tracing.
///
/// Each pair of consecutive anchors is joined by the cheapest 8-connected
/// path over a cost map that is low on strong edges. Paths between anchors
/// that did not change since the previous run are reused.
pub struct IntelligentScissors {
    cv: NativeHandle,
    on_blocker_change: BlockerCallback,
    params: ScissorsParams,
    blocked: bool,
    frame: Option<(usize, usize)>,
    anchors: Vec<Pixel>,
    segments: Vec<Vec<Pixel>>,
}

impl IntelligentScissors {
    pub const KIND: &'static str = "opencv_intelligent_scissors";

    fn new(cv: NativeHandle, on_blocker_change: BlockerCallback) -> Self {
        Self {
            cv,
            on_blocker_change,
            params: ScissorsParams::default(),
            blocked: false,
            frame: None,
            anchors: Vec::new(),
            segments: Vec::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        Self::KIND
    }

    pub fn params(&self) -> &ScissorsParams {
        &self.params
    }

    /// Forget all anchors and traced paths.
    pub fn reset(&mut self) {
        self.frame = None;
        self.anchors.clear();
        self.segments.clear();
    }

    /// Toggle (or set) blocking mode and notify the canvas.
    pub fn switch_block_mode(&mut self, mode: Option<bool>) {
        self.blocked = mode.unwrap_or(!self.blocked);
        (self.on_blocker_change)(if self.blocked { "keydown" } else { "keyup" });
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Trace a boundary through `anchors` (flat canvas coordinates) on
    /// `image`, whose top-left corner sits at `offset` on the canvas.
    /// Returns the traced path as flat canvas coordinates.
    pub fn run(
        &mut self,
        anchors: &[f64],
        image: &ImageData<'_>,
        offset: (f64, f64),
    ) -> Result<Vec<f64>> {
        if anchors.len() % 2 != 0 {
            return Err(VisionError::InvalidInput(format!(
                "flat anchor list has odd length {}",
                anchors.len()
            )));
        }
        if image.width() == 0 || image.height() == 0 {
            return Err(VisionError::InvalidInput("empty image".into()));
        }

        let to_pixel = |v: f64, max: usize| (v.round().max(0.0) as usize).min(max - 1);
        let pixels: Vec<Pixel> = anchors
            .chunks_exact(2)
            .map(|xy| {
                (
                    to_pixel(xy[0] - offset.0, image.width()),
                    to_pixel(xy[1] - offset.1, image.height()),
                )
            })
            .collect();

        let frame = (image.width(), image.height());
        let reusable = if self.frame == Some(frame) {
            self.anchors
                .iter()
                .zip(&pixels)
                .take_while(|(a, b)| a == b)
                .count()
        } else {
            0
        };
        self.segments.truncate(reusable.saturating_sub(1));
        self.frame = Some(frame);
        self.anchors = pixels;

        if self.anchors.len() > self.segments.len() + 1 {
            let costs = self.cost_map(image)?;
            for pair in self.anchors[self.segments.len()..].windows(2) {
                let path = shortest_path(&costs, image.width(), pair[0], pair[1]);
                self.segments.push(path);
            }
        }

        let mut path: Vec<Pixel> = self.anchors.first().copied().into_iter().collect();
        for segment in &self.segments {
            path.extend(segment.iter().skip(1));
        }
        Ok(path
            .into_iter()
            .flat_map(|(x, y)| [x as f64 + offset.0, y as f64 + offset.1])
            .collect())
    }

    /// Per-pixel traversal cost in `(0, 1]`, lowest on the strongest edges.
    fn cost_map(&self, image: &ImageData<'_>) -> Result<Vec<f32>> {
        let src = self.cv.mat_from_array(
            image.height(),
            image.width(),
            1,
            MatData::U8(image.luma()),
        )?;
        let mut magnitude = self.cv.mat_empty();
        self.cv.sobel_magnitude(&src, &mut magnitude)?;
        let values = magnitude.data32_f().ok_or_else(|| {
            VisionError::InvalidBuffer(format!("gradient is not 32F: {magnitude:?}"))
        })?;
        let max = values.iter().copied().fold(0.0f32, f32::max);
        if max <= 0.0 {
            return Ok(vec![1.0; values.len()]);
        }
        Ok(values.iter().map(|&m| 1.0 - 0.99 * (m / max)).collect())
    }
}

impl fmt::Debug for IntelligentScissors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntelligentScissors")
            .field("params", &self.params)
            .field("blocked", &self.blocked)
            .field("anchors", &self.anchors.len())
            .finish()
    }
}

#[derive(Debug, PartialEq)]
struct Visit {
    cost: f32,
    index: usize,
}

impl Eq for Visit {}

impl Ord for Visit {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for Visit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dijkstra from `from` to `to`; both endpoints are included.
fn shortest_path(costs: &[f32], width: usize, from: Pixel, to: Pixel) -> Vec<Pixel> {
    let height = costs.len() / width;
    let start = from.1 * width + from.0;
    let goal = to.1 * width + to.0;

    let mut dist = vec![f32::INFINITY; costs.len()];
    let mut prev = vec![usize::MAX; costs.len()];
    let mut heap = BinaryHeap::new();
    dist[start] = 0.0;
    heap.push(Visit {
        cost: 0.0,
        index: start,
    });

    while let Some(Visit { cost, index }) = heap.pop() {
        if index == goal {
            break;
        }
        if cost > dist[index] {
            continue;
        }
        let (x, y) = (index % width, index / width);
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let (nx, ny) = (x as i64 + dx, y as i64 + dy);
                if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                    continue;
                }
                let next = ny as usize * width + nx as usize;
                let step = if dx != 0 && dy != 0 {
                    std::f32::consts::SQRT_2
                } else {
                    1.0
                };
                let candidate = cost + costs[next] * step;
                if candidate < dist[next] {
                    dist[next] = candidate;
                    prev[next] = index;
                    heap.push(Visit {
                        cost: candidate,
                        index: next,
                    });
                }
            }
        }
    }

    let mut path = vec![to];
    let mut cursor = goal;
    while cursor != start {
        cursor = prev[cursor];
        if cursor == usize::MAX {
            break;
        }
        path.push((cursor % width, cursor / width));
    }
    path.reverse();
    path
}
