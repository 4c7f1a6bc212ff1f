//! Opaque capability over the loaded vision library.
//!
//! Application code never sees the library itself, only a [`NativeHandle`]
//! exposing the handful of operations the façades need. Every buffer the
//! library allocates holds a [`BufferLease`] on the library's heap counter,
//! so dropping a [`Mat`] is what releases it.

use crate::error::{Result, VisionError};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared reference to the loaded library.
pub type NativeHandle = Arc<dyn NativeLibrary>;

/// Counter of live native buffers.
#[derive(Debug, Clone, Default)]
pub struct NativeHeap {
    live: Arc<AtomicUsize>,
}

impl NativeHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one more live buffer.
    pub fn lease(&self) -> BufferLease {
        self.live.fetch_add(1, Ordering::SeqCst);
        BufferLease {
            live: Arc::clone(&self.live),
        }
    }

    /// Number of buffers allocated and not yet dropped.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

/// Keeps one buffer accounted on its heap until dropped.
#[derive(Debug)]
pub struct BufferLease {
    live: Arc<AtomicUsize>,
}

impl Drop for BufferLease {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Element storage of a [`Mat`].
#[derive(Debug, Clone, PartialEq)]
pub enum MatData {
    U8(Vec<u8>),
    S32(Vec<i32>),
    F32(Vec<f32>),
}

impl MatData {
    pub fn len(&self) -> usize {
        match self {
            MatData::U8(v) => v.len(),
            MatData::S32(v) => v.len(),
            MatData::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn depth_name(&self) -> &'static str {
        match self {
            MatData::U8(_) => "8U",
            MatData::S32(_) => "32S",
            MatData::F32(_) => "32F",
        }
    }
}

/// A native, row-major, interleaved-channel buffer.
pub struct Mat {
    rows: usize,
    cols: usize,
    channels: usize,
    data: MatData,
    _lease: BufferLease,
}

impl Mat {
    /// Wrap `data` as a `rows x cols` buffer with `channels` interleaved channels.
    pub fn new(
        rows: usize,
        cols: usize,
        channels: usize,
        data: MatData,
        lease: BufferLease,
    ) -> Result<Self> {
        if channels == 0 {
            return Err(VisionError::InvalidBuffer("zero channels".into()));
        }
        let expected = element_count(rows, cols, channels)?;
        if data.len() != expected {
            return Err(VisionError::InvalidBuffer(format!(
                "{rows}x{cols}x{channels} buffer needs {expected} elements, got {}",
                data.len()
            )));
        }
        Ok(Self {
            rows,
            cols,
            channels,
            data,
            _lease: lease,
        })
    }

    /// A `0 x 0` single-channel 8-bit buffer.
    pub fn empty(lease: BufferLease) -> Self {
        Self {
            rows: 0,
            cols: 0,
            channels: 1,
            data: MatData::U8(Vec::new()),
            _lease: lease,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &MatData {
        &self.data
    }

    /// Byte view, if the buffer is 8-bit.
    pub fn data_u8(&self) -> Option<&[u8]> {
        match &self.data {
            MatData::U8(v) => Some(v),
            _ => None,
        }
    }

    /// Signed 32-bit view, if the buffer is 32S.
    pub fn data32_s(&self) -> Option<&[i32]> {
        match &self.data {
            MatData::S32(v) => Some(v),
            _ => None,
        }
    }

    /// Float view, if the buffer is 32F.
    pub fn data32_f(&self) -> Option<&[f32]> {
        match &self.data {
            MatData::F32(v) => Some(v),
            _ => None,
        }
    }

    /// Element at `(row, col)` of a single-channel float buffer.
    pub fn float_at(&self, row: usize, col: usize) -> Option<f32> {
        let idx = row
            .checked_mul(self.cols)?
            .checked_add(col)?
            .checked_mul(self.channels)?;
        self.data32_f().and_then(|v| v.get(idx).copied())
    }

    /// Replace the contents, keeping the lease.
    pub fn assign(
        &mut self,
        rows: usize,
        cols: usize,
        channels: usize,
        data: MatData,
    ) -> Result<()> {
        if data.len() != element_count(rows, cols, channels)? {
            return Err(VisionError::InvalidBuffer(format!(
                "{rows}x{cols}x{channels} assignment got {} elements",
                data.len()
            )));
        }
        self.rows = rows;
        self.cols = cols;
        self.channels = channels;
        self.data = data;
        Ok(())
    }
}

/// `rows * cols * channels`, or an error when it does not fit in memory.
fn element_count(rows: usize, cols: usize, channels: usize) -> Result<usize> {
    rows.checked_mul(cols)
        .and_then(|n| n.checked_mul(channels))
        .ok_or_else(|| {
            VisionError::InvalidBuffer(format!("{rows}x{cols}x{channels} buffer is too large"))
        })
}

impl fmt::Debug for Mat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mat")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("channels", &self.channels)
            .field("depth", &self.data.depth_name())
            .finish()
    }
}

/// Growable list of native buffers.
#[derive(Debug, Default)]
pub struct MatVector {
    items: Vec<Mat>,
}

impl MatVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, i: usize) -> Option<&Mat> {
        self.items.get(i)
    }

    pub fn push(&mut self, mat: Mat) {
        self.items.push(mat);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mat> {
        self.items.iter()
    }
}

/// Which contours `find_contours` reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    /// Only outermost borders.
    External,
    /// Every border, without hierarchy.
    List,
}

/// The operations the façades borrow from the loaded library.
///
/// `find_contours` stores each contour as an `n x 1` two-channel 32S buffer
/// holding every border point, and fills `hierarchy` with one
/// `[next, previous, first_child, parent]` row per contour.
pub trait NativeLibrary: Send + Sync + fmt::Debug {
    /// Library identifier, e.g. `"imageproc"`.
    fn name(&self) -> &str;

    fn mat_empty(&self) -> Mat;

    /// Build a buffer from raw elements.
    fn mat_from_array(
        &self,
        rows: usize,
        cols: usize,
        channels: usize,
        data: MatData,
    ) -> Result<Mat>;

    fn mat_vector(&self) -> MatVector {
        MatVector::new()
    }

    fn find_contours(
        &self,
        src: &Mat,
        contours: &mut MatVector,
        hierarchy: &mut Mat,
        mode: RetrievalMode,
    ) -> Result<()>;

    /// Douglas-Peucker simplification of an `n x 2` 32F curve into `approx`.
    fn approx_poly_dp(&self, curve: &Mat, approx: &mut Mat, epsilon: f64, closed: bool)
        -> Result<()>;

    /// Histogram equalization of a single-channel 8-bit buffer.
    fn equalize_hist(&self, src: &Mat, dst: &mut Mat) -> Result<()>;

    /// Sobel gradient magnitude of a single-channel 8-bit buffer, as 32F.
    fn sobel_magnitude(&self, src: &Mat, dst: &mut Mat) -> Result<()>;

    /// Normalized squared difference of `templ` slid over `image` (both 8UC1).
    /// `result` is `(h - th + 1) x (w - tw + 1)` 32F; lower is better.
    fn match_template(&self, image: &Mat, templ: &Mat, result: &mut Mat) -> Result<()>;

    /// Native buffers currently allocated by this library.
    fn live_buffers(&self) -> usize;
}
