use crate::error::Result;
use crate::native::{Mat, MatData, MatVector, NativeHandle};

/// Pixel formats accepted by [`MatSpace::from_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatType {
    /// 1-channel 8-bit.
    Cv8UC1,
    /// 3-channel 8-bit.
    Cv8UC3,
    /// 4-channel 8-bit.
    Cv8UC4,
}

impl MatType {
    pub fn channels(self) -> usize {
        match self {
            MatType::Cv8UC1 => 1,
            MatType::Cv8UC3 => 3,
            MatType::Cv8UC4 => 4,
        }
    }
}

/// Image buffer construction.
#[derive(Debug, Clone)]
pub struct MatSpace {
    cv: NativeHandle,
}

impl MatSpace {
    pub(crate) fn new(cv: NativeHandle) -> Self {
        Self { cv }
    }

    pub fn empty(&self) -> Mat {
        self.cv.mat_empty()
    }

    /// Wrap raw pixels of a `width x height` image in the given format.
    pub fn from_data(&self, width: usize, height: usize, ty: MatType, data: Vec<u8>) -> Result<Mat> {
        self.cv
            .mat_from_array(height, width, ty.channels(), MatData::U8(data))
    }
}

/// Buffer-list construction.
#[derive(Debug, Clone)]
pub struct MatVectorSpace {
    cv: NativeHandle,
}

impl MatVectorSpace {
    pub(crate) fn new(cv: NativeHandle) -> Self {
        Self { cv }
    }

    pub fn empty(&self) -> MatVector {
        self.cv.mat_vector()
    }
}
