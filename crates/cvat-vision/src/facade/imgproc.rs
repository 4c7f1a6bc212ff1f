use super::{luma, ImageData};
use crate::error::{Result, VisionError};
use crate::native::{MatData, NativeHandle};
use lru::LruCache;
use std::num::NonZeroUsize;

/// Frames kept by [`HistogramEqualization`] before the least recently used is evicted.
const MAX_CACHED_FRAMES: NonZeroUsize = match NonZeroUsize::new(32) {
    Some(n) => n,
    None => panic!("cache capacity must be non-zero"),
};

/// Image-processing helpers.
#[derive(Debug, Clone)]
pub struct ImgProc {
    cv: NativeHandle,
}

impl ImgProc {
    pub(crate) fn new(cv: NativeHandle) -> Self {
        Self { cv }
    }

    /// A fresh equalizer with an empty frame cache.
    pub fn hist(&self) -> HistogramEqualization {
        HistogramEqualization::new(self.cv.clone())
    }
}

/// Luma histogram equalization of RGBA frames.
///
/// Chroma and alpha are preserved; only brightness is redistributed.
/// Results are cached per frame number.
#[derive(Debug)]
pub struct HistogramEqualization {
    cv: NativeHandle,
    cache: LruCache<u64, Vec<u8>>,
}

impl HistogramEqualization {
    fn new(cv: NativeHandle) -> Self {
        Self {
            cv,
            cache: LruCache::new(MAX_CACHED_FRAMES),
        }
    }

    /// Equalize `image`, the pixels of frame number `frame`.
    pub fn equalize(&mut self, frame: u64, image: &ImageData<'_>) -> Result<Vec<u8>> {
        if let Some(cached) = self.cache.get(&frame) {
            if cached.len() == image.rgba().len() {
                return Ok(cached.clone());
            }
        }

        let out = self.process(image)?;
        self.cache.put(frame, out.clone());
        Ok(out)
    }

    pub fn is_cached(&self, frame: u64) -> bool {
        self.cache.contains(&frame)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    fn process(&self, image: &ImageData<'_>) -> Result<Vec<u8>> {
        let src = self.cv.mat_from_array(
            image.height(),
            image.width(),
            1,
            MatData::U8(image.luma()),
        )?;
        let mut dst = self.cv.mat_empty();
        self.cv.equalize_hist(&src, &mut dst)?;
        let equalized = dst.data_u8().ok_or_else(|| {
            VisionError::InvalidBuffer(format!("equalized buffer is not 8-bit: {dst:?}"))
        })?;

        let mut out = Vec::with_capacity(image.rgba().len());
        for (px, &y) in image.rgba().chunks_exact(4).zip(equalized) {
            let (r, b) = (f32::from(px[0]), f32::from(px[2]));
            let old_y = luma(px[0], px[1], px[2]);
            // YCrCb chroma of the source pixel, recombined with the new luma.
            let cr = (r - old_y) * 0.713;
            let cb = (b - old_y) * 0.564;
            let y = f32::from(y);
            let channel = |v: f32| v.round().clamp(0.0, 255.0) as u8;
            out.push(channel(y + 1.403 * cr));
            out.push(channel(y - 0.714 * cr - 0.344 * cb));
            out.push(channel(y + 1.773 * cb));
            out.push(px[3]);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ImageprocLibrary;
    use std::sync::Arc;

    fn gray_frame(values: &[u8]) -> Vec<u8> {
        values.iter().flat_map(|&v| [v, v, v, 200]).collect()
    }

    #[test]
    fn test_equalize_stretches_gray_frame() {
        let mut hist = ImgProc::new(Arc::new(ImageprocLibrary::new())).hist();
        let values: Vec<u8> = (0..16).map(|i| 120 + (i % 4) as u8).collect();
        let rgba = gray_frame(&values);
        let image = ImageData::new(4, 4, &rgba).unwrap();

        let out = hist.equalize(0, &image).unwrap();
        assert_eq!(out.len(), rgba.len());
        let reds: Vec<u8> = out.chunks(4).map(|px| px[0]).collect();
        assert_eq!(*reds.iter().max().unwrap(), 255);
        assert!(*reds.iter().min().unwrap() < 120);
        // Gray stays gray and alpha is untouched.
        assert!(out.chunks(4).all(|px| px[0] == px[1] && px[1] == px[2] && px[3] == 200));
    }

    #[test]
    fn test_equalize_caches_per_frame() {
        let cv: NativeHandle = Arc::new(ImageprocLibrary::new());
        let mut hist = ImgProc::new(cv.clone()).hist();
        let rgba = gray_frame(&[10, 20, 30, 40]);
        let image = ImageData::new(2, 2, &rgba).unwrap();

        let first = hist.equalize(7, &image).unwrap();
        assert!(hist.is_cached(7));
        assert_eq!(hist.equalize(7, &image).unwrap(), first);
        assert_eq!(cv.live_buffers(), 0);

        hist.clear_cache();
        assert!(!hist.is_cached(7));
    }

    #[test]
    fn test_cache_evicts_least_recently_used() {
        let mut hist = ImgProc::new(Arc::new(ImageprocLibrary::new())).hist();
        let rgba = gray_frame(&[1, 2, 3, 4]);
        let image = ImageData::new(2, 2, &rgba).unwrap();
        let capacity = MAX_CACHED_FRAMES.get() as u64;
        for frame in 0..capacity {
            hist.equalize(frame, &image).unwrap();
        }
        // Touching frame 0 makes frame 1 the eviction candidate.
        hist.equalize(0, &image).unwrap();
        hist.equalize(capacity, &image).unwrap();

        assert!(hist.is_cached(0));
        assert!(!hist.is_cached(1));
        assert!(hist.is_cached(capacity));
    }

    #[test]
    fn test_each_hist_is_fresh() {
        let imgproc = ImgProc::new(Arc::new(ImageprocLibrary::new()));
        let mut a = imgproc.hist();
        let rgba = gray_frame(&[1, 2, 3, 4]);
        a.equalize(1, &ImageData::new(2, 2, &rgba).unwrap()).unwrap();
        assert!(!imgproc.hist().is_cached(1));
    }
}
