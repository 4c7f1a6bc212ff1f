use async_trait::async_trait;
use cvat_vision::{
    ImageData, ImageprocLibrary, Loader, LoaderConfig, MatType, NativeHandle, NativeLibrary,
    PageEnvironment, Result, ScriptTag,
};
use std::sync::Arc;
use url::Url;

/// Page where the library is already present.
struct LoadedPage {
    cv: Arc<ImageprocLibrary>,
}

#[async_trait]
impl PageEnvironment for LoadedPage {
    async fn append_script(&self, src: &Url) -> Result<ScriptTag> {
        Ok(ScriptTag::new(src.clone()))
    }

    async fn global(&self, _name: &str) -> Option<NativeHandle> {
        let cv: NativeHandle = self.cv.clone();
        Some(cv)
    }
}

async fn loaded() -> (Loader, Arc<ImageprocLibrary>) {
    let cv = Arc::new(ImageprocLibrary::new());
    let page = Arc::new(LoadedPage { cv: cv.clone() });
    let loader = Loader::new(LoaderConfig::default(), page).unwrap();
    loader.initialize().await.unwrap();
    (loader, cv)
}

/// Binary 8UC1 image with the given filled rectangles `(x, y, w, h)`.
fn mask(width: usize, height: usize, rects: &[(usize, usize, usize, usize)]) -> Vec<u8> {
    let mut data = vec![0u8; width * height];
    for &(x, y, w, h) in rects {
        for row in y..y + h {
            data[row * width + x..row * width + x + w].fill(255);
        }
    }
    data
}

#[tokio::test(start_paused = true)]
async fn find_contours_keeps_longest_shape() {
    let (loader, cv) = loaded().await;
    let mat = loader.mat().unwrap();
    let src = mat
        .from_data(32, 32, MatType::Cv8UC1, mask(32, 32, &[(2, 2, 4, 4), (12, 10, 15, 12)]))
        .unwrap();
    let mut contours = loader.mat_vector().unwrap().empty();

    let result = loader.contours().unwrap().find_contours(&src, &mut contours).unwrap();
    assert_eq!(contours.size(), 2);
    assert_eq!(result.len(), 1);
    let xs: Vec<i32> = result[0].chunks(2).map(|p| p[0]).collect();
    assert_eq!(xs.iter().min(), Some(&12));
    assert_eq!(xs.iter().max(), Some(&26));

    drop(contours);
    drop(src);
    assert_eq!(cv.live_buffers(), 0);
}

#[tokio::test(start_paused = true)]
async fn find_contours_of_blank_image_is_empty() {
    let (loader, cv) = loaded().await;
    let src = loader
        .mat()
        .unwrap()
        .from_data(8, 8, MatType::Cv8UC1, vec![0; 64])
        .unwrap();
    let mut contours = loader.mat_vector().unwrap().empty();
    assert!(loader
        .contours()
        .unwrap()
        .find_contours(&src, &mut contours)
        .unwrap()
        .is_empty());
    drop(src);
    assert_eq!(cv.live_buffers(), 0);
}

#[tokio::test(start_paused = true)]
async fn buffers_released_on_failure() {
    let (loader, cv) = loaded().await;
    let contours = loader.contours().unwrap();

    let err = contours.approx_poly(vec![0.0, 0.0, 1.0, 1.0, 2.0, 0.0], -1.0, true);
    assert!(err.is_err());
    let err = contours.approx_poly(vec![0.0, 0.0, 1.0], 1.0, true);
    assert!(err.is_err());

    // Color input is rejected by contour extraction.
    let color = loader
        .mat()
        .unwrap()
        .from_data(4, 4, MatType::Cv8UC3, vec![0; 48])
        .unwrap();
    let mut out = loader.mat_vector().unwrap().empty();
    assert!(contours.find_contours(&color, &mut out).is_err());
    drop(color);
    drop(out);
    assert_eq!(cv.live_buffers(), 0);
}

#[tokio::test(start_paused = true)]
async fn approx_poly_accepts_both_layouts() {
    let (loader, cv) = loaded().await;
    let contours = loader.contours().unwrap();
    let square = [[0.0, 0.0], [5.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]];

    let nested = contours.approx_poly(square.to_vec(), 1.0, true).unwrap();
    let flat: Vec<f64> = square.iter().flatten().copied().collect();
    assert_eq!(contours.approx_poly(flat, 1.0, true).unwrap(), nested);
    assert!(!nested.contains(&[5.0, 0.0]));
    assert_eq!(cv.live_buffers(), 0);
}

#[tokio::test(start_paused = true)]
async fn equalize_through_loader() {
    let (loader, cv) = loaded().await;
    let rgba: Vec<u8> = (0..16u8).flat_map(|i| [100 + i, 100 + i, 100 + i, 255]).collect();
    let image = ImageData::new(4, 4, &rgba).unwrap();

    let mut hist = loader.imgproc().unwrap().hist();
    let out = hist.equalize(3, &image).unwrap();
    assert_eq!(out.len(), rgba.len());
    assert_eq!(out.chunks(4).map(|px| px[0]).max(), Some(255));
    assert_eq!(cv.live_buffers(), 0);
}
