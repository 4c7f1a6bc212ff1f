//! cvat-vision: lazily loaded computer-vision library for the annotation client.
//!
//! A [`Loader`] injects the library script into a [`PageEnvironment`], waits
//! for its global to appear, and then hands out narrow façades (buffers,
//! contours, segmentation, image processing, tracking) bound to the loaded
//! [`NativeHandle`].

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod facade;
pub mod loader;
pub mod native;
pub mod page;

pub use backend::ImageprocLibrary;
pub use config::LoaderConfig;
pub use error::{Result, VisionError};
pub use facade::{
    Contours, HistogramEqualization, ImageData, ImgProc, IntelligentScissors, MatSpace, MatType,
    MatVectorSpace, Points, Segmentation, SingleObjectTracker, TrackerDescriptor, Tracking,
};
pub use loader::Loader;
pub use native::{Mat, MatData, MatVector, NativeHandle, NativeHeap, NativeLibrary, RetrievalMode};
pub use page::{HttpPage, PageEnvironment, ScriptRegistry, ScriptTag};
