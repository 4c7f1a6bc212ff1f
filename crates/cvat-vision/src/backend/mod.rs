//! Native library implementations that a page can bind as its global.

mod imageproc_lib;

pub use imageproc_lib::ImageprocLibrary;
