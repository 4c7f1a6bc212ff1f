//! Error type shared by the loader, the native capability and the façades.

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the vision loader and its façades.
///
/// The type is `Clone` because a single in-flight initialization outcome is
/// handed to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VisionError {
    /// A façade was used before `initialize()` completed successfully.
    #[error("need to initialize the vision library first")]
    NotInitialized,

    /// The library script could not be retrieved.
    #[error("could not fetch the script {url}")]
    FetchFailure { url: String },

    /// The library never registered its global within the time budget.
    #[error("initialization timeout after {waited:?}")]
    InitializationTimeout { waited: Duration },

    /// The background injection task panicked or was cancelled.
    #[error("vision library injection task failed: {0}")]
    Injection(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A native buffer has the wrong shape, depth or length.
    #[error("invalid buffer: {0}")]
    InvalidBuffer(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A request to the annotation backend failed.
    #[error("backend request failed: {0}")]
    Http(String),

    #[error("image error: {0}")]
    Image(String),
}

impl From<reqwest::Error> for VisionError {
    fn from(e: reqwest::Error) -> Self {
        VisionError::Http(e.to_string())
    }
}

impl From<image::ImageError> for VisionError {
    fn from(e: image::ImageError) -> Self {
        VisionError::Image(e.to_string())
    }
}

impl From<url::ParseError> for VisionError {
    fn from(e: url::ParseError) -> Self {
        VisionError::Config(format!("invalid url: {e}"))
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, VisionError>;
