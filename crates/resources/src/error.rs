//! Error types for resource loading.

use std::path::PathBuf;

use lumen_rhi::RhiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to decode image '{path}': {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error(transparent)]
    Rhi(#[from] RhiError),
}

pub type ResourceResult<T> = Result<T, ResourceError>;
