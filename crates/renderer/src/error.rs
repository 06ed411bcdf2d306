//! Error types for frame rendering and render systems.

use std::path::PathBuf;

use lumen_resources::ResourceError;
use lumen_rhi::RhiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Rhi(#[from] RhiError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("Invalid shader template: {0}")]
    ShaderTemplate(String),

    #[error("Shader file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type RenderResult<T> = std::result::Result<T, RenderError>;
