//! Error types for the Vulkan layer.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RhiError {
    #[error("Vulkan error: {0}")]
    VulkanError(#[from] ash::vk::Result),

    #[error("Failed to load Vulkan: {0}")]
    LoadingError(#[from] ash::LoadingError),

    #[error("Allocator error: {0}")]
    AllocatorError(#[from] gpu_allocator::AllocationError),

    #[error("No suitable GPU found")]
    NoSuitableGpu,

    #[error("Failed to read shader '{path}': {source}")]
    ShaderRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Shader error: {0}")]
    ShaderError(String),

    #[error("Shader compilation of '{name}' failed: {message}")]
    ShaderCompileError { name: String, message: String },

    #[error("Swapchain error: {0}")]
    SwapchainError(String),

    #[error("Descriptor error: {0}")]
    DescriptorError(String),

    #[error("Pipeline error: {0}")]
    PipelineError(String),

    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    #[error("Allocator lock poisoned")]
    AllocatorPoisoned,
}

pub type RhiResult<T> = std::result::Result<T, RhiError>;
