//! Thin, owning wrappers over Vulkan built on `ash`.
//!
//! Every wrapper keeps an `Arc<Device>` and destroys its handle on drop.
//! The crate covers:
//! - instance, physical device selection and the logical device
//! - the swapchain with its render pass, depth images and framebuffers
//! - buffers, images, textures and descriptor sets
//! - shader modules, the external GLSL compiler and graphics pipelines
//! - command recording and frame synchronization

mod error;

pub mod buffer;
pub mod command;
pub mod descriptor;
pub mod device;
pub mod image;
pub mod instance;
pub mod physical_device;
pub mod pipeline;
pub mod shader;
pub mod shader_compiler;
pub mod swapchain;
pub mod sync;
pub mod texture;
pub mod vertex;

pub use error::{RhiError, RhiResult};

pub use ash::vk;
