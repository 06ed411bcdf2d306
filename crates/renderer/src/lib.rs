//! Frame orchestration and render systems.
//!
//! This crate drives one frame at a time:
//! - [`FrameRenderer`] acquires, submits and presents, recreating the
//!   swapchain when it goes stale
//! - [`GlobalResources`] holds the per-frame camera and light uniforms
//! - render systems in [`systems`] record their draws between
//!   `begin_render_pass` and `end_render_pass`

mod error;
mod frame_context;
mod frame_renderer;
mod frame_state;
mod global;

pub mod systems;
pub mod ubo;

pub use error::{RenderError, RenderResult};
pub use frame_context::FrameContext;
pub use frame_renderer::FrameRenderer;
pub use frame_state::FrameState;
pub use global::GlobalResources;
pub use systems::{SimpleRenderSystem, TextureRenderSystem, TextureShaderPaths};
pub use ubo::{GlobalUbo, SimplePushConstants, TexturePushConstants};

pub use lumen_rhi::swapchain::MAX_FRAMES_IN_FLIGHT;
