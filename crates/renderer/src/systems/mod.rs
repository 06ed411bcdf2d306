//! Render systems record the draws of one kind of scene object into the
//! current frame's command buffer.

mod shader_template;
mod simple_render_system;
mod texture_plan;
mod texture_render_system;

use lumen_rhi::vk;

pub use shader_template::{
    FragmentShaderGenerator, FragmentShaderTemplate, SAMPLER_ARRAY_DECLARATION, TEXTURES_COUNT_PREFIX,
    TEXTURES_DEFINE,
};
pub use simple_render_system::SimpleRenderSystem;
pub use texture_plan::{
    RebuildTracker, TEXTURE_ARRAY_BINDING, TextureBindingPlan, TextureDraw, TextureShape, eligible_objects,
    plan_texture_draws, total_texture_count,
};
pub use texture_render_system::{TextureRenderSystem, TextureShaderPaths};

/// Both pipelines read their push constants in the vertex and fragment stages.
const PUSH_STAGES: vk::ShaderStageFlags =
    vk::ShaderStageFlags::from_raw(vk::ShaderStageFlags::VERTEX.as_raw() | vk::ShaderStageFlags::FRAGMENT.as_raw());
