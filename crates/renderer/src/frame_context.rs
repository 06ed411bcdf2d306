use lumen_rhi::command::CommandBuffer;
use lumen_rhi::vk;
use lumen_scene::{Camera, SceneObjectMap};

/// Everything a render system needs to record one frame. Only valid
/// between `begin_frame` and `end_frame`.
pub struct FrameContext<'a, M> {
    pub frame_index: usize,
    pub frame_time: f32,
    pub command_buffer: &'a CommandBuffer,
    pub camera: &'a Camera,
    pub global_descriptor_set: vk::DescriptorSet,
    pub scene_objects: &'a SceneObjectMap<M>,
    /// Current swapchain render pass. Replaced when the swapchain is
    /// recreated, so systems that build pipelines mid-run read it from here.
    pub render_pass: vk::RenderPass,
}
