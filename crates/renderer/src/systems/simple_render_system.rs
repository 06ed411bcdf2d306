//! Untextured drawing with one fixed pipeline.

use std::path::Path;
use std::sync::Arc;

use lumen_resources::Model;
use lumen_rhi::RhiResult;
use lumen_rhi::device::Device;
use lumen_rhi::pipeline::{Pipeline, PipelineConfig, PipelineLayout};
use lumen_rhi::vk;
use tracing::info;

use super::PUSH_STAGES;
use crate::frame_context::FrameContext;
use crate::ubo::SimplePushConstants;

/// Draws every object that has a model without textures. Textured objects
/// belong to [`TextureRenderSystem`](super::TextureRenderSystem).
pub struct SimpleRenderSystem {
    pipeline: Pipeline,
    pipeline_layout: PipelineLayout,
}

impl SimpleRenderSystem {
    pub fn new(
        device: Arc<Device>,
        render_pass: vk::RenderPass,
        global_set_layout: vk::DescriptorSetLayout,
        vert_path: &Path,
        frag_path: &Path,
    ) -> RhiResult<Self> {
        let push_range = vk::PushConstantRange::default()
            .stage_flags(PUSH_STAGES)
            .offset(0)
            .size(SimplePushConstants::SIZE as u32);
        let pipeline_layout = PipelineLayout::new(device.clone(), &[global_set_layout], &[push_range])?;

        let mut config = PipelineConfig::default_config();
        config.render_pass = render_pass;
        config.pipeline_layout = pipeline_layout.handle();
        let pipeline = Pipeline::new(device, vert_path, frag_path, &config)?;

        info!("Simple render system ready");

        Ok(Self {
            pipeline,
            pipeline_layout,
        })
    }

    pub fn render_objects(&self, ctx: &FrameContext<'_, Model>) {
        let cmd = ctx.command_buffer;
        let layout = self.pipeline_layout.handle();

        self.pipeline.bind(cmd);
        cmd.bind_descriptor_sets(layout, 0, &[ctx.global_descriptor_set]);

        for object in ctx.scene_objects {
            let Some(model) = object.model.as_ref() else {
                continue;
            };
            if object.is_textured() {
                continue;
            }

            let push = SimplePushConstants {
                model_matrix: object.transform.mat4(),
                normal_matrix: object.transform.normal_matrix(),
            };
            cmd.push_constants(layout, PUSH_STAGES, &push);
            model.bind(cmd);
            model.draw(cmd);
        }
    }
}
