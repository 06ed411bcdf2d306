//! Graphics pipelines and the fixed-function state they are built from.
//!
//! A [`PipelineConfig`] starts from [`PipelineConfig::default_config`], gets
//! its layout and render pass filled in by the owning render system, and is
//! then handed to [`Pipeline::new`].

use std::path::Path;
use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use crate::command::CommandBuffer;
use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::shader::{ShaderModule, ShaderStage};
use crate::vertex::Vertex;

/// Fixed-function state for one graphics pipeline.
///
/// Deliberately not `Clone`: configs are built in place and borrowed by
/// [`Pipeline::new`].
#[derive(Debug)]
pub struct PipelineConfig {
    pub binding_descriptions: Vec<vk::VertexInputBindingDescription>,
    pub attribute_descriptions: Vec<vk::VertexInputAttributeDescription>,
    pub viewport_info: vk::PipelineViewportStateCreateInfo<'static>,
    pub input_assembly_info: vk::PipelineInputAssemblyStateCreateInfo<'static>,
    pub rasterization_info: vk::PipelineRasterizationStateCreateInfo<'static>,
    pub multisample_info: vk::PipelineMultisampleStateCreateInfo<'static>,
    pub color_blend_attachment: vk::PipelineColorBlendAttachmentState,
    /// Attachment pointers are filled in at build time from
    /// `color_blend_attachment`.
    pub color_blend_info: vk::PipelineColorBlendStateCreateInfo<'static>,
    pub depth_stencil_info: vk::PipelineDepthStencilStateCreateInfo<'static>,
    pub dynamic_state_enables: Vec<vk::DynamicState>,
    pub pipeline_layout: vk::PipelineLayout,
    pub render_pass: vk::RenderPass,
    pub subpass: u32,
}

impl PipelineConfig {
    /// Opaque triangle lists with depth testing and dynamic viewport/scissor.
    pub fn default_config() -> Self {
        Self {
            binding_descriptions: Vertex::binding_descriptions(),
            attribute_descriptions: Vertex::attribute_descriptions(),
            viewport_info: vk::PipelineViewportStateCreateInfo::default()
                .viewport_count(1)
                .scissor_count(1),
            input_assembly_info: vk::PipelineInputAssemblyStateCreateInfo::default()
                .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
                .primitive_restart_enable(false),
            rasterization_info: vk::PipelineRasterizationStateCreateInfo::default()
                .depth_clamp_enable(false)
                .rasterizer_discard_enable(false)
                .polygon_mode(vk::PolygonMode::FILL)
                .line_width(1.0)
                .cull_mode(vk::CullModeFlags::NONE)
                .front_face(vk::FrontFace::CLOCKWISE)
                .depth_bias_enable(false),
            multisample_info: vk::PipelineMultisampleStateCreateInfo::default()
                .sample_shading_enable(false)
                .rasterization_samples(vk::SampleCountFlags::TYPE_1)
                .min_sample_shading(1.0)
                .alpha_to_coverage_enable(false)
                .alpha_to_one_enable(false),
            color_blend_attachment: vk::PipelineColorBlendAttachmentState::default()
                .blend_enable(false)
                .color_write_mask(vk::ColorComponentFlags::RGBA)
                .src_color_blend_factor(vk::BlendFactor::ONE)
                .dst_color_blend_factor(vk::BlendFactor::ZERO)
                .color_blend_op(vk::BlendOp::ADD)
                .src_alpha_blend_factor(vk::BlendFactor::ONE)
                .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
                .alpha_blend_op(vk::BlendOp::ADD),
            color_blend_info: vk::PipelineColorBlendStateCreateInfo::default()
                .logic_op_enable(false)
                .logic_op(vk::LogicOp::COPY)
                .blend_constants([0.0; 4]),
            depth_stencil_info: vk::PipelineDepthStencilStateCreateInfo::default()
                .depth_test_enable(true)
                .depth_write_enable(true)
                .depth_compare_op(vk::CompareOp::LESS)
                .depth_bounds_test_enable(false)
                .min_depth_bounds(0.0)
                .max_depth_bounds(1.0)
                .stencil_test_enable(false),
            dynamic_state_enables: vec![vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR],
            pipeline_layout: vk::PipelineLayout::null(),
            render_pass: vk::RenderPass::null(),
            subpass: 0,
        }
    }

    /// Switches the color attachment to straight alpha blending. Nothing
    /// else in the config changes.
    pub fn enable_alpha_blending(&mut self) {
        self.color_blend_attachment = vk::PipelineColorBlendAttachmentState::default()
            .blend_enable(true)
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
            .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
            .color_blend_op(vk::BlendOp::ADD)
            .src_alpha_blend_factor(vk::BlendFactor::ONE)
            .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
            .alpha_blend_op(vk::BlendOp::ADD);
    }
}

pub struct PipelineLayout {
    device: Arc<Device>,
    layout: vk::PipelineLayout,
}

impl PipelineLayout {
    pub fn new(
        device: Arc<Device>,
        set_layouts: &[vk::DescriptorSetLayout],
        push_constant_ranges: &[vk::PushConstantRange],
    ) -> RhiResult<Self> {
        let create_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(set_layouts)
            .push_constant_ranges(push_constant_ranges);

        let layout = unsafe {
            device
                .handle()
                .create_pipeline_layout(&create_info, None)
                .map_err(|e| {
                    RhiError::PipelineError(format!("failed to create pipeline layout: {}", e))
                })?
        };

        debug!(
            "Created pipeline layout: {} set layout(s), {} push constant range(s)",
            set_layouts.len(),
            push_constant_ranges.len()
        );

        Ok(Self { device, layout })
    }

    #[inline]
    pub fn handle(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for PipelineLayout {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_pipeline_layout(self.layout, None);
        }
    }
}

/// A compiled graphics pipeline together with the shader modules it was
/// built from.
pub struct Pipeline {
    device: Arc<Device>,
    pipeline: vk::Pipeline,
    _vertex_module: ShaderModule,
    _fragment_module: ShaderModule,
}

impl Pipeline {
    /// Builds a pipeline from two SPIR-V files.
    ///
    /// # Panics
    ///
    /// If `config` has a null pipeline layout or render pass.
    pub fn new(
        device: Arc<Device>,
        vert_path: &Path,
        frag_path: &Path,
        config: &PipelineConfig,
    ) -> RhiResult<Self> {
        let fragment = ShaderModule::from_spirv_file(device.clone(), frag_path, ShaderStage::Fragment)?;
        Self::with_fragment_module(device, vert_path, fragment, config)
    }

    /// Builds a pipeline around a fragment module compiled elsewhere, taking
    /// ownership of it.
    ///
    /// # Panics
    ///
    /// If `config` has a null pipeline layout or render pass, or `fragment`
    /// is not a fragment module.
    pub fn with_fragment_module(
        device: Arc<Device>,
        vert_path: &Path,
        fragment: ShaderModule,
        config: &PipelineConfig,
    ) -> RhiResult<Self> {
        assert!(
            config.pipeline_layout != vk::PipelineLayout::null(),
            "cannot create graphics pipeline: no pipeline_layout provided in config"
        );
        assert!(
            config.render_pass != vk::RenderPass::null(),
            "cannot create graphics pipeline: no render_pass provided in config"
        );
        assert_eq!(fragment.stage(), ShaderStage::Fragment);

        let vertex = ShaderModule::from_spirv_file(device.clone(), vert_path, ShaderStage::Vertex)?;
        let pipeline = create_graphics_pipeline(&device, &vertex, &fragment, config)?;

        info!("Graphics pipeline created (vertex shader {})", vert_path.display());

        Ok(Self {
            device,
            pipeline,
            _vertex_module: vertex,
            _fragment_module: fragment,
        })
    }

    #[inline]
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    /// Binds the pipeline to the graphics bind point of `cmd`.
    pub fn bind(&self, cmd: &CommandBuffer) {
        cmd.bind_graphics_pipeline(self.pipeline);
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_pipeline(self.pipeline, None);
        }
        debug!("Graphics pipeline destroyed");
    }
}

fn create_graphics_pipeline(
    device: &Device,
    vertex: &ShaderModule,
    fragment: &ShaderModule,
    config: &PipelineConfig,
) -> RhiResult<vk::Pipeline> {
    let stages = [vertex.stage_create_info(), fragment.stage_create_info()];

    let vertex_input_info = vk::PipelineVertexInputStateCreateInfo::default()
        .vertex_binding_descriptions(&config.binding_descriptions)
        .vertex_attribute_descriptions(&config.attribute_descriptions);

    let color_blend_info = config
        .color_blend_info
        .attachments(std::slice::from_ref(&config.color_blend_attachment));

    let dynamic_state_info =
        vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&config.dynamic_state_enables);

    let create_info = vk::GraphicsPipelineCreateInfo::default()
        .stages(&stages)
        .vertex_input_state(&vertex_input_info)
        .input_assembly_state(&config.input_assembly_info)
        .viewport_state(&config.viewport_info)
        .rasterization_state(&config.rasterization_info)
        .multisample_state(&config.multisample_info)
        .color_blend_state(&color_blend_info)
        .depth_stencil_state(&config.depth_stencil_info)
        .dynamic_state(&dynamic_state_info)
        .layout(config.pipeline_layout)
        .render_pass(config.render_pass)
        .subpass(config.subpass)
        .base_pipeline_index(-1)
        .base_pipeline_handle(vk::Pipeline::null());

    let pipelines = unsafe {
        device
            .handle()
            .create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
            .map_err(|(_, e)| {
                RhiError::PipelineError(format!("failed to create graphics pipeline: {}", e))
            })?
    };

    pipelines
        .into_iter()
        .next()
        .ok_or_else(|| RhiError::PipelineError("driver returned no pipeline".to_string()))
}
