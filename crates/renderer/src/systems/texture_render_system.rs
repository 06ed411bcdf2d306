//! Textured drawing whose texture array is sized to the scene.
//!
//! Every textured object contributes all of its textures to one combined
//! image sampler array in set 1. Whenever the set of textured objects
//! changes shape, the system waits for the graphics queue, then rebuilds in
//! order: descriptor pool/layout/sets, the generated fragment shader, the
//! pipeline layout and the pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::Mat4;
use lumen_core::ShaderSettings;
use lumen_resources::Model;
use lumen_rhi::RhiResult;
use lumen_rhi::descriptor::{DescriptorPool, DescriptorSetLayout, DescriptorWriter};
use lumen_rhi::device::Device;
use lumen_rhi::pipeline::{Pipeline, PipelineConfig, PipelineLayout};
use lumen_rhi::shader::{ShaderModule, ShaderStage};
use lumen_rhi::shader_compiler::ShaderCompiler;
use lumen_rhi::swapchain::MAX_FRAMES_IN_FLIGHT;
use lumen_rhi::vk;
use lumen_scene::{SceneObjectId, SceneObjectMap};
use tracing::{debug, error, info};

use super::PUSH_STAGES;
use super::shader_template::{FragmentShaderGenerator, FragmentShaderTemplate};
use super::texture_plan::{
    RebuildTracker, TEXTURE_ARRAY_BINDING, TextureBindingPlan, TextureShape, eligible_objects,
    plan_texture_draws,
};
use crate::error::{RenderError, RenderResult};
use crate::frame_context::FrameContext;
use crate::ubo::TexturePushConstants;

/// Files the texture render system reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureShaderPaths {
    /// Precompiled vertex shader.
    pub vertex_spirv: PathBuf,
    /// GLSL fragment template with the texture count line.
    pub fragment_template: PathBuf,
    /// Where each generated fragment source is written before compiling.
    pub fragment_generated: PathBuf,
}

impl TextureShaderPaths {
    pub fn from_settings(settings: &ShaderSettings) -> Self {
        Self {
            vertex_spirv: settings.resolve("texture_shader.vert.spv"),
            fragment_template: settings.texture_template_path(),
            fragment_generated: settings.texture_generated_path(),
        }
    }
}

/// Set 1 of the textured pipeline, one set per frame in flight.
struct TextureDescriptors {
    sets: Vec<vk::DescriptorSet>,
    layout: DescriptorSetLayout,
    _pool: DescriptorPool,
}

pub struct TextureRenderSystem {
    pipeline: Pipeline,
    pipeline_layout: PipelineLayout,
    descriptors: TextureDescriptors,
    generator: FragmentShaderGenerator,
    compiler: Box<dyn ShaderCompiler>,
    tracker: RebuildTracker,
    eligible: Vec<SceneObjectId>,
    paths: TextureShaderPaths,
    render_pass: vk::RenderPass,
    global_set_layout: vk::DescriptorSetLayout,
    device: Arc<Device>,
}

impl TextureRenderSystem {
    /// Builds every resource for the textured objects currently in
    /// `objects`.
    ///
    /// The fragment template is read and validated once here; an invalid
    /// template fails construction.
    pub fn new(
        device: Arc<Device>,
        render_pass: vk::RenderPass,
        global_set_layout: vk::DescriptorSetLayout,
        paths: TextureShaderPaths,
        compiler: Box<dyn ShaderCompiler>,
        objects: &SceneObjectMap<Model>,
    ) -> RenderResult<Self> {
        let template = FragmentShaderTemplate::load(&paths.fragment_template)?;
        let mut generator = FragmentShaderGenerator::new(template);

        let eligible = eligible_objects(objects);
        let shape = TextureShape::of(objects, &eligible);
        let texture_count = shape.texture_count as u32;

        let descriptors = build_descriptors(&device, objects, &eligible, texture_count)?;
        let fragment = compile_fragment_shader(
            &device,
            &mut generator,
            compiler.as_ref(),
            &paths.fragment_generated,
            texture_count,
        )?;
        let (pipeline_layout, pipeline) = build_pipeline(
            &device,
            render_pass,
            global_set_layout,
            descriptors.layout.handle(),
            &paths.vertex_spirv,
            fragment,
        )?;

        info!(
            "Texture render system ready: {} object(s), {} texture(s)",
            shape.object_count, shape.texture_count
        );

        Ok(Self {
            pipeline,
            pipeline_layout,
            descriptors,
            generator,
            compiler,
            tracker: RebuildTracker::built_for(shape),
            eligible,
            paths,
            render_pass,
            global_set_layout,
            device,
        })
    }

    /// Refreshes the list of textured objects and returns its length.
    pub fn recompute_eligible_objects(&mut self, objects: &SceneObjectMap<Model>) -> usize {
        self.eligible = eligible_objects(objects);
        self.eligible.len()
    }

    /// Replaces the descriptor pool, layout and per-frame sets with ones
    /// sized for the current textured objects.
    ///
    /// Waits for the graphics queue first: in-flight command buffers may
    /// still reference the sets being destroyed.
    pub fn rebuild_descriptor_resources(&mut self, objects: &SceneObjectMap<Model>) -> RenderResult<()> {
        self.device.wait_graphics_queue_idle()?;

        let texture_count = TextureShape::of(objects, &self.eligible).texture_count as u32;
        self.descriptors = build_descriptors(&self.device, objects, &self.eligible, texture_count)?;
        Ok(())
    }

    /// Writes and compiles the fragment shader for `texture_count` textures.
    pub fn regenerate_fragment_shader(&mut self, texture_count: u32) -> RenderResult<ShaderModule> {
        compile_fragment_shader(
            &self.device,
            &mut self.generator,
            self.compiler.as_ref(),
            &self.paths.fragment_generated,
            texture_count,
        )
    }

    /// Rebuilds the pipeline layout and pipeline for `render_pass` around
    /// `fragment` and the current descriptor layout.
    pub fn rebuild_pipeline(&mut self, render_pass: vk::RenderPass, fragment: ShaderModule) -> RenderResult<()> {
        self.render_pass = render_pass;
        let (pipeline_layout, pipeline) = build_pipeline(
            &self.device,
            self.render_pass,
            self.global_set_layout,
            self.descriptors.layout.handle(),
            &self.paths.vertex_spirv,
            fragment,
        )?;
        self.pipeline = pipeline;
        self.pipeline_layout = pipeline_layout;
        Ok(())
    }

    /// Draws every textured object, rebuilding first if their number or
    /// total texture count changed since the last build.
    pub fn render_objects(&mut self, ctx: &FrameContext<'_, Model>) -> RenderResult<()> {
        let objects = ctx.scene_objects;
        self.recompute_eligible_objects(objects);

        let shape = TextureShape::of(objects, &self.eligible);
        if self.tracker.needs_rebuild(shape) {
            info!(
                "Textured objects changed to {} object(s), {} texture(s); rebuilding",
                shape.object_count, shape.texture_count
            );
            self.rebuild_descriptor_resources(objects)?;
            let fragment = self.regenerate_fragment_shader(shape.texture_count as u32)?;
            self.rebuild_pipeline(ctx.render_pass, fragment)?;
            self.tracker.mark_built(shape);
        }

        let cmd = ctx.command_buffer;
        let layout = self.pipeline_layout.handle();

        self.pipeline.bind(cmd);
        cmd.bind_descriptor_sets(
            layout,
            0,
            &[ctx.global_descriptor_set, self.descriptors.sets[ctx.frame_index]],
        );

        let mut bound: Option<(SceneObjectId, &Model, Mat4, Mat4)> = None;
        for draw in plan_texture_draws(objects, &self.eligible) {
            if bound.map(|(id, ..)| id) != Some(draw.object) {
                let Some(object) = objects.get(draw.object) else {
                    continue;
                };
                let Some(model) = object.model.as_deref() else {
                    continue;
                };
                model.bind(cmd);
                bound = Some((
                    draw.object,
                    model,
                    object.transform.mat4(),
                    object.transform.normal_matrix(),
                ));
            }
            let Some((_, model, model_matrix, normal_matrix)) = bound else {
                continue;
            };

            let push = TexturePushConstants::new(
                model_matrix,
                normal_matrix,
                draw.diffuse_color,
                draw.texture_index,
            );
            cmd.push_constants(layout, PUSH_STAGES, &push);
            model.draw_indexed(cmd, draw.index_count, draw.index_start);
        }

        Ok(())
    }

    /// Textured objects found by the last recompute, in draw order.
    #[inline]
    pub fn eligible(&self) -> &[SceneObjectId] {
        &self.eligible
    }

    /// Length of the bound texture array.
    pub fn texture_count(&self) -> usize {
        self.tracker.current().map_or(0, |shape| shape.texture_count)
    }
}

fn build_descriptors(
    device: &Arc<Device>,
    objects: &SceneObjectMap<Model>,
    eligible: &[SceneObjectId],
    texture_count: u32,
) -> RhiResult<TextureDescriptors> {
    let plan = TextureBindingPlan::for_count(texture_count);
    let pool = plan.pool_builder().build(device.clone())?;
    let layout = plan.layout_builder().build(device.clone())?;

    let image_infos: Vec<vk::DescriptorImageInfo> = eligible
        .iter()
        .filter_map(|id| objects.get(*id))
        .filter_map(|object| object.model.as_ref())
        .flat_map(|model| model.textures().iter().map(|texture| texture.descriptor_info()))
        .collect();

    let mut writer = DescriptorWriter::new(&layout, &pool);
    if plan.has_textures() {
        writer = writer.write_image(TEXTURE_ARRAY_BINDING, &image_infos);
    }
    let mut sets = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
    for _ in 0..MAX_FRAMES_IN_FLIGHT {
        let set = pool.allocate(&layout)?;
        writer.overwrite(set);
        sets.push(set);
    }

    debug!(
        "Texture descriptors built: {} set(s) of {} texture(s)",
        sets.len(),
        texture_count
    );

    Ok(TextureDescriptors {
        sets,
        layout,
        _pool: pool,
    })
}

fn compile_fragment_shader(
    device: &Arc<Device>,
    generator: &mut FragmentShaderGenerator,
    compiler: &dyn ShaderCompiler,
    output: &Path,
    texture_count: u32,
) -> RenderResult<ShaderModule> {
    let source = generator.generate(texture_count);

    std::fs::write(output, &source).map_err(|source| {
        error!("Failed to write generated fragment shader {}: {}", output.display(), source);
        RenderError::Io {
            path: output.to_path_buf(),
            source,
        }
    })?;

    let words = compiler.compile(&source, ShaderStage::Fragment, &output.display().to_string())?;
    Ok(ShaderModule::from_words(device.clone(), &words, ShaderStage::Fragment)?)
}

fn build_pipeline(
    device: &Arc<Device>,
    render_pass: vk::RenderPass,
    global_set_layout: vk::DescriptorSetLayout,
    texture_set_layout: vk::DescriptorSetLayout,
    vertex_spirv: &Path,
    fragment: ShaderModule,
) -> RhiResult<(PipelineLayout, Pipeline)> {
    let push_range = vk::PushConstantRange::default()
        .stage_flags(PUSH_STAGES)
        .offset(0)
        .size(TexturePushConstants::SIZE as u32);
    let pipeline_layout = PipelineLayout::new(
        device.clone(),
        &[global_set_layout, texture_set_layout],
        &[push_range],
    )?;

    let mut config = PipelineConfig::default_config();
    config.render_pass = render_pass;
    config.pipeline_layout = pipeline_layout.handle();
    let pipeline = Pipeline::with_fragment_module(device.clone(), vertex_spirv, fragment, &config)?;

    Ok((pipeline_layout, pipeline))
}
