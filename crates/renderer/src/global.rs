//! Per-frame global uniform buffers and the set 0 descriptors that expose
//! them to every pipeline.

use std::sync::Arc;

use lumen_rhi::RhiResult;
use lumen_rhi::buffer::{Buffer, BufferUsage};
use lumen_rhi::descriptor::{
    DescriptorPool, DescriptorPoolBuilder, DescriptorSetLayout, DescriptorSetLayoutBuilder,
    DescriptorWriter,
};
use lumen_rhi::device::Device;
use lumen_rhi::swapchain::MAX_FRAMES_IN_FLIGHT;
use lumen_rhi::vk;
use tracing::debug;

use crate::ubo::GlobalUbo;

pub struct GlobalResources {
    sets: Vec<vk::DescriptorSet>,
    buffers: Vec<Buffer>,
    _pool: DescriptorPool,
    layout: DescriptorSetLayout,
}

impl GlobalResources {
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let frames = MAX_FRAMES_IN_FLIGHT as u32;

        let layout = DescriptorSetLayoutBuilder::new()
            .add_binding(
                0,
                vk::DescriptorType::UNIFORM_BUFFER,
                vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                1,
            )
            .build(device.clone())?;
        let pool = DescriptorPoolBuilder::new()
            .set_max_sets(frames)
            .add_pool_size(vk::DescriptorType::UNIFORM_BUFFER, frames)
            .build(device.clone())?;

        let mut buffers = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        let mut sets = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        for _ in 0..MAX_FRAMES_IN_FLIGHT {
            let buffer = Buffer::new(
                device.clone(),
                BufferUsage::Uniform,
                GlobalUbo::SIZE as vk::DeviceSize,
            )?;
            buffer.write(&GlobalUbo::default())?;
            let set = DescriptorWriter::new(&layout, &pool)
                .write_buffer(0, buffer.descriptor_info())
                .build()?;
            buffers.push(buffer);
            sets.push(set);
        }

        debug!("Created global descriptor sets for {} frames", frames);

        Ok(Self {
            sets,
            buffers,
            _pool: pool,
            layout,
        })
    }

    #[inline]
    pub fn layout(&self) -> &DescriptorSetLayout {
        &self.layout
    }

    #[inline]
    pub fn descriptor_set(&self, frame_index: usize) -> vk::DescriptorSet {
        self.sets[frame_index]
    }

    /// Uploads `ubo` into the buffer of `frame_index`.
    pub fn update(&self, frame_index: usize, ubo: &GlobalUbo) -> RhiResult<()> {
        self.buffers[frame_index].write(ubo)
    }
}
