//! Sampled 2D textures uploaded through a staging buffer.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::buffer::{Buffer, BufferUsage};
use crate::command::CommandPool;
use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::image::{GpuImage, ImageDesc};

pub const TEXTURE_FORMAT: vk::Format = vk::Format::R8G8B8A8_SRGB;

/// A shader-readable RGBA8 image plus its sampler.
pub struct Texture {
    device: Arc<Device>,
    image: GpuImage,
    sampler: vk::Sampler,
    name: String,
}

impl Texture {
    /// Uploads tightly packed RGBA8 `pixels` and leaves the image in
    /// `SHADER_READ_ONLY_OPTIMAL`.
    ///
    /// Blocks until the copy has finished on the graphics queue.
    pub fn from_rgba8(
        device: Arc<Device>,
        pool: &CommandPool,
        width: u32,
        height: u32,
        pixels: &[u8],
        name: &str,
    ) -> RhiResult<Self> {
        let expected = rgba8_size(width, height);
        if pixels.len() != expected {
            return Err(RhiError::InvalidHandle(format!(
                "texture '{}' is {}x{} but has {} bytes (expected {})",
                name,
                width,
                height,
                pixels.len(),
                expected
            )));
        }

        let staging = Buffer::with_data(device.clone(), BufferUsage::Staging, pixels)?;
        let extent = vk::Extent2D { width, height };
        let image = GpuImage::new(device.clone(), ImageDesc::sampled(extent, TEXTURE_FORMAT), name)?;

        pool.submit_once(device.graphics_queue(), |cmd| {
            cmd.image_barrier(
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::TRANSFER,
                image.layout_barrier(
                    vk::ImageLayout::UNDEFINED,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    vk::AccessFlags::empty(),
                    vk::AccessFlags::TRANSFER_WRITE,
                ),
            );
            cmd.copy_buffer_to_image(
                staging.handle(),
                image.image(),
                vk::Extent3D {
                    width,
                    height,
                    depth: 1,
                },
            );
            cmd.image_barrier(
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                image.layout_barrier(
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                    vk::AccessFlags::TRANSFER_WRITE,
                    vk::AccessFlags::SHADER_READ,
                ),
            );
        })?;

        let sampler = create_sampler(&device)?;
        debug!("Uploaded texture '{}' ({}x{})", name, width, height);

        Ok(Self {
            device,
            image,
            sampler,
            name: name.to_string(),
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.image.extent()
    }

    #[inline]
    pub fn sampler(&self) -> vk::Sampler {
        self.sampler
    }

    /// Image info for a combined image sampler write.
    pub fn descriptor_info(&self) -> vk::DescriptorImageInfo {
        vk::DescriptorImageInfo::default()
            .sampler(self.sampler)
            .image_view(self.image.view())
            .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_sampler(self.sampler, None);
        }
    }
}

fn create_sampler(device: &Device) -> RhiResult<vk::Sampler> {
    let mut create_info = vk::SamplerCreateInfo::default()
        .mag_filter(vk::Filter::LINEAR)
        .min_filter(vk::Filter::LINEAR)
        .address_mode_u(vk::SamplerAddressMode::REPEAT)
        .address_mode_v(vk::SamplerAddressMode::REPEAT)
        .address_mode_w(vk::SamplerAddressMode::REPEAT)
        .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
        .unnormalized_coordinates(false)
        .compare_enable(false)
        .compare_op(vk::CompareOp::ALWAYS)
        .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
        .max_lod(0.0);

    if let Some(max_anisotropy) = device.max_sampler_anisotropy() {
        create_info = create_info
            .anisotropy_enable(true)
            .max_anisotropy(max_anisotropy);
    }

    Ok(unsafe { device.handle().create_sampler(&create_info, None)? })
}

fn rgba8_size(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}
