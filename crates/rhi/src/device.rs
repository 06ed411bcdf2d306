//! Logical device, queues and the GPU memory allocator.

use std::sync::{Arc, Mutex, MutexGuard};

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use tracing::{debug, error, info};

use crate::error::{RhiError, RhiResult};
use crate::instance::Instance;
use crate::physical_device::PhysicalDeviceInfo;

pub(crate) const DEVICE_EXTENSIONS: &[&std::ffi::CStr] = &[ash::khr::swapchain::NAME];

/// Logical device shared by every GPU object through `Arc<Device>`.
///
/// The allocator is wrapped in `Option` only so `Drop` can release it before
/// the device handle goes away.
pub struct Device {
    device: ash::Device,
    physical_device: vk::PhysicalDevice,
    allocator: Option<Mutex<Allocator>>,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,
    graphics_family: u32,
    present_family: u32,
    max_sampler_anisotropy: Option<f32>,
}

impl Device {
    pub fn new(instance: &Instance, info: &PhysicalDeviceInfo) -> RhiResult<Arc<Self>> {
        let (graphics_family, present_family) = match (
            info.queue_families.graphics_family,
            info.queue_families.present_family,
        ) {
            (Some(graphics), Some(present)) => (graphics, present),
            _ => return Err(RhiError::NoSuitableGpu),
        };

        let unique_families = info.queue_families.unique_families();
        let queue_priorities = [1.0f32];
        let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = unique_families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(family)
                    .queue_priorities(&queue_priorities)
            })
            .collect();

        let anisotropy = info.features.sampler_anisotropy == vk::TRUE;
        // The textured pipeline indexes its sampler array with a push constant.
        let features = vk::PhysicalDeviceFeatures::default()
            .sampler_anisotropy(anisotropy)
            .shader_sampled_image_array_dynamic_indexing(
                info.features.shader_sampled_image_array_dynamic_indexing == vk::TRUE,
            );

        let extension_names: Vec<*const std::ffi::c_char> =
            DEVICE_EXTENSIONS.iter().map(|ext| ext.as_ptr()).collect();

        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_names)
            .enabled_features(&features);

        let device = unsafe {
            instance
                .handle()
                .create_device(info.device, &create_info, None)?
        };

        let graphics_queue = unsafe { device.get_device_queue(graphics_family, 0) };
        let present_queue = unsafe { device.get_device_queue(present_family, 0) };
        debug!(
            "Queues retrieved: graphics family {}, present family {}",
            graphics_family, present_family
        );

        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.handle().clone(),
            device: device.clone(),
            physical_device: info.device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        })?;

        info!(
            "Logical device created on '{}' (anisotropy: {})",
            info.device_name(),
            anisotropy
        );

        Ok(Arc::new(Self {
            device,
            physical_device: info.device,
            allocator: Some(Mutex::new(allocator)),
            graphics_queue,
            present_queue,
            graphics_family,
            present_family,
            max_sampler_anisotropy: anisotropy
                .then_some(info.properties.limits.max_sampler_anisotropy),
        }))
    }

    #[inline]
    pub fn handle(&self) -> &ash::Device {
        &self.device
    }

    #[inline]
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    #[inline]
    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    #[inline]
    pub fn present_queue(&self) -> vk::Queue {
        self.present_queue
    }

    #[inline]
    pub fn graphics_family(&self) -> u32 {
        self.graphics_family
    }

    #[inline]
    pub fn present_family(&self) -> u32 {
        self.present_family
    }

    /// Anisotropy limit, or `None` when the feature was not enabled.
    #[inline]
    pub fn max_sampler_anisotropy(&self) -> Option<f32> {
        self.max_sampler_anisotropy
    }

    pub fn lock_allocator(&self) -> RhiResult<MutexGuard<'_, Allocator>> {
        self.allocator
            .as_ref()
            .ok_or(RhiError::AllocatorPoisoned)?
            .lock()
            .map_err(|_| RhiError::AllocatorPoisoned)
    }

    pub fn wait_idle(&self) -> RhiResult<()> {
        unsafe { self.device.device_wait_idle()? };
        Ok(())
    }

    /// Blocks until every submission on the graphics queue has finished.
    pub fn wait_graphics_queue_idle(&self) -> RhiResult<()> {
        unsafe { self.device.queue_wait_idle(self.graphics_queue)? };
        Ok(())
    }

    /// Submits to the graphics queue.
    ///
    /// # Safety
    ///
    /// Every handle referenced by `submit_infos` must be valid and the command
    /// buffers must be in the executable state.
    pub unsafe fn submit_graphics(
        &self,
        submit_infos: &[vk::SubmitInfo],
        fence: vk::Fence,
    ) -> RhiResult<()> {
        unsafe {
            self.device
                .queue_submit(self.graphics_queue, submit_infos, fence)?;
        }
        Ok(())
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = self.device.device_wait_idle() {
                error!("Failed to wait for device idle during drop: {:?}", e);
            }
        }
        drop(self.allocator.take());
        unsafe {
            self.device.destroy_device(None);
        }
        info!("Logical device destroyed");
    }
}

// ash::Device is Send + Sync, queue handles are plain values and the
// allocator sits behind a Mutex.
unsafe impl Send for Device {}
unsafe impl Sync for Device {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_swapchain_extension_required() {
        assert_eq!(DEVICE_EXTENSIONS, &[ash::khr::swapchain::NAME]);
    }

    #[test]
    fn test_device_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Device>();
    }
}
