//! Descriptor set layouts, pools and writers.
//!
//! The builders are plain data until `build` is called, so the shape of a
//! layout or pool can be inspected without a device:
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use lumen_rhi::device::Device;
//! # use lumen_rhi::descriptor::*;
//! # use lumen_rhi::vk;
//! # fn example(device: Arc<Device>, info: vk::DescriptorBufferInfo) -> lumen_rhi::RhiResult<()> {
//! let layout = DescriptorSetLayoutBuilder::new()
//!     .add_binding(0, vk::DescriptorType::UNIFORM_BUFFER, vk::ShaderStageFlags::ALL_GRAPHICS, 1)
//!     .build(device.clone())?;
//! let pool = DescriptorPoolBuilder::new()
//!     .set_max_sets(2)
//!     .add_pool_size(vk::DescriptorType::UNIFORM_BUFFER, 2)
//!     .build(device)?;
//! let set = DescriptorWriter::new(&layout, &pool)
//!     .write_buffer(0, info)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// One binding of a set layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutBinding {
    pub binding: u32,
    pub descriptor_type: vk::DescriptorType,
    pub descriptor_count: u32,
    pub stage_flags: vk::ShaderStageFlags,
}

impl LayoutBinding {
    fn to_vk(self) -> vk::DescriptorSetLayoutBinding<'static> {
        vk::DescriptorSetLayoutBinding::default()
            .binding(self.binding)
            .descriptor_type(self.descriptor_type)
            .descriptor_count(self.descriptor_count)
            .stage_flags(self.stage_flags)
    }
}

#[derive(Debug, Default, Clone)]
pub struct DescriptorSetLayoutBuilder {
    bindings: BTreeMap<u32, LayoutBinding>,
}

impl DescriptorSetLayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds binding `binding` holding `count` descriptors of `ty`.
    ///
    /// # Panics
    ///
    /// If `binding` was already added.
    pub fn add_binding(
        mut self,
        binding: u32,
        ty: vk::DescriptorType,
        stages: vk::ShaderStageFlags,
        count: u32,
    ) -> Self {
        assert!(
            !self.bindings.contains_key(&binding),
            "descriptor binding {} already in use",
            binding
        );
        self.bindings.insert(
            binding,
            LayoutBinding {
                binding,
                descriptor_type: ty,
                descriptor_count: count,
                stage_flags: stages,
            },
        );
        self
    }

    /// Bindings in ascending binding order.
    pub fn bindings(&self) -> impl Iterator<Item = &LayoutBinding> {
        self.bindings.values()
    }

    pub fn build(self, device: Arc<Device>) -> RhiResult<DescriptorSetLayout> {
        let bindings: Vec<_> = self.bindings.values().map(|b| b.to_vk()).collect();
        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
        let layout = unsafe {
            device
                .handle()
                .create_descriptor_set_layout(&create_info, None)?
        };

        debug!("Created descriptor set layout with {} binding(s)", bindings.len());

        Ok(DescriptorSetLayout {
            device,
            layout,
            bindings: self.bindings,
        })
    }
}

pub struct DescriptorSetLayout {
    device: Arc<Device>,
    layout: vk::DescriptorSetLayout,
    bindings: BTreeMap<u32, LayoutBinding>,
}

impl DescriptorSetLayout {
    #[inline]
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }

    pub fn binding(&self, binding: u32) -> Option<&LayoutBinding> {
        self.bindings.get(&binding)
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

#[derive(Debug, Clone)]
pub struct DescriptorPoolBuilder {
    max_sets: u32,
    pool_sizes: Vec<vk::DescriptorPoolSize>,
}

impl Default for DescriptorPoolBuilder {
    fn default() -> Self {
        Self {
            max_sets: 1000,
            pool_sizes: Vec::new(),
        }
    }
}

impl DescriptorPoolBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_max_sets(mut self, max_sets: u32) -> Self {
        self.max_sets = max_sets;
        self
    }

    pub fn add_pool_size(mut self, ty: vk::DescriptorType, count: u32) -> Self {
        self.pool_sizes.push(vk::DescriptorPoolSize {
            ty,
            descriptor_count: count,
        });
        self
    }

    #[inline]
    pub fn max_sets(&self) -> u32 {
        self.max_sets
    }

    #[inline]
    pub fn pool_sizes(&self) -> &[vk::DescriptorPoolSize] {
        &self.pool_sizes
    }

    pub fn build(self, device: Arc<Device>) -> RhiResult<DescriptorPool> {
        let create_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(self.max_sets)
            .pool_sizes(&self.pool_sizes);
        let pool = unsafe { device.handle().create_descriptor_pool(&create_info, None)? };

        debug!(
            "Created descriptor pool: {} set(s), {} pool size(s)",
            self.max_sets,
            self.pool_sizes.len()
        );

        Ok(DescriptorPool { device, pool })
    }
}

pub struct DescriptorPool {
    device: Arc<Device>,
    pool: vk::DescriptorPool,
}

impl DescriptorPool {
    #[inline]
    pub fn handle(&self) -> vk::DescriptorPool {
        self.pool
    }

    pub fn allocate(&self, layout: &DescriptorSetLayout) -> RhiResult<vk::DescriptorSet> {
        let layouts = [layout.handle()];
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.pool)
            .set_layouts(&layouts);

        let sets = unsafe { self.device.handle().allocate_descriptor_sets(&alloc_info)? };
        sets.into_iter()
            .next()
            .ok_or_else(|| RhiError::DescriptorError("driver returned no descriptor set".to_string()))
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_descriptor_pool(self.pool, None);
        }
    }
}

enum PendingWrite {
    Buffer(u32, vk::DescriptorBufferInfo),
    Images(u32, Vec<vk::DescriptorImageInfo>),
}

/// Collects writes against one layout, then allocates and fills a set.
pub struct DescriptorWriter<'a> {
    layout: &'a DescriptorSetLayout,
    pool: &'a DescriptorPool,
    writes: Vec<PendingWrite>,
}

impl<'a> DescriptorWriter<'a> {
    pub fn new(layout: &'a DescriptorSetLayout, pool: &'a DescriptorPool) -> Self {
        Self {
            layout,
            pool,
            writes: Vec::new(),
        }
    }

    /// # Panics
    ///
    /// If the layout has no single-descriptor binding `binding`.
    pub fn write_buffer(mut self, binding: u32, info: vk::DescriptorBufferInfo) -> Self {
        check_write(self.layout.binding(binding), binding, 1);
        self.writes.push(PendingWrite::Buffer(binding, info));
        self
    }

    /// Writes a whole descriptor array.
    ///
    /// # Panics
    ///
    /// If the layout has no binding `binding` or its count differs from
    /// `infos.len()`.
    pub fn write_image(mut self, binding: u32, infos: &[vk::DescriptorImageInfo]) -> Self {
        check_write(self.layout.binding(binding), binding, infos.len());
        self.writes.push(PendingWrite::Images(binding, infos.to_vec()));
        self
    }

    /// Allocates a set from the pool and applies the writes to it.
    pub fn build(self) -> RhiResult<vk::DescriptorSet> {
        let set = self.pool.allocate(self.layout)?;
        self.overwrite(set);
        Ok(set)
    }

    /// Applies the writes to an existing set.
    pub fn overwrite(&self, set: vk::DescriptorSet) {
        let writes: Vec<vk::WriteDescriptorSet> = self
            .writes
            .iter()
            .filter_map(|write| {
                let (binding, base) = match write {
                    PendingWrite::Buffer(binding, info) => (
                        *binding,
                        vk::WriteDescriptorSet::default()
                            .buffer_info(std::slice::from_ref(info)),
                    ),
                    PendingWrite::Images(binding, infos) => (
                        *binding,
                        vk::WriteDescriptorSet::default().image_info(infos),
                    ),
                };
                let layout_binding = self.layout.binding(binding)?;
                Some(
                    base.dst_set(set)
                        .dst_binding(binding)
                        .descriptor_type(layout_binding.descriptor_type),
                )
            })
            .collect();

        if writes.is_empty() {
            return;
        }
        unsafe {
            self.layout
                .device
                .handle()
                .update_descriptor_sets(&writes, &[]);
        }
    }
}

fn check_write(
    layout_binding: Option<&LayoutBinding>,
    binding: u32,
    count: usize,
) {
    let layout_binding = layout_binding
        .unwrap_or_else(|| panic!("layout does not contain binding {}", binding));
    assert_eq!(
        layout_binding.descriptor_count as usize, count,
        "binding {} expects {} descriptor(s)",
        binding, layout_binding.descriptor_count
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sampler_array(count: u32) -> LayoutBinding {
        LayoutBinding {
            binding: 0,
            descriptor_type: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            descriptor_count: count,
            stage_flags: vk::ShaderStageFlags::FRAGMENT,
        }
    }

    #[test]
    fn test_layout_builder_records_bindings() {
        let builder = DescriptorSetLayoutBuilder::new()
            .add_binding(
                1,
                vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                vk::ShaderStageFlags::FRAGMENT,
                3,
            )
            .add_binding(
                0,
                vk::DescriptorType::UNIFORM_BUFFER,
                vk::ShaderStageFlags::VERTEX,
                1,
            );

        let bindings: Vec<_> = builder.bindings().collect();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].binding, 0);
        assert_eq!(bindings[1].binding, 1);
        assert_eq!(bindings[1].descriptor_count, 3);
        assert_eq!(bindings[1].stage_flags, vk::ShaderStageFlags::FRAGMENT);
    }

    #[test]
    #[should_panic(expected = "already in use")]
    fn test_layout_builder_rejects_duplicate_binding() {
        let _ = DescriptorSetLayoutBuilder::new()
            .add_binding(
                0,
                vk::DescriptorType::UNIFORM_BUFFER,
                vk::ShaderStageFlags::VERTEX,
                1,
            )
            .add_binding(
                0,
                vk::DescriptorType::UNIFORM_BUFFER,
                vk::ShaderStageFlags::VERTEX,
                1,
            );
    }

    #[test]
    fn test_pool_builder_defaults_and_sizes() {
        let builder = DescriptorPoolBuilder::new();
        assert_eq!(builder.max_sets(), 1000);
        assert!(builder.pool_sizes().is_empty());

        let builder = builder
            .set_max_sets(2)
            .add_pool_size(vk::DescriptorType::COMBINED_IMAGE_SAMPLER, 6);
        assert_eq!(builder.max_sets(), 2);
        assert_eq!(builder.pool_sizes().len(), 1);
        assert_eq!(builder.pool_sizes()[0].descriptor_count, 6);
    }

    #[test]
    fn test_check_write_accepts_matching_count() {
        check_write(Some(&sampler_array(3)), 0, 3);
    }

    #[test]
    #[should_panic(expected = "expects 3 descriptor(s)")]
    fn test_check_write_rejects_count_mismatch() {
        check_write(Some(&sampler_array(3)), 0, 2);
    }

    #[test]
    #[should_panic(expected = "does not contain binding 4")]
    fn test_check_write_rejects_missing_binding() {
        check_write(None, 4, 1);
    }
}
