//! GPU-free planning for the texture render system: which objects it
//! draws, how its texture array is laid out, and when it must be rebuilt.

use glam::Vec3;
use lumen_rhi::descriptor::{DescriptorPoolBuilder, DescriptorSetLayoutBuilder};
use lumen_rhi::swapchain::MAX_FRAMES_IN_FLIGHT;
use lumen_rhi::vk;
use lumen_scene::{Renderable, SceneObjectId, SceneObjectMap};

use crate::ubo::TexturePushConstants;

/// Binding of the texture array inside the system's descriptor set (set 1).
pub const TEXTURE_ARRAY_BINDING: u32 = 0;

/// Ids of the objects whose model owns at least one texture, in map order.
pub fn eligible_objects<M: Renderable>(objects: &SceneObjectMap<M>) -> Vec<SceneObjectId> {
    objects
        .iter()
        .filter(|object| object.is_textured())
        .map(|object| object.id())
        .collect()
}

/// Sum of the texture counts of `ids`. Ids missing from `objects` count as 0.
pub fn total_texture_count<M: Renderable>(objects: &SceneObjectMap<M>, ids: &[SceneObjectId]) -> usize {
    ids.iter()
        .filter_map(|id| objects.get(*id))
        .map(|object| object.texture_count())
        .sum()
}

/// One indexed draw of a sub-mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureDraw {
    pub object: SceneObjectId,
    pub index_start: u32,
    pub index_count: u32,
    /// Slot in the texture array, or [`TexturePushConstants::NO_TEXTURE`].
    pub texture_index: i32,
    pub diffuse_color: Vec3,
}

/// Lays out the draws of `ids` in order.
///
/// Each object's textures occupy a contiguous run of the texture array,
/// starting where the previous object's run ended. The run length is the
/// object's full texture count, whether or not every texture is referenced
/// by a sub-mesh.
pub fn plan_texture_draws<M: Renderable>(
    objects: &SceneObjectMap<M>,
    ids: &[SceneObjectId],
) -> Vec<TextureDraw> {
    let mut draws = Vec::new();
    let mut offset = 0usize;

    for &id in ids {
        let Some(object) = objects.get(id) else {
            continue;
        };
        let Some(model) = object.model.as_ref() else {
            continue;
        };

        for sub_mesh in model.sub_meshes() {
            let texture_index = match sub_mesh.diffuse_texture_index {
                Some(local) => (offset + local as usize) as i32,
                None => TexturePushConstants::NO_TEXTURE,
            };
            draws.push(TextureDraw {
                object: id,
                index_start: sub_mesh.index_start,
                index_count: sub_mesh.index_count,
                texture_index,
                diffuse_color: sub_mesh.diffuse_color,
            });
        }
        offset += model.texture_count();
    }

    draws
}

/// Shape of the descriptor pool and set layout for `texture_count`
/// combined image samplers.
///
/// With zero textures the pool gets no pool size and the layout no binding,
/// since Vulkan rejects zero-sized descriptor arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureBindingPlan {
    texture_count: u32,
}

impl TextureBindingPlan {
    pub fn for_count(texture_count: u32) -> Self {
        Self { texture_count }
    }

    #[inline]
    pub fn texture_count(&self) -> u32 {
        self.texture_count
    }

    #[inline]
    pub fn has_textures(&self) -> bool {
        self.texture_count != 0
    }

    /// One set per frame in flight, each with the full texture array.
    pub fn pool_builder(&self) -> DescriptorPoolBuilder {
        let builder = DescriptorPoolBuilder::new().set_max_sets(MAX_FRAMES_IN_FLIGHT as u32);
        if self.has_textures() {
            builder.add_pool_size(
                vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                MAX_FRAMES_IN_FLIGHT as u32 * self.texture_count,
            )
        } else {
            builder
        }
    }

    pub fn layout_builder(&self) -> DescriptorSetLayoutBuilder {
        let builder = DescriptorSetLayoutBuilder::new();
        if self.has_textures() {
            builder.add_binding(
                TEXTURE_ARRAY_BINDING,
                vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                vk::ShaderStageFlags::FRAGMENT,
                self.texture_count,
            )
        } else {
            builder
        }
    }
}

/// What the pipeline was last built for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextureShape {
    pub object_count: usize,
    pub texture_count: usize,
}

impl TextureShape {
    pub fn of<M: Renderable>(objects: &SceneObjectMap<M>, ids: &[SceneObjectId]) -> Self {
        Self {
            object_count: ids.len(),
            texture_count: total_texture_count(objects, ids),
        }
    }
}

/// Remembers the shape the texture resources were built for.
#[derive(Debug, Default)]
pub struct RebuildTracker {
    built: Option<TextureShape>,
}

impl RebuildTracker {
    /// A tracker that knows resources were already built for `shape`.
    pub fn built_for(shape: TextureShape) -> Self {
        Self { built: Some(shape) }
    }

    /// Whether resources built for the last recorded shape no longer fit
    /// `shape`. Always true before anything was built.
    pub fn needs_rebuild(&self, shape: TextureShape) -> bool {
        self.built != Some(shape)
    }

    pub fn mark_built(&mut self, shape: TextureShape) {
        self.built = Some(shape);
    }

    #[inline]
    pub fn current(&self) -> Option<TextureShape> {
        self.built
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_scene::{SubMeshInfo, Transform};
    use std::sync::Arc;

    struct FakeModel {
        textures: usize,
        sub_meshes: Vec<SubMeshInfo>,
    }

    impl Renderable for FakeModel {
        fn texture_count(&self) -> usize {
            self.textures
        }

        fn sub_meshes(&self) -> &[SubMeshInfo] {
            &self.sub_meshes
        }
    }

    fn sub_mesh(index_start: u32, texture: Option<u32>) -> SubMeshInfo {
        SubMeshInfo {
            index_start,
            index_count: 6,
            diffuse_color: Vec3::ONE,
            diffuse_texture_index: texture,
        }
    }

    fn model(textures: usize, sub_meshes: Vec<SubMeshInfo>) -> Option<Arc<FakeModel>> {
        Some(Arc::new(FakeModel { textures, sub_meshes }))
    }

    #[test]
    fn test_eligible_objects_skips_untextured_and_empty() {
        let mut objects = SceneObjectMap::new();
        let textured = objects.spawn(Transform::default(), Vec3::ONE, model(1, vec![sub_mesh(0, Some(0))]));
        objects.spawn(Transform::default(), Vec3::ONE, model(0, vec![sub_mesh(0, None)]));
        objects.spawn(Transform::default(), Vec3::ONE, None);

        assert_eq!(eligible_objects(&objects), vec![textured]);
    }

    #[test]
    fn test_unreferenced_textures_still_advance_offset() {
        let mut objects = SceneObjectMap::new();
        let a = objects.spawn(Transform::default(), Vec3::ONE, model(3, vec![sub_mesh(0, Some(0))]));
        let b = objects.spawn(Transform::default(), Vec3::ONE, model(1, vec![sub_mesh(0, Some(0))]));

        let draws = plan_texture_draws(&objects, &[a, b]);
        assert_eq!(draws[0].texture_index, 0);
        assert_eq!(draws[1].texture_index, 3);
    }

    #[test]
    fn test_sub_mesh_without_texture_uses_sentinel() {
        let mut objects = SceneObjectMap::new();
        let a = objects.spawn(
            Transform::default(),
            Vec3::ONE,
            model(2, vec![sub_mesh(0, Some(1)), sub_mesh(6, None)]),
        );

        let draws = plan_texture_draws(&objects, &[a]);
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].texture_index, 1);
        assert_eq!(draws[1].texture_index, TexturePushConstants::NO_TEXTURE);
        assert_eq!(draws[1].index_start, 6);
    }

    #[test]
    fn test_binding_plan_with_textures() {
        let plan = TextureBindingPlan::for_count(3);

        let pool = plan.pool_builder();
        assert_eq!(pool.max_sets(), MAX_FRAMES_IN_FLIGHT as u32);
        assert_eq!(pool.pool_sizes().len(), 1);
        assert_eq!(pool.pool_sizes()[0].ty, vk::DescriptorType::COMBINED_IMAGE_SAMPLER);
        assert_eq!(pool.pool_sizes()[0].descriptor_count, MAX_FRAMES_IN_FLIGHT as u32 * 3);

        let layout = plan.layout_builder();
        let bindings: Vec<_> = layout.bindings().collect();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].binding, TEXTURE_ARRAY_BINDING);
        assert_eq!(bindings[0].descriptor_count, 3);
        assert_eq!(bindings[0].stage_flags, vk::ShaderStageFlags::FRAGMENT);
    }

    #[test]
    fn test_binding_plan_without_textures_is_empty() {
        let plan = TextureBindingPlan::for_count(0);
        assert!(!plan.has_textures());
        assert!(plan.pool_builder().pool_sizes().is_empty());
        assert_eq!(plan.pool_builder().max_sets(), MAX_FRAMES_IN_FLIGHT as u32);
        assert_eq!(plan.layout_builder().bindings().count(), 0);
    }

    #[test]
    fn test_tracker_reports_changes_only() {
        let mut tracker = RebuildTracker::built_for(TextureShape::default());
        let shape = TextureShape {
            object_count: 1,
            texture_count: 2,
        };

        assert!(!tracker.needs_rebuild(TextureShape::default()));
        assert!(tracker.needs_rebuild(shape));
        tracker.mark_built(shape);
        assert!(!tracker.needs_rebuild(shape));
        assert_eq!(tracker.current(), Some(shape));
    }

    #[test]
    fn test_tracker_sees_texture_count_change_with_same_object_count() {
        let tracker = RebuildTracker::built_for(TextureShape {
            object_count: 1,
            texture_count: 1,
        });
        assert!(tracker.needs_rebuild(TextureShape {
            object_count: 1,
            texture_count: 4,
        }));
    }

    #[test]
    fn test_fresh_tracker_always_rebuilds() {
        let tracker = RebuildTracker::default();
        assert!(tracker.needs_rebuild(TextureShape::default()));
        assert_eq!(tracker.current(), None);
    }
}
