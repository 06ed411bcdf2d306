//! Scene objects keyed by id, and the view of a model that render systems
//! need to draw it.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::sync::Arc;

use glam::Vec3;

use crate::transform::Transform;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SceneObjectId(pub u32);

/// One indexed draw range of a model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubMeshInfo {
    pub index_start: u32,
    pub index_count: u32,
    /// Used when the sub-mesh has no texture, or as a tint.
    pub diffuse_color: Vec3,
    /// Index into the owning model's texture list.
    pub diffuse_texture_index: Option<u32>,
}

/// Geometry as seen by the render systems.
pub trait Renderable {
    /// Number of textures the model owns. Every one of them gets a slot in
    /// the texture array, referenced or not.
    fn texture_count(&self) -> usize;

    fn sub_meshes(&self) -> &[SubMeshInfo];
}

pub struct SceneObject<M> {
    id: SceneObjectId,
    pub transform: Transform,
    pub color: Vec3,
    pub model: Option<Arc<M>>,
}

impl<M> SceneObject<M> {
    #[inline]
    pub fn id(&self) -> SceneObjectId {
        self.id
    }
}

impl<M: Renderable> SceneObject<M> {
    /// True if the object has a model with at least one texture.
    pub fn is_textured(&self) -> bool {
        self.model
            .as_ref()
            .is_some_and(|model| model.texture_count() > 0)
    }

    /// Texture count of the model, zero without one.
    pub fn texture_count(&self) -> usize {
        self.model.as_ref().map_or(0, |model| model.texture_count())
    }
}

/// All objects of a scene, iterated in ascending id order.
pub struct SceneObjectMap<M> {
    objects: BTreeMap<SceneObjectId, SceneObject<M>>,
    next_id: u32,
}

impl<M> Default for SceneObjectMap<M> {
    fn default() -> Self {
        Self {
            objects: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<M> SceneObjectMap<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object and returns its freshly assigned id. Ids are never
    /// reused.
    pub fn spawn(&mut self, transform: Transform, color: Vec3, model: Option<Arc<M>>) -> SceneObjectId {
        let id = SceneObjectId(self.next_id);
        self.next_id += 1;
        self.objects.insert(
            id,
            SceneObject {
                id,
                transform,
                color,
                model,
            },
        );
        id
    }

    pub fn remove(&mut self, id: SceneObjectId) -> Option<SceneObject<M>> {
        self.objects.remove(&id)
    }

    pub fn get(&self, id: SceneObjectId) -> Option<&SceneObject<M>> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: SceneObjectId) -> Option<&mut SceneObject<M>> {
        self.objects.get_mut(&id)
    }

    pub fn iter(&self) -> btree_map::Values<'_, SceneObjectId, SceneObject<M>> {
        self.objects.values()
    }

    pub fn iter_mut(&mut self) -> btree_map::ValuesMut<'_, SceneObjectId, SceneObject<M>> {
        self.objects.values_mut()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl<'a, M> IntoIterator for &'a SceneObjectMap<M> {
    type Item = &'a SceneObject<M>;
    type IntoIter = btree_map::Values<'a, SceneObjectId, SceneObject<M>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeModel {
        textures: usize,
    }

    impl Renderable for FakeModel {
        fn texture_count(&self) -> usize {
            self.textures
        }

        fn sub_meshes(&self) -> &[SubMeshInfo] {
            &[]
        }
    }

    #[test]
    fn test_spawn_assigns_increasing_ids() {
        let mut scene: SceneObjectMap<FakeModel> = SceneObjectMap::new();
        let a = scene.spawn(Transform::new(), Vec3::ONE, None);
        let b = scene.spawn(Transform::new(), Vec3::ONE, None);

        assert_eq!(a, SceneObjectId(0));
        assert_eq!(b, SceneObjectId(1));
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn test_ids_are_not_reused_after_remove() {
        let mut scene: SceneObjectMap<FakeModel> = SceneObjectMap::new();
        let a = scene.spawn(Transform::new(), Vec3::ONE, None);
        assert!(scene.remove(a).is_some());
        assert!(scene.is_empty());

        let b = scene.spawn(Transform::new(), Vec3::ONE, None);
        assert_ne!(a, b);
        assert!(scene.get(a).is_none());
    }

    #[test]
    fn test_iteration_is_in_id_order() {
        let mut scene: SceneObjectMap<FakeModel> = SceneObjectMap::new();
        let ids: Vec<_> = (0..5)
            .map(|_| scene.spawn(Transform::new(), Vec3::ONE, None))
            .collect();
        scene.remove(ids[2]);

        let seen: Vec<_> = scene.iter().map(|object| object.id()).collect();
        assert_eq!(seen, vec![ids[0], ids[1], ids[3], ids[4]]);
    }

    #[test]
    fn test_is_textured() {
        let mut scene = SceneObjectMap::new();
        let bare = scene.spawn(Transform::new(), Vec3::ONE, None);
        let untextured = scene.spawn(
            Transform::new(),
            Vec3::ONE,
            Some(Arc::new(FakeModel { textures: 0 })),
        );
        let textured = scene.spawn(
            Transform::new(),
            Vec3::ONE,
            Some(Arc::new(FakeModel { textures: 2 })),
        );

        assert!(!scene.get(bare).is_some_and(|o| o.is_textured()));
        assert!(!scene.get(untextured).is_some_and(|o| o.is_textured()));
        assert!(scene.get(textured).is_some_and(|o| o.is_textured()));
        assert_eq!(scene.get(textured).map(|o| o.texture_count()), Some(2));
    }
}
