//! Texture system planning across frames, driven without a GPU.

use std::sync::Arc;

use glam::Vec3;
use lumen_renderer::TexturePushConstants;
use lumen_renderer::systems::{
    FragmentShaderGenerator, FragmentShaderTemplate, RebuildTracker, SAMPLER_ARRAY_DECLARATION,
    TEXTURES_DEFINE, TextureBindingPlan, TextureShape, eligible_objects, plan_texture_draws,
};
use lumen_scene::{Renderable, SceneObjectMap, SubMeshInfo, Transform};

const TEMPLATE: &str = include_str!("../../../shaders/texture_shader.frag");

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

fn textured(textures: usize) -> Option<Arc<FakeModel>> {
    Some(Arc::new(FakeModel {
        textures,
        sub_meshes: vec![SubMeshInfo {
            index_start: 0,
            index_count: 36,
            diffuse_color: Vec3::ONE,
            diffuse_texture_index: Some(0),
        }],
    }))
}

/// Mirrors the rebuild decision the texture render system makes each frame.
struct Frames {
    tracker: RebuildTracker,
    generator: FragmentShaderGenerator,
    rebuilds: Vec<(TextureBindingPlan, String)>,
}

impl Frames {
    fn start(objects: &SceneObjectMap<FakeModel>) -> Self {
        let ids = eligible_objects(objects);
        let shape = TextureShape::of(objects, &ids);
        let mut generator = FragmentShaderGenerator::new(FragmentShaderTemplate::parse(TEMPLATE).unwrap());
        generator.generate(shape.texture_count as u32);
        Self {
            tracker: RebuildTracker::built_for(shape),
            generator,
            rebuilds: Vec::new(),
        }
    }

    fn render(&mut self, objects: &SceneObjectMap<FakeModel>) {
        let ids = eligible_objects(objects);
        let shape = TextureShape::of(objects, &ids);
        if self.tracker.needs_rebuild(shape) {
            let count = shape.texture_count as u32;
            let source = self.generator.generate(count);
            self.rebuilds.push((TextureBindingPlan::for_count(count), source));
            self.tracker.mark_built(shape);
        }
    }
}

#[test]
fn test_texture_offsets_accumulate_in_object_order() {
    let mut objects = SceneObjectMap::new();
    let a = objects.spawn(Transform::default(), Vec3::ONE, textured(2));
    let b = objects.spawn(Transform::default(), Vec3::ONE, textured(1));

    let ids = eligible_objects(&objects);
    assert_eq!(ids, vec![a, b]);

    let draws = plan_texture_draws(&objects, &ids);
    assert_eq!(draws.len(), 2);
    assert_eq!((draws[0].object, draws[0].texture_index), (a, 0));
    assert_eq!((draws[1].object, draws[1].texture_index), (b, 2));
}

#[test]
fn test_untextured_sub_mesh_gets_sentinel_index() {
    let mut objects = SceneObjectMap::new();
    let model = Arc::new(FakeModel {
        textures: 1,
        sub_meshes: vec![
            SubMeshInfo {
                index_start: 0,
                index_count: 6,
                diffuse_color: Vec3::ONE,
                diffuse_texture_index: Some(0),
            },
            SubMeshInfo {
                index_start: 6,
                index_count: 6,
                diffuse_color: Vec3::new(0.2, 0.4, 0.6),
                diffuse_texture_index: None,
            },
        ],
    });
    objects.spawn(Transform::default(), Vec3::ONE, Some(model));

    let draws = plan_texture_draws(&objects, &eligible_objects(&objects));
    assert_eq!(draws[1].texture_index, TexturePushConstants::NO_TEXTURE);
    assert_eq!(draws[1].texture_index, -1);
    assert_eq!(draws[1].diffuse_color, Vec3::new(0.2, 0.4, 0.6));
}

#[test]
fn test_empty_scene_has_no_texture_binding() {
    let objects: SceneObjectMap<FakeModel> = SceneObjectMap::new();
    let ids = eligible_objects(&objects);
    let shape = TextureShape::of(&objects, &ids);
    assert_eq!(shape.texture_count, 0);

    let plan = TextureBindingPlan::for_count(shape.texture_count as u32);
    assert!(plan.pool_builder().pool_sizes().is_empty());
    assert_eq!(plan.layout_builder().bindings().count(), 0);
}

#[test]
fn test_adding_textured_object_rebuilds_once() {
    let mut objects = SceneObjectMap::new();
    objects.spawn(Transform::default(), Vec3::ONE, None);
    let mut frames = Frames::start(&objects);

    frames.render(&objects);
    assert!(frames.rebuilds.is_empty());

    objects.spawn(Transform::default(), Vec3::ONE, textured(3));
    frames.render(&objects);
    frames.render(&objects);
    frames.render(&objects);

    assert_eq!(frames.rebuilds.len(), 1);
    let (plan, source) = &frames.rebuilds[0];
    assert_eq!(plan.texture_count(), 3);
    assert_eq!(plan.layout_builder().bindings().next().map(|b| b.descriptor_count), Some(3));
    assert!(source.contains("#define TEXTURES_COUNT 3\n"));
    assert!(source.contains(SAMPLER_ARRAY_DECLARATION));
}

#[test]
fn test_growing_texture_count_never_duplicates_declarations() {
    let mut objects = SceneObjectMap::new();
    let mut frames = Frames::start(&objects);

    objects.spawn(Transform::default(), Vec3::ONE, textured(3));
    frames.render(&objects);
    objects.spawn(Transform::default(), Vec3::ONE, textured(2));
    frames.render(&objects);

    assert_eq!(frames.rebuilds.len(), 2);
    let (_, source) = &frames.rebuilds[1];
    assert!(source.contains("#define TEXTURES_COUNT 5\n"));
    assert_eq!(source.lines().filter(|l| l.trim() == TEXTURES_DEFINE).count(), 1);
    assert_eq!(
        source.lines().filter(|l| l.trim() == SAMPLER_ARRAY_DECLARATION).count(),
        1
    );
}

#[test]
fn test_removing_last_textured_object_drops_sampler_array() {
    let mut objects = SceneObjectMap::new();
    let id = objects.spawn(Transform::default(), Vec3::ONE, textured(2));
    let mut frames = Frames::start(&objects);

    objects.remove(id);
    frames.render(&objects);

    let (plan, source) = &frames.rebuilds[0];
    assert!(!plan.has_textures());
    assert!(source.contains("#define TEXTURES_COUNT 0\n"));
    assert!(!source.contains(SAMPLER_ARRAY_DECLARATION));
}
