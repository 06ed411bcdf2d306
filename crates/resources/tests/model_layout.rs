//! Sub-mesh layout of models assembled from procedural geometry.

use glam::Vec3;
use lumen_resources::ModelBuilder;
use lumen_resources::primitives::{CUBE_FACES, cube, cube_face};

#[test]
fn test_per_face_cube_matches_single_mesh_cube() {
    let mut builder = ModelBuilder::new();
    for normal in CUBE_FACES {
        builder.add_sub_mesh(cube_face(normal, Vec3::ONE), Vec3::ONE, None);
    }

    let whole = cube(Vec3::ONE);
    let sub_meshes = builder.sub_meshes();
    assert_eq!(sub_meshes.len(), 6);

    let total: u32 = sub_meshes.iter().map(|s| s.index_count).sum();
    assert_eq!(total as usize, whole.indices.len());

    for pair in sub_meshes.windows(2) {
        assert_eq!(pair[0].index_start + pair[0].index_count, pair[1].index_start);
    }
}

#[test]
fn test_untextured_faces_keep_their_color() {
    let mut builder = ModelBuilder::new();
    builder
        .add_sub_mesh(cube_face(Vec3::Y, Vec3::ONE), Vec3::new(0.8, 0.1, 0.1), None)
        .add_sub_mesh(cube_face(Vec3::NEG_Y, Vec3::ONE), Vec3::new(0.1, 0.8, 0.1), None);

    let colors: Vec<_> = builder.sub_meshes().iter().map(|s| s.diffuse_color).collect();
    assert_eq!(colors, vec![Vec3::new(0.8, 0.1, 0.1), Vec3::new(0.1, 0.8, 0.1)]);
    assert!(builder.sub_meshes().iter().all(|s| s.diffuse_texture_index.is_none()));
}
