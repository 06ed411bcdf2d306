//! Procedural geometry for demo scenes and tests.

use glam::{Vec2, Vec3};
use lumen_rhi::vertex::Vertex;

/// Vertices plus triangle-list indices into them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// Faces of the unit cube, in the order [`cube_face`] accepts them.
pub const CUBE_FACES: [Vec3; 6] = [
    Vec3::NEG_X,
    Vec3::X,
    Vec3::NEG_Y,
    Vec3::Y,
    Vec3::NEG_Z,
    Vec3::Z,
];

/// One face of a cube spanning `[-0.5, 0.5]` on every axis, facing `normal`.
///
/// `normal` must be one of [`CUBE_FACES`].
pub fn cube_face(normal: Vec3, color: Vec3) -> MeshData {
    // u x v == normal, so both triangles wind around the outward normal.
    let (u, v) = face_axes(normal);
    let center = normal * 0.5;

    let corners = [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)];
    let vertices = corners
        .iter()
        .map(|&(a, b)| {
            Vertex::new(
                center + u * a + v * b,
                color,
                normal,
                Vec2::new(a + 0.5, b + 0.5),
            )
        })
        .collect();

    MeshData {
        vertices,
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

fn face_axes(normal: Vec3) -> (Vec3, Vec3) {
    let u = if normal.x.abs() > 0.5 { Vec3::Z } else { Vec3::X };
    (u, normal.cross(u))
}

/// Flat quad in the XZ plane facing `-Y` (up in the default camera).
pub fn quad(size: f32, color: Vec3) -> MeshData {
    let h = size * 0.5;
    let normal = Vec3::NEG_Y;
    let vertices = vec![
        Vertex::new(Vec3::new(-h, 0.0, -h), color, normal, Vec2::new(0.0, 0.0)),
        Vertex::new(Vec3::new(h, 0.0, -h), color, normal, Vec2::new(1.0, 0.0)),
        Vertex::new(Vec3::new(h, 0.0, h), color, normal, Vec2::new(1.0, 1.0)),
        Vertex::new(Vec3::new(-h, 0.0, h), color, normal, Vec2::new(0.0, 1.0)),
    ];

    MeshData {
        vertices,
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

/// Solid unit cube as a single mesh.
pub fn cube(color: Vec3) -> MeshData {
    let mut mesh = MeshData::default();
    for normal in CUBE_FACES {
        let face = cube_face(normal, color);
        let base = mesh.vertices.len() as u32;
        mesh.vertices.extend(face.vertices);
        mesh.indices.extend(face.indices.iter().map(|i| i + base));
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_normal(mesh: &MeshData, first: usize) -> Vec3 {
        let p = |i: usize| mesh.vertices[mesh.indices[first + i] as usize].position;
        (p(1) - p(0)).cross(p(2) - p(0)).normalize()
    }

    #[test]
    fn test_cube_counts() {
        let mesh = cube(Vec3::ONE);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn test_cube_faces_wind_outward() {
        for normal in CUBE_FACES {
            let face = cube_face(normal, Vec3::ONE);
            assert!(triangle_normal(&face, 0).abs_diff_eq(normal, 1e-5), "face {normal}");
            assert!(triangle_normal(&face, 3).abs_diff_eq(normal, 1e-5), "face {normal}");
        }
    }

    #[test]
    fn test_cube_face_lies_on_boundary() {
        let face = cube_face(Vec3::Y, Vec3::ONE);
        assert!(face.vertices.iter().all(|v| (v.position.y - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_quad_uvs_cover_unit_square() {
        let mesh = quad(2.0, Vec3::ONE);
        let min = mesh.vertices.iter().fold(Vec2::splat(1.0), |m, v| m.min(v.uv));
        let max = mesh.vertices.iter().fold(Vec2::ZERO, |m, v| m.max(v.uv));
        assert_eq!(min, Vec2::ZERO);
        assert_eq!(max, Vec2::ONE);
        assert!(mesh.vertices.iter().all(|v| v.position.x.abs() == 1.0));
    }
}
