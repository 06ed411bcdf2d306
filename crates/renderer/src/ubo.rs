//! Shader-visible data layouts.
//!
//! These structures must match the GLSL declarations in `shaders/` exactly.
//! All of them are `#[repr(C)]` and `Pod` so they can be written into
//! buffers and push-constant ranges as raw bytes.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

/// Per-frame uniform data, set 0 binding 0 in every pipeline.
///
/// # Memory Layout (std140)
///
/// | Offset | Size | Field |
/// |--------|------|-------|
/// | 0      | 64   | projection |
/// | 64     | 64   | view |
/// | 128    | 64   | inverse_view |
/// | 192    | 16   | ambient_light_color (rgb, w = intensity) |
/// | 208    | 16   | light_direction (xyz, w unused) |
///
/// Total size: 224 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GlobalUbo {
    pub projection: Mat4,
    pub view: Mat4,
    pub inverse_view: Mat4,
    pub ambient_light_color: Vec4,
    pub light_direction: Vec4,
}

impl Default for GlobalUbo {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            inverse_view: Mat4::IDENTITY,
            ambient_light_color: Vec4::new(1.0, 1.0, 1.0, 0.02),
            light_direction: Vec3::new(1.0, -3.0, -1.0).normalize().extend(0.0),
        }
    }
}

impl GlobalUbo {
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// Push constants of the untextured pipeline.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct SimplePushConstants {
    pub model_matrix: Mat4,
    pub normal_matrix: Mat4,
}

impl SimplePushConstants {
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// Push constants of the textured pipeline.
///
/// Exactly 128 bytes, the minimum push-constant size every device supports.
/// The normal matrix is a GLSL `mat3`, whose columns are padded to 16 bytes.
///
/// | Offset | Size | Field |
/// |--------|------|-------|
/// | 0      | 64   | model_matrix |
/// | 64     | 48   | normal_matrix (3 padded columns) |
/// | 112    | 12   | diffuse_color |
/// | 124    | 4    | texture_index (-1 = untextured) |
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TexturePushConstants {
    pub model_matrix: Mat4,
    pub normal_matrix: [Vec4; 3],
    pub diffuse_color: Vec3,
    pub texture_index: i32,
}

impl TexturePushConstants {
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Sentinel for sub-meshes that sample no texture.
    pub const NO_TEXTURE: i32 = -1;

    pub fn new(model_matrix: Mat4, normal_matrix: Mat4, diffuse_color: Vec3, texture_index: i32) -> Self {
        Self {
            model_matrix,
            normal_matrix: [
                normal_matrix.x_axis.truncate().extend(0.0),
                normal_matrix.y_axis.truncate().extend(0.0),
                normal_matrix.z_axis.truncate().extend(0.0),
            ],
            diffuse_color,
            texture_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, offset_of};

    #[test]
    fn test_global_ubo_layout() {
        assert_eq!(GlobalUbo::SIZE, 224);
        assert_eq!(align_of::<GlobalUbo>(), 16);
        assert_eq!(offset_of!(GlobalUbo, ambient_light_color), 192);
        assert_eq!(offset_of!(GlobalUbo, light_direction), 208);
    }

    #[test]
    fn test_simple_push_constants_size() {
        assert_eq!(SimplePushConstants::SIZE, 128);
    }

    #[test]
    fn test_texture_push_constants_layout() {
        assert_eq!(TexturePushConstants::SIZE, 128);
        assert_eq!(offset_of!(TexturePushConstants, normal_matrix), 64);
        assert_eq!(offset_of!(TexturePushConstants, diffuse_color), 112);
        assert_eq!(offset_of!(TexturePushConstants, texture_index), 124);
    }

    #[test]
    fn test_texture_push_constants_drop_translation_row() {
        let normal = Mat4::from_cols(
            Vec4::new(1.0, 2.0, 3.0, 9.0),
            Vec4::new(4.0, 5.0, 6.0, 9.0),
            Vec4::new(7.0, 8.0, 9.0, 9.0),
            Vec4::new(9.0, 9.0, 9.0, 9.0),
        );
        let push = TexturePushConstants::new(Mat4::IDENTITY, normal, Vec3::ONE, 4);

        assert_eq!(push.normal_matrix[0], Vec4::new(1.0, 2.0, 3.0, 0.0));
        assert_eq!(push.normal_matrix[2], Vec4::new(7.0, 8.0, 9.0, 0.0));
        assert_eq!(push.texture_index, 4);
    }

    #[test]
    fn test_default_light_direction_is_normalized() {
        let ubo = GlobalUbo::default();
        assert!((ubo.light_direction.truncate().length() - 1.0).abs() < 1e-6);
    }
}
