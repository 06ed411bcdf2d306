//! Placement of scene objects.
//!
//! # Example
//!
//! ```
//! use glam::Vec3;
//! use lumen_scene::Transform;
//!
//! let t = Transform::new()
//!     .with_translation(Vec3::new(1.0, 0.0, 2.5))
//!     .with_scale(Vec3::splat(0.5));
//! let p = t.mat4().transform_point3(Vec3::new(2.0, 0.0, 0.0));
//! assert!((p - Vec3::new(2.0, 0.0, 2.5)).length() < 1e-5);
//! ```

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Translation, rotation and scale of one object.
///
/// `rotation` holds Tait-Bryan angles in radians applied in Y, X, Z order,
/// the same convention [`Camera::set_view_yxz`](crate::Camera::set_view_yxz)
/// uses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.rotation.y, self.rotation.x, self.rotation.z)
    }

    /// Model matrix: translate * Ry * Rx * Rz * scale.
    pub fn mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.translation)
    }

    /// Inverse transpose of [`Self::mat4`], used to transform normals under
    /// non-uniform scale.
    ///
    /// Returns the identity when the model matrix is singular (e.g. a zero
    /// scale axis) instead of propagating NaNs.
    pub fn normal_matrix(&self) -> Mat4 {
        const EPSILON: f32 = 1e-6;

        let model = self.mat4();
        if model.determinant().abs() < EPSILON {
            Mat4::IDENTITY
        } else {
            model.inverse().transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const EPSILON: f32 = 1e-5;

    fn approx_eq_vec3(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < EPSILON
    }

    #[test]
    fn test_transform_default() {
        let t = Transform::default();
        assert_eq!(t.translation, Vec3::ZERO);
        assert_eq!(t.rotation, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.mat4(), Mat4::IDENTITY);
    }

    #[test]
    fn test_mat4_applies_scale_then_translation() {
        let t = Transform::new()
            .with_translation(Vec3::new(0.0, 1.0, 0.0))
            .with_scale(Vec3::new(2.0, 3.0, 4.0));

        let p = t.mat4().transform_point3(Vec3::ONE);
        assert!(approx_eq_vec3(p, Vec3::new(2.0, 4.0, 4.0)));
    }

    #[test]
    fn test_rotation_about_y() {
        let t = Transform::new().with_rotation(Vec3::new(0.0, FRAC_PI_2, 0.0));
        let p = t.mat4().transform_point3(Vec3::X);
        assert!(approx_eq_vec3(p, Vec3::NEG_Z));
    }

    #[test]
    fn test_rotation_order_is_yxz() {
        let rotation = Vec3::new(0.3, 0.7, -0.2);
        let t = Transform::new().with_rotation(rotation);

        let expected = Mat4::from_rotation_y(rotation.y)
            * Mat4::from_rotation_x(rotation.x)
            * Mat4::from_rotation_z(rotation.z);
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert!(approx_eq_vec3(
            t.mat4().transform_point3(p),
            expected.transform_point3(p)
        ));
    }

    #[test]
    fn test_normal_matrix_identity() {
        assert_eq!(Transform::default().normal_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_normal_matrix_with_scale() {
        let t = Transform::new().with_scale(Vec3::new(1.0, 2.0, 1.0));
        assert_eq!(t.normal_matrix(), t.mat4().inverse().transpose());

        let n = t.normal_matrix().transform_vector3(Vec3::Y);
        assert!(approx_eq_vec3(n, Vec3::new(0.0, 0.5, 0.0)));
    }

    #[test]
    fn test_normal_matrix_non_invertible() {
        let t = Transform::new().with_scale(Vec3::new(1.0, 0.0, 1.0));
        let normal = t.normal_matrix();

        assert_eq!(normal, Mat4::IDENTITY);
        assert!(!normal.is_nan());
    }
}
