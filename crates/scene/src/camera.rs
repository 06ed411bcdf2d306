//! View and projection matrices.
//!
//! Clip space follows Vulkan: depth in `[0, 1]`, and with the default up
//! vector of `-Y` world space "up" lands at the top of the screen.

use glam::{Mat4, Vec3, Vec4};

/// Up vector used by the demo scenes.
pub const DEFAULT_UP: Vec3 = Vec3::NEG_Y;

#[derive(Clone, Debug)]
pub struct Camera {
    projection: Mat4,
    view: Mat4,
    inverse_view: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            inverse_view: Mat4::IDENTITY,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_orthographic_projection(
        &mut self,
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
        near: f32,
        far: f32,
    ) {
        self.projection = Mat4::from_cols(
            Vec4::new(2.0 / (right - left), 0.0, 0.0, 0.0),
            Vec4::new(0.0, 2.0 / (bottom - top), 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0 / (far - near), 0.0),
            Vec4::new(
                -(right + left) / (right - left),
                -(bottom + top) / (bottom - top),
                -near / (far - near),
                1.0,
            ),
        );
    }

    /// # Panics
    ///
    /// If `aspect` is zero.
    pub fn set_perspective_projection(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) {
        assert!(
            aspect.abs() > f32::EPSILON,
            "perspective projection needs a non-zero aspect ratio"
        );

        let tan_half_fov_y = (fov_y / 2.0).tan();
        self.projection = Mat4::from_cols(
            Vec4::new(1.0 / (aspect * tan_half_fov_y), 0.0, 0.0, 0.0),
            Vec4::new(0.0, 1.0 / tan_half_fov_y, 0.0, 0.0),
            Vec4::new(0.0, 0.0, far / (far - near), 1.0),
            Vec4::new(0.0, 0.0, -(far * near) / (far - near), 0.0),
        );
    }

    /// Looks from `position` along `direction`.
    pub fn set_view_direction(&mut self, position: Vec3, direction: Vec3, up: Vec3) {
        let w = direction.normalize();
        let u = w.cross(up).normalize();
        let v = w.cross(u);
        self.set_view_basis(position, u, v, w);
    }

    pub fn set_view_target(&mut self, position: Vec3, target: Vec3, up: Vec3) {
        self.set_view_direction(position, target - position, up);
    }

    /// Orients the camera with Y-X-Z euler angles, matching
    /// [`Transform`](crate::Transform) rotations.
    pub fn set_view_yxz(&mut self, position: Vec3, rotation: Vec3) {
        let (s3, c3) = rotation.z.sin_cos();
        let (s2, c2) = rotation.x.sin_cos();
        let (s1, c1) = rotation.y.sin_cos();

        let u = Vec3::new(c1 * c3 + s1 * s2 * s3, c2 * s3, c1 * s2 * s3 - c3 * s1);
        let v = Vec3::new(c3 * s1 * s2 - c1 * s3, c2 * c3, c1 * c3 * s2 + s1 * s3);
        let w = Vec3::new(c2 * s1, -s2, c1 * c2);
        self.set_view_basis(position, u, v, w);
    }

    fn set_view_basis(&mut self, position: Vec3, u: Vec3, v: Vec3, w: Vec3) {
        self.view = Mat4::from_cols(
            Vec4::new(u.x, v.x, w.x, 0.0),
            Vec4::new(u.y, v.y, w.y, 0.0),
            Vec4::new(u.z, v.z, w.z, 0.0),
            Vec4::new(-u.dot(position), -v.dot(position), -w.dot(position), 1.0),
        );
        self.inverse_view = Mat4::from_cols(
            u.extend(0.0),
            v.extend(0.0),
            w.extend(0.0),
            position.extend(1.0),
        );
    }

    #[inline]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        self.view
    }

    #[inline]
    pub fn inverse_view(&self) -> Mat4 {
        self.inverse_view
    }

    /// World-space camera position.
    pub fn position(&self) -> Vec3 {
        self.inverse_view.w_axis.truncate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn approx_eq_mat4(a: Mat4, b: Mat4) -> bool {
        a.abs_diff_eq(b, EPSILON)
    }

    #[test]
    fn test_perspective_depth_range() {
        let mut camera = Camera::new();
        camera.set_perspective_projection(50f32.to_radians(), 1.5, 0.1, 100.0);

        let near = camera.projection().project_point3(Vec3::new(0.0, 0.0, 0.1));
        let far = camera.projection().project_point3(Vec3::new(0.0, 0.0, 100.0));
        assert!(near.z.abs() < EPSILON);
        assert!((far.z - 1.0).abs() < EPSILON);
    }

    #[test]
    #[should_panic(expected = "non-zero aspect ratio")]
    fn test_perspective_rejects_zero_aspect() {
        Camera::new().set_perspective_projection(1.0, 0.0, 0.1, 10.0);
    }

    #[test]
    fn test_orthographic_maps_box_to_clip_space() {
        let mut camera = Camera::new();
        camera.set_orthographic_projection(-2.0, 2.0, -1.0, 1.0, 0.0, 10.0);

        let corner = camera.projection().project_point3(Vec3::new(2.0, 1.0, 10.0));
        assert!(corner.abs_diff_eq(Vec3::new(1.0, 1.0, 1.0), EPSILON));
        let origin = camera.projection().project_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::ZERO, EPSILON));
    }

    #[test]
    fn test_view_direction_inverse() {
        let mut camera = Camera::new();
        camera.set_view_direction(Vec3::new(1.0, -2.0, 3.0), Vec3::new(0.5, 0.2, 1.0), DEFAULT_UP);

        assert!(approx_eq_mat4(
            camera.view() * camera.inverse_view(),
            Mat4::IDENTITY
        ));
        assert!(camera.position().abs_diff_eq(Vec3::new(1.0, -2.0, 3.0), EPSILON));
    }

    #[test]
    fn test_view_target_looks_down_positive_z() {
        let mut camera = Camera::new();
        camera.set_view_target(Vec3::new(0.0, 0.0, -5.0), Vec3::ZERO, DEFAULT_UP);

        let target_in_view = camera.view().transform_point3(Vec3::ZERO);
        assert!(target_in_view.abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), EPSILON));
    }

    #[test]
    fn test_view_yxz_without_rotation_is_translation() {
        let mut camera = Camera::new();
        let position = Vec3::new(2.0, 0.5, -4.0);
        camera.set_view_yxz(position, Vec3::ZERO);

        assert!(approx_eq_mat4(
            camera.view(),
            Mat4::from_translation(-position)
        ));
    }

    #[test]
    fn test_view_yxz_inverse() {
        let mut camera = Camera::new();
        camera.set_view_yxz(Vec3::new(0.0, -1.0, -2.5), Vec3::new(0.4, -1.1, 0.3));

        assert!(approx_eq_mat4(
            camera.view() * camera.inverse_view(),
            Mat4::IDENTITY
        ));
    }
}
