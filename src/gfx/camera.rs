//! Camera projection helpers.
//!
//! The scene's camera is a camera-to-world transform built by gameplay; this
//! module supplies the reversed-Z infinite perspective the deferred pipeline
//! renders with, plus the directional-light framing used by the shadow pass.

use glam::{Mat4, Vec3};

use crate::scene::Camera;

/// Reversed-Z infinite perspective: near plane maps to depth 1, infinity to
/// depth 0, so "greater" depth tests win and the sky sits at exactly 0.
pub fn perspective_infinite_reverse(fovy: f32, aspect: f32, znear: f32) -> Mat4 {
    Mat4::perspective_infinite_reverse_rh(fovy, aspect, znear)
}

pub fn view_proj(camera: &Camera, aspect: f32) -> Mat4 {
    perspective_infinite_reverse(camera.fovy, aspect, camera.znear) * camera.view()
}

/// How far in front of the camera the shadow box is centered, and how far
/// back along the light the depth camera sits.
const SUN_FOCUS_DISTANCE: f32 = 40.0;
const SUN_EYE_DISTANCE: f32 = 40.0;
const SUN_HALF_EXTENT: f32 = 35.0;

/// Orthographic view-projection framing a fixed-size box around a point in
/// front of the main camera, looking along the light direction.
pub fn sun_view_proj(camera: &Camera, light_direction: Vec3) -> Mat4 {
    let focus = camera
        .transform
        .transform_point3(Vec3::new(0.0, 0.0, -SUN_FOCUS_DISTANCE));
    let dir = light_direction.normalize_or_zero();
    let eye = focus - dir * SUN_EYE_DISTANCE;
    let view = Mat4::look_at_rh(eye, focus, Vec3::Y);
    let proj = Mat4::orthographic_rh(
        -SUN_HALF_EXTENT,
        SUN_HALF_EXTENT,
        -SUN_HALF_EXTENT,
        SUN_HALF_EXTENT,
        0.1,
        75.0,
    );
    proj * view
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn reversed_z_maps_near_to_one_and_far_to_zero() {
        let proj = perspective_infinite_reverse(60f32.to_radians(), 16.0 / 9.0, 0.1);
        let near = proj * Vec4::new(0.0, 0.0, -0.1, 1.0);
        assert!((near.z / near.w - 1.0).abs() < 1e-5);
        let far = proj * Vec4::new(0.0, 0.0, -1.0e6, 1.0);
        assert!((far.z / far.w).abs() < 1e-4);
    }

    #[test]
    fn sun_faces_the_focus_point() {
        let camera = Camera::default();
        let vp = sun_view_proj(&camera, Vec3::new(-1.0, -1.0, -1.0));
        let focus = camera.transform.transform_point3(Vec3::new(0.0, 0.0, -40.0));
        let clip = vp * focus.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        // The focus point projects near the center of the shadow frustum.
        assert!(ndc.x.abs() < 1e-3 && ndc.y.abs() < 1e-3);
    }
}
