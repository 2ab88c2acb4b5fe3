//! Small helpers used across the renderer, with CPU references for the
//! shader-side math so it stays testable.

use glam::{Mat4, Vec2, Vec3};

/// Clamp `width`/`height` to `max_dim` while preserving aspect ratio.
pub fn scale_to_max((w0, h0): (u32, u32), max_dim: u32) -> (u32, u32) {
    let (mut w, mut h) = (w0.max(1), h0.max(1));
    if w > max_dim || h > max_dim {
        let scale = (w as f32 / max_dim as f32).max(h as f32 / max_dim as f32);
        w = ((w as f32 / scale).floor() as u32).clamp(1, max_dim);
        h = ((h as f32 / scale).floor() as u32).clamp(1, max_dim);
    }
    (w, h)
}

/// Base-`base` Halton radical inverse.
fn radical_inverse(mut index: u32, base: u32) -> f32 {
    let inv = 1.0 / base as f32;
    let mut fraction = inv;
    let mut result = 0.0;
    while index > 0 {
        result += (index % base) as f32 * fraction;
        index /= base;
        fraction *= inv;
    }
    result
}

/// Sub-pixel TAA jitter for `frame_id`, in NDC units: the Halton(2,3) point
/// is centered on zero and scaled to one pixel of the target.
pub fn taa_jitter(frame_id: u64, width: u32, height: u32) -> Vec2 {
    const SEQUENCE_LENGTH: u64 = 16;
    let i = (frame_id % SEQUENCE_LENGTH) as u32 + 1;
    let halton = Vec2::new(radical_inverse(i, 2), radical_inverse(i, 3));
    (halton - Vec2::splat(0.5))
        * Vec2::new(2.0 / width.max(1) as f32, 2.0 / height.max(1) as f32)
}

/// CPU reference for the G-buffer motion vector: the UV-space offset that
/// moves a fragment back to where it was last frame (`uv + motion` lands on
/// the previous position). Mirrors the shader exactly.
pub fn motion_vector(curr_clip: glam::Vec4, prev_clip: glam::Vec4) -> Vec2 {
    let curr_ndc = curr_clip.truncate() / curr_clip.w.max(1e-6);
    let prev_ndc = prev_clip.truncate() / prev_clip.w.max(1e-6);
    let curr_uv = Vec2::new(curr_ndc.x * 0.5 + 0.5, curr_ndc.y * -0.5 + 0.5);
    let prev_uv = Vec2::new(prev_ndc.x * 0.5 + 0.5, prev_ndc.y * -0.5 + 0.5);
    prev_uv - curr_uv
}

/// Rec.709 luma.
pub fn luma_rec709(c: Vec3) -> f32 {
    0.2126 * c.x + 0.7152 * c.y + 0.0722 * c.z
}

/// Luma-weight a color for the TAA neighborhood clamp (suppresses fireflies
/// dominating the min/max box).
pub fn luma_weight(c: Vec3) -> Vec3 {
    c / (1.0 + luma_rec709(c))
}

pub fn inverse_luma_weight(c: Vec3) -> Vec3 {
    c / (1.0 - luma_rec709(c))
}

/// CPU reference for reprojecting a pixel into the previous frame's UV space
/// from its depth and the two view-projections; used in tests to validate
/// the shader-side reprojection math.
pub fn reproject_uv(curr_uv: Vec2, depth: f32, inv_view_proj: Mat4, prev_view_proj: Mat4) -> Vec2 {
    let ndc = Vec2::new(curr_uv.x * 2.0 - 1.0, (1.0 - curr_uv.y) * 2.0 - 1.0);
    let world = inv_view_proj * glam::Vec4::new(ndc.x, ndc.y, depth, 1.0);
    let world = world / world.w;
    let prev_clip = prev_view_proj * world;
    let prev_ndc = prev_clip.truncate() / prev_clip.w.max(1e-6);
    Vec2::new(prev_ndc.x * 0.5 + 0.5, prev_ndc.y * -0.5 + 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn jitter_is_centered_and_subpixel() {
        let mut sum = Vec2::ZERO;
        for frame in 0..16u64 {
            let j = taa_jitter(frame, 1920, 1080);
            assert!(j.x.abs() <= 2.0 / 1920.0 + 1e-6);
            assert!(j.y.abs() <= 2.0 / 1080.0 + 1e-6);
            sum += j;
        }
        let mean = sum / 16.0;
        assert!(mean.length() < 1e-4, "halton jitter should average out");
    }

    #[test]
    fn static_point_has_zero_motion() {
        let clip = Vec4::new(0.3, -0.2, 0.5, 1.2);
        assert!(motion_vector(clip, clip).length() < 1e-6);
    }

    #[test]
    fn motion_points_back_toward_previous_position() {
        // Moved right in NDC: history lies to the left.
        let prev = Vec4::new(0.0, 0.0, 0.5, 1.0);
        let curr = Vec4::new(0.2, 0.0, 0.5, 1.0);
        let m = motion_vector(curr, prev);
        assert!(m.x < 0.0);
        assert!((m.x + 0.1).abs() < 1e-6);
    }

    #[test]
    fn luma_weight_roundtrips() {
        let c = Vec3::new(1.7, 0.3, 0.9);
        let back = inverse_luma_weight(luma_weight(c));
        assert!((back - c).length() < 1e-4);
    }

    #[test]
    fn identity_reprojection_is_identity() {
        let vp = Mat4::perspective_infinite_reverse_rh(1.0, 1.5, 0.1)
            * Mat4::look_at_rh(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO, Vec3::Y);
        let uv = Vec2::new(0.4, 0.6);
        let out = reproject_uv(uv, 0.25, vp.inverse(), vp);
        assert!((out - uv).length() < 1e-4);
    }

    #[test]
    fn scale_to_max_preserves_aspect() {
        let (w, h) = scale_to_max((4000, 2000), 2048);
        assert!(w <= 2048 && h <= 2048);
        let aspect = w as f32 / h as f32;
        assert!((aspect - 2.0).abs() < 0.01);
    }
}
