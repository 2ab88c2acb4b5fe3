//! Third-person lamp controller and orbit camera.
//!
//! WASD moves relative to the camera's horizontal forward, the lamp turns
//! smoothly toward its motion, and space applies a jump impulse when
//! grounded. The controller only writes actor intents (velocity, transform
//! yaw); integration and collision stay in the physics step.

use glam::{Mat4, Quat, Vec3};

use super::input::InputState;
use crate::physics::GROUND_EPSILON;
use crate::scene::{Actor, Camera};

#[derive(Debug, Clone, Copy)]
pub struct LampController {
    pub move_speed: f32,
    pub jump_strength: f32,
    pub turn_rate: f32,
}

impl Default for LampController {
    fn default() -> Self {
        Self {
            move_speed: 9.0,
            jump_strength: 6.0,
            turn_rate: 8.0,
        }
    }
}

impl LampController {
    /// Camera-relative horizontal forward for the current orbit yaw (the
    /// camera looks from its orbit offset toward the lamp).
    pub fn camera_forward(input: &InputState) -> Vec3 {
        Vec3::new(-input.yaw.sin(), 0.0, -input.yaw.cos())
    }

    pub fn update(&self, input: &InputState, lamp: &mut Actor, dt: f32) {
        let forward = Self::camera_forward(input);
        let right = forward.cross(Vec3::Y).normalize_or_zero();

        let mut movement = Vec3::ZERO;
        if input.forward {
            movement += forward;
        }
        if input.backward {
            movement -= forward;
        }
        if input.left {
            movement -= right;
        }
        if input.right {
            movement += right;
        }

        let (scale, rotation, translation) = lamp.transform.to_scale_rotation_translation();
        let mut yaw = yaw_of(rotation);

        if movement.length_squared() > 0.0 {
            let movement = movement.normalize();
            lamp.velocity.x = movement.x * self.move_speed;
            lamp.velocity.z = movement.z * self.move_speed;
            let target_yaw = movement.x.atan2(movement.z);
            yaw = turn_towards(yaw, target_yaw, self.turn_rate * dt);
        } else {
            // Let ground friction bleed the remaining slide away.
        }

        if input.jump && lamp.is_grounded() {
            lamp.velocity.y = self.jump_strength;
            // Lift just past the grounded epsilon so the next physics step
            // treats the lamp as airborne instead of zeroing the jump.
            let mut p = translation;
            p.y = GROUND_EPSILON * 2.0;
            lamp.transform =
                Mat4::from_scale_rotation_translation(scale, Quat::from_rotation_y(yaw), p);
            return;
        }

        lamp.transform =
            Mat4::from_scale_rotation_translation(scale, Quat::from_rotation_y(yaw), translation);
    }
}

/// Orbit camera around `target`, respecting yaw/pitch/zoom from input; the
/// eye is kept above the ground plane.
pub fn third_person_camera(input: &InputState, target: Vec3) -> Mat4 {
    let offset = Vec3::new(
        input.camera_distance * input.yaw.sin() * input.pitch.cos(),
        input.camera_distance * -input.pitch.sin() + 3.0,
        input.camera_distance * input.yaw.cos() * input.pitch.cos(),
    );
    let mut eye = target + offset;
    eye.y = eye.y.max(0.2);
    let focus = target + Vec3::new(0.0, 1.0, 0.0);
    Mat4::look_at_rh(eye, focus, Vec3::Y).inverse()
}

/// Fixed intro shot framing the letter row.
pub fn intro_camera() -> Mat4 {
    Mat4::look_at_rh(Vec3::new(0.0, 2.0, 18.0), Vec3::ZERO, Vec3::Y).inverse()
}

pub fn apply_camera(camera: &mut Camera, transform: Mat4) {
    camera.transform = transform;
}

fn yaw_of(rotation: Quat) -> f32 {
    let fwd = rotation * Vec3::Z;
    fwd.x.atan2(fwd.z)
}

fn turn_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = wrap_angle(target - current);
    if delta.abs() <= max_delta {
        return target;
    }
    if delta > 0.0 {
        wrap_angle(current + max_delta)
    } else {
        wrap_angle(current - max_delta)
    }
}

fn wrap_angle(a: f32) -> f32 {
    let mut x = a;
    while x > std::f32::consts::PI {
        x -= std::f32::consts::TAU;
    }
    while x < -std::f32::consts::PI {
        x += std::f32::consts::TAU;
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::MeshHandle;
    use crate::scene::{Aabb, Material};

    fn lamp() -> Actor {
        let mut a = Actor::new(MeshHandle::PLACEHOLDER, Material::default(), Aabb::UNIT);
        a.mass = 0.2;
        a
    }

    #[test]
    fn turn_towards_takes_the_short_arc() {
        let next = turn_towards(3.0, -3.0, 0.1);
        // Shortest path from +3 rad to -3 rad crosses pi, not zero.
        assert!(next > 3.0 || next < -3.0);
    }

    #[test]
    fn forward_input_sets_horizontal_velocity() {
        let mut a = lamp();
        let input = InputState {
            forward: true,
            ..Default::default()
        };
        LampController::default().update(&input, &mut a, 0.016);
        assert!(a.velocity.length() > 0.0);
        assert_eq!(a.velocity.y, 0.0);
    }

    #[test]
    fn jump_lifts_off_the_ground() {
        let mut a = lamp();
        let input = InputState {
            jump: true,
            ..Default::default()
        };
        LampController::default().update(&input, &mut a, 0.016);
        assert!(a.velocity.y > 0.0);
        assert!(!a.is_grounded());
    }

    #[test]
    fn orbit_camera_looks_at_the_target() {
        let input = InputState::default();
        let target = Vec3::new(2.0, 0.0, -3.0);
        let m = third_person_camera(&input, target);
        let eye = m.w_axis.truncate();
        // Camera forward (-Z of the transform) points from eye toward target.
        let fwd = -(m.z_axis.truncate());
        let to_target = ((target + Vec3::Y) - eye).normalize();
        assert!(fwd.normalize().dot(to_target) > 0.99);
    }
}
