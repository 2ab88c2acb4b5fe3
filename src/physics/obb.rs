//! Oriented bounding boxes: construction, SAT intersection, XZ push-out.
//!
//! An `Obb` is a derived value, rebuilt from an actor's transform and local
//! AABB on every query; nothing here is cached across frames. The `tighten`
//! factor shrinks the box for gameplay feel and is always passed explicitly
//! at the call site.

use glam::{Mat4, Vec3};

use crate::scene::Aabb;

#[derive(Copy, Clone, Debug)]
pub struct Obb {
    pub center: Vec3,
    pub axes: [Vec3; 3],
    pub half_extents: Vec3,
}

impl Obb {
    /// Build a world-space OBB from a local AABB and a world transform.
    pub fn from_transform(transform: &Mat4, local_aabb: &Aabb, tighten: f32) -> Self {
        let center = transform.transform_point3(local_aabb.center());

        let x = transform.x_axis.truncate();
        let y = transform.y_axis.truncate();
        let z = transform.z_axis.truncate();
        let scale = Vec3::new(x.length(), y.length(), z.length());

        let half = local_aabb.half_size() * scale * tighten;
        Self {
            center,
            axes: [
                x.normalize_or_zero(),
                y.normalize_or_zero(),
                z.normalize_or_zero(),
            ],
            half_extents: half,
        }
    }

    /// Half-length of this box's projection interval onto `axis`.
    fn half_projection(&self, axis: Vec3) -> f32 {
        self.half_extents.x * axis.dot(self.axes[0]).abs()
            + self.half_extents.y * axis.dot(self.axes[1]).abs()
            + self.half_extents.z * axis.dot(self.axes[2]).abs()
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let mut out = [Vec3::ZERO; 8];
        let mut i = 0;
        for dx in [-1.0, 1.0] {
            for dy in [-1.0, 1.0] {
                for dz in [-1.0, 1.0] {
                    out[i] = self.center
                        + self.axes[0] * (dx * self.half_extents.x)
                        + self.axes[1] * (dy * self.half_extents.y)
                        + self.axes[2] * (dz * self.half_extents.z);
                    i += 1;
                }
            }
        }
        out
    }
}

/// Separating-axis test over the 15 candidate axes (6 face normals + 9 edge
/// cross products). Degenerate cross products are skipped.
pub fn obb_intersect(a: &Obb, b: &Obb) -> bool {
    let mut axes: Vec<Vec3> = Vec::with_capacity(15);
    axes.extend_from_slice(&a.axes);
    axes.extend_from_slice(&b.axes);
    for i in 0..3 {
        for j in 0..3 {
            let axis = a.axes[i].cross(b.axes[j]);
            if axis.length_squared() > 1e-6 {
                axes.push(axis.normalize());
            }
        }
    }
    let t_vec = b.center - a.center;
    for axis in axes {
        let r1 = a.half_projection(axis);
        let r2 = b.half_projection(axis);
        if t_vec.dot(axis).abs() > r1 + r2 {
            return false;
        }
    }
    true
}

struct XzBounds {
    min_x: f32,
    max_x: f32,
    min_z: f32,
    max_z: f32,
}

fn xz_bounds(obb: &Obb) -> XzBounds {
    let mut b = XzBounds {
        min_x: f32::INFINITY,
        max_x: f32::NEG_INFINITY,
        min_z: f32::INFINITY,
        max_z: f32::NEG_INFINITY,
    };
    for c in obb.corners() {
        b.min_x = b.min_x.min(c.x);
        b.max_x = b.max_x.max(c.x);
        b.min_z = b.min_z.min(c.z);
        b.max_z = b.max_z.max(c.z);
    }
    b
}

/// Minimum translation pushing `a` out of `b` on the ground plane.
///
/// Projects both boxes' corners onto X and Z, picks the axis with the least
/// overlap, and signs the push away from `b`'s center.
pub fn resolve_collision_mtv(a: &Obb, b: &Obb) -> Vec3 {
    let ab = xz_bounds(a);
    let bb = xz_bounds(b);

    let a_center_x = (ab.min_x + ab.max_x) * 0.5;
    let a_center_z = (ab.min_z + ab.max_z) * 0.5;
    let b_center_x = (bb.min_x + bb.max_x) * 0.5;
    let b_center_z = (bb.min_z + bb.max_z) * 0.5;

    let overlap_x = ab.max_x.min(bb.max_x) - ab.min_x.max(bb.min_x);
    let overlap_z = ab.max_z.min(bb.max_z) - ab.min_z.max(bb.min_z);

    if overlap_x < overlap_z {
        let push = if a_center_x < b_center_x {
            -overlap_x
        } else {
            overlap_x
        };
        Vec3::new(push, 0.0, 0.0)
    } else {
        let push = if a_center_z < b_center_z {
            -overlap_z
        } else {
            overlap_z
        };
        Vec3::new(0.0, 0.0, push)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube_at(p: Vec3) -> Obb {
        Obb::from_transform(&Mat4::from_translation(p), &Aabb::UNIT, 1.0)
    }

    #[test]
    fn overlapping_unit_cubes_intersect() {
        let a = unit_cube_at(Vec3::ZERO);
        let b = unit_cube_at(Vec3::new(0.5, 0.0, 0.0));
        assert!(obb_intersect(&a, &b));
    }

    #[test]
    fn separated_unit_cubes_do_not_intersect() {
        let a = unit_cube_at(Vec3::ZERO);
        let b = unit_cube_at(Vec3::new(2.0, 0.0, 0.0));
        assert!(!obb_intersect(&a, &b));
    }

    #[test]
    fn rotated_cube_still_collides() {
        let a = unit_cube_at(Vec3::ZERO);
        let m = Mat4::from_translation(Vec3::new(0.9, 0.0, 0.0))
            * Mat4::from_rotation_y(std::f32::consts::FRAC_PI_4);
        let b = Obb::from_transform(&m, &Aabb::UNIT, 1.0);
        assert!(obb_intersect(&a, &b));
    }

    #[test]
    fn mtv_pushes_left_box_further_left() {
        let side = 1.5;
        let half = Vec3::splat(side * 0.5);
        let aabb = Aabb::new(-half, half);
        let a = Obb::from_transform(&Mat4::IDENTITY, &aabb, 1.0);
        let b = Obb::from_transform(&Mat4::from_translation(Vec3::X), &aabb, 1.0);
        let mtv = resolve_collision_mtv(&a, &b);
        assert!(mtv.x < 0.0, "expected -X push, got {mtv:?}");
        assert_eq!(mtv.y, 0.0);
        assert_eq!(mtv.z, 0.0);
        assert!((mtv.x + 0.5).abs() < 1e-5);
    }

    #[test]
    fn tighten_factor_scales_extents() {
        let obb = Obb::from_transform(&Mat4::IDENTITY, &Aabb::UNIT, 0.8);
        assert!((obb.half_extents.x - 0.4).abs() < 1e-6);
    }
}
