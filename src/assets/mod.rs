//! Asset providers (CPU-side).
//!
//! The core consumes pre-parsed vertex/index arrays in fixed stride layouts;
//! it never parses model files itself. The builders here assemble the game's
//! stand-in geometry — ground plane, cube, block letters, and the articulated
//! lamp with its skeleton and clips — from transformed boxes, and compute the
//! local-space AABB each mesh carries for collision.

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};

use crate::anim::{Clip, Skeleton, TrackQuat};
use crate::gfx::types::{Vertex, VertexSkinned};
use crate::scene::Aabb;

pub struct MeshCpu {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
    pub aabb: Aabb,
}

pub struct SkinnedMeshCpu {
    pub vertices: Vec<VertexSkinned>,
    pub indices: Vec<u16>,
    pub aabb: Aabb,
}

/// A skinned model plus the skeleton and clips that animate it.
pub struct LampModel {
    pub mesh: SkinnedMeshCpu,
    pub skeleton: Skeleton,
    pub clips: HashMap<String, Clip>,
}

// Unit-box geometry shared by every box push: 6 faces, outward normals.
const BOX_FACES: [([f32; 3], [Vec3; 4]); 6] = [
    // +X
    (
        [1.0, 0.0, 0.0],
        [
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
        ],
    ),
    // -X
    (
        [-1.0, 0.0, 0.0],
        [
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(-1.0, -1.0, -1.0),
        ],
    ),
    // +Y
    (
        [0.0, 1.0, 0.0],
        [
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, -1.0),
        ],
    ),
    // -Y
    (
        [0.0, -1.0, 0.0],
        [
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, 1.0),
        ],
    ),
    // +Z
    (
        [0.0, 0.0, 1.0],
        [
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(-1.0, -1.0, 1.0),
        ],
    ),
    // -Z
    (
        [0.0, 0.0, -1.0],
        [
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
        ],
    ),
];

const FACE_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]];

#[derive(Default)]
struct MeshBuilder {
    vertices: Vec<Vertex>,
    indices: Vec<u16>,
    aabb: Option<Aabb>,
}

impl MeshBuilder {
    /// Append a box with the given half extents, transformed by `transform`.
    fn push_box(&mut self, transform: Mat4, half: Vec3) {
        let normal_m = Mat4::from_quat(transform.to_scale_rotation_translation().1);
        for (nrm, corners) in BOX_FACES {
            let base = self.vertices.len() as u16;
            let n = normal_m.transform_vector3(Vec3::from_array(nrm));
            for (corner, uv) in corners.iter().zip(FACE_UVS) {
                let p = transform.transform_point3(*corner * half);
                match &mut self.aabb {
                    Some(bb) => bb.extend(p),
                    None => self.aabb = Some(Aabb::new(p, p)),
                }
                self.vertices.push(Vertex {
                    pos: p.to_array(),
                    nrm: n.to_array(),
                    uv,
                });
            }
            self.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }

    fn build(self) -> MeshCpu {
        MeshCpu {
            vertices: self.vertices,
            indices: self.indices,
            aabb: self.aabb.unwrap_or(Aabb::UNIT),
        }
    }
}

#[derive(Default)]
struct SkinnedMeshBuilder {
    vertices: Vec<VertexSkinned>,
    indices: Vec<u16>,
    aabb: Option<Aabb>,
}

impl SkinnedMeshBuilder {
    /// Append a box whose vertices blend `joints` with weights interpolated
    /// from `bottom_weight` at the box's lowest point to `top_weight` at its
    /// highest (each weight pair sums to one).
    fn push_box(
        &mut self,
        transform: Mat4,
        half: Vec3,
        joints: [u32; 2],
        bottom_weight: f32,
        top_weight: f32,
    ) {
        let normal_m = Mat4::from_quat(transform.to_scale_rotation_translation().1);
        for (nrm, corners) in BOX_FACES {
            let base = self.vertices.len() as u16;
            let n = normal_m.transform_vector3(Vec3::from_array(nrm));
            for (corner, uv) in corners.iter().zip(FACE_UVS) {
                let local = *corner * half;
                let p = transform.transform_point3(local);
                match &mut self.aabb {
                    Some(bb) => bb.extend(p),
                    None => self.aabb = Some(Aabb::new(p, p)),
                }
                let t = (local.y / half.y + 1.0) * 0.5;
                let w0 = bottom_weight + (top_weight - bottom_weight) * t;
                self.vertices.push(VertexSkinned {
                    pos: p.to_array(),
                    nrm: n.to_array(),
                    uv,
                    weights: [w0, 1.0 - w0],
                    joints,
                });
            }
            self.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }

    fn build(self) -> SkinnedMeshCpu {
        SkinnedMeshCpu {
            vertices: self.vertices,
            indices: self.indices,
            aabb: self.aabb.unwrap_or(Aabb::UNIT),
        }
    }
}

/// Ground plane on y = 0 spanning ±`extent`, normal up.
pub fn create_plane(extent: f32) -> MeshCpu {
    let v = |x: f32, z: f32, u: f32, w: f32| Vertex {
        pos: [x, 0.0, z],
        nrm: [0.0, 1.0, 0.0],
        uv: [u, w],
    };
    MeshCpu {
        vertices: vec![
            v(-extent, -extent, 0.0, 0.0),
            v(extent, -extent, 1.0, 0.0),
            v(-extent, extent, 0.0, 1.0),
            v(extent, extent, 1.0, 1.0),
        ],
        indices: vec![0, 1, 2, 1, 3, 2],
        aabb: Aabb::new(Vec3::new(-extent, -0.01, -extent), Vec3::new(extent, 0.01, extent)),
    }
}

/// Unit cube centered at the origin.
pub fn create_cube() -> MeshCpu {
    let mut b = MeshBuilder::default();
    b.push_box(Mat4::IDENTITY, Vec3::splat(0.5));
    b.build()
}

fn slab(b: &mut MeshBuilder, center: Vec3, half: Vec3) {
    b.push_box(Mat4::from_translation(center), half);
}

fn slab_rotated_z(b: &mut MeshBuilder, center: Vec3, half: Vec3, angle: f32) {
    b.push_box(
        Mat4::from_translation(center) * Mat4::from_rotation_z(angle),
        half,
    );
}

/// Blocky letter geometry for the PIXAR set: roughly 1.2 wide, 2 tall,
/// 0.4 deep, resting on y = 0.
pub fn letter_mesh(letter: char) -> MeshCpu {
    let mut b = MeshBuilder::default();
    let d = 0.2; // half depth
    match letter.to_ascii_lowercase() {
        'p' => {
            slab(&mut b, Vec3::new(-0.45, 1.0, 0.0), Vec3::new(0.15, 1.0, d));
            slab(&mut b, Vec3::new(0.05, 1.85, 0.0), Vec3::new(0.35, 0.15, d));
            slab(&mut b, Vec3::new(0.05, 1.15, 0.0), Vec3::new(0.35, 0.15, d));
            slab(&mut b, Vec3::new(0.45, 1.5, 0.0), Vec3::new(0.15, 0.5, d));
        }
        'i' => {
            slab(&mut b, Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.2, 1.0, d));
        }
        'x' => {
            slab_rotated_z(&mut b, Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.15, 1.15, d), 0.55);
            slab_rotated_z(&mut b, Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.15, 1.15, d), -0.55);
        }
        'a' => {
            slab_rotated_z(&mut b, Vec3::new(-0.3, 1.0, 0.0), Vec3::new(0.15, 1.05, d), -0.3);
            slab_rotated_z(&mut b, Vec3::new(0.3, 1.0, 0.0), Vec3::new(0.15, 1.05, d), 0.3);
            slab(&mut b, Vec3::new(0.0, 0.9, 0.0), Vec3::new(0.35, 0.12, d));
        }
        'r' => {
            slab(&mut b, Vec3::new(-0.45, 1.0, 0.0), Vec3::new(0.15, 1.0, d));
            slab(&mut b, Vec3::new(0.05, 1.85, 0.0), Vec3::new(0.35, 0.15, d));
            slab(&mut b, Vec3::new(0.05, 1.15, 0.0), Vec3::new(0.35, 0.15, d));
            slab(&mut b, Vec3::new(0.45, 1.5, 0.0), Vec3::new(0.15, 0.5, d));
            slab_rotated_z(&mut b, Vec3::new(0.25, 0.55, 0.0), Vec3::new(0.14, 0.6, d), -0.45);
        }
        other => {
            log::warn!("no letter geometry for {other:?}; substituting a cube");
            b.push_box(Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)), Vec3::splat(0.6));
        }
    }
    b.build()
}

/// Bone indices for the lamp skeleton, in depth-first order.
pub mod lamp_bones {
    pub const BASE: usize = 0;
    pub const LOWER_ARM: usize = 1;
    pub const UPPER_ARM: usize = 2;
    pub const HEAD: usize = 3;
}

/// The articulated desk lamp: a four-bone chain (base → lower arm → upper
/// arm → head), a skinned mesh weighted across the joints, and the Idle and
/// Jump clips.
pub fn lamp_model() -> LampModel {
    use lamp_bones::*;

    let skeleton = Skeleton::from_bind_poses(&[
        ("base", None, Vec3::ZERO, Quat::IDENTITY),
        ("lower_arm", Some(BASE), Vec3::new(0.0, 0.15, 0.0), Quat::IDENTITY),
        ("upper_arm", Some(LOWER_ARM), Vec3::new(0.0, 0.75, 0.0), Quat::IDENTITY),
        ("head", Some(UPPER_ARM), Vec3::new(0.0, 0.75, 0.0), Quat::IDENTITY),
    ]);

    let mut b = SkinnedMeshBuilder::default();
    // Base plate, rigidly bound.
    b.push_box(
        Mat4::from_translation(Vec3::new(0.0, 0.075, 0.0)),
        Vec3::new(0.45, 0.075, 0.45),
        [BASE as u32, BASE as u32],
        1.0,
        1.0,
    );
    // Lower arm: blends from the base at its root to its own bone at the top.
    b.push_box(
        Mat4::from_translation(Vec3::new(0.0, 0.525, 0.0)),
        Vec3::new(0.08, 0.375, 0.08),
        [LOWER_ARM as u32, BASE as u32],
        0.6,
        1.0,
    );
    // Upper arm.
    b.push_box(
        Mat4::from_translation(Vec3::new(0.0, 1.275, 0.0)),
        Vec3::new(0.07, 0.375, 0.07),
        [UPPER_ARM as u32, LOWER_ARM as u32],
        0.5,
        1.0,
    );
    // Head shade, leaning forward.
    b.push_box(
        Mat4::from_translation(Vec3::new(0.0, 1.75, 0.15)),
        Vec3::new(0.22, 0.18, 0.25),
        [HEAD as u32, UPPER_ARM as u32],
        0.7,
        1.0,
    );
    let mesh = b.build();

    let mut clips = HashMap::new();
    clips.insert("Idle".to_string(), idle_clip());
    clips.insert("Jump".to_string(), jump_clip());

    LampModel {
        mesh,
        skeleton,
        clips,
    }
}

fn rot_track(keys: &[(f32, Quat)]) -> TrackQuat {
    TrackQuat {
        times: keys.iter().map(|(t, _)| *t).collect(),
        values: keys.iter().map(|(_, q)| *q).collect(),
    }
}

fn idle_clip() -> Clip {
    use lamp_bones::*;
    let mut clip = Clip {
        name: "Idle".to_string(),
        duration: 2.0,
        ..Default::default()
    };
    clip.r_tracks.insert(
        HEAD,
        rot_track(&[
            (0.0, Quat::IDENTITY),
            (1.0, Quat::from_rotation_x(0.12)),
            (2.0, Quat::IDENTITY),
        ]),
    );
    clip.r_tracks.insert(
        LOWER_ARM,
        rot_track(&[
            (0.0, Quat::IDENTITY),
            (1.0, Quat::from_rotation_z(0.04)),
            (2.0, Quat::IDENTITY),
        ]),
    );
    clip
}

fn jump_clip() -> Clip {
    use lamp_bones::*;
    let mut clip = Clip {
        name: "Jump".to_string(),
        duration: 0.6,
        ..Default::default()
    };
    // Crouch, spring open, settle.
    clip.r_tracks.insert(
        LOWER_ARM,
        rot_track(&[
            (0.0, Quat::IDENTITY),
            (0.15, Quat::from_rotation_x(-0.5)),
            (0.35, Quat::from_rotation_x(0.25)),
            (0.6, Quat::IDENTITY),
        ]),
    );
    clip.r_tracks.insert(
        UPPER_ARM,
        rot_track(&[
            (0.0, Quat::IDENTITY),
            (0.15, Quat::from_rotation_x(0.9)),
            (0.35, Quat::from_rotation_x(-0.4)),
            (0.6, Quat::IDENTITY),
        ]),
    );
    clip.r_tracks.insert(
        HEAD,
        rot_track(&[
            (0.0, Quat::IDENTITY),
            (0.15, Quat::from_rotation_x(-0.6)),
            (0.35, Quat::from_rotation_x(0.3)),
            (0.6, Quat::IDENTITY),
        ]),
    );
    clip
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_24_vertices_and_unit_aabb() {
        let cube = create_cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        assert_eq!(cube.aabb, Aabb::UNIT);
    }

    #[test]
    fn letters_rest_on_the_floor() {
        for c in ['p', 'i', 'x', 'a', 'r'] {
            let mesh = letter_mesh(c);
            assert!(!mesh.indices.is_empty());
            assert!(mesh.aabb.min.y.abs() < 0.2, "letter {c} floats: {:?}", mesh.aabb);
            assert!(mesh.aabb.size().y > 1.5);
        }
    }

    #[test]
    fn lamp_weights_are_normalized() {
        let lamp = lamp_model();
        assert_eq!(lamp.skeleton.len(), 4);
        for v in &lamp.mesh.vertices {
            let sum = v.weights[0] + v.weights[1];
            assert!((sum - 1.0).abs() < 1e-5);
            assert!((v.joints[0] as usize) < lamp.skeleton.len());
            assert!((v.joints[1] as usize) < lamp.skeleton.len());
        }
    }
}
