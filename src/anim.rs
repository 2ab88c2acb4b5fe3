//! Skeletal animation: bone hierarchy, keyframe clips, palette evaluation.
//!
//! CPU-side sampling of per-bone position/rotation tracks into joint
//! palettes for the skinned vertex shader. Sampling is a pure function of
//! (skeleton, clip, t); the only state retained between frames is the
//! previous palette, kept so the shader can emit motion vectors.

use std::collections::HashMap;
use std::sync::Mutex;

use glam::{Mat4, Quat, Vec3};

/// One bone: parent link plus the local bind pose it was authored in.
///
/// Bones are stored flattened in depth-first order, so a parent always
/// precedes its children and world poses resolve in a single forward pass.
#[derive(Clone, Debug)]
pub struct Bone {
    pub name: String,
    pub parent: Option<usize>,
    pub bind_translation: Vec3,
    pub bind_rotation: Quat,
    /// Inverse of the world-space bind matrix, cached at build time.
    pub inverse_bind: Mat4,
}

/// A bone tree flattened to a depth-first list with cached inverse binds.
#[derive(Clone, Debug)]
pub struct Skeleton {
    pub bones: Vec<Bone>,
}

/// Builder input: (name, parent index, local bind translation, local bind rotation).
/// Parents must appear before children (depth-first construction order).
pub type BoneDesc = (&'static str, Option<usize>, Vec3, Quat);

impl Skeleton {
    pub fn from_bind_poses(descs: &[BoneDesc]) -> Self {
        let mut bones: Vec<Bone> = Vec::with_capacity(descs.len());
        let mut world: Vec<Mat4> = Vec::with_capacity(descs.len());
        for &(name, parent, t, r) in descs {
            let local = Mat4::from_rotation_translation(r, t);
            let w = match parent {
                Some(p) => {
                    debug_assert!(p < bones.len(), "bone parents must precede children");
                    world[p] * local
                }
                None => local,
            };
            world.push(w);
            bones.push(Bone {
                name: name.to_string(),
                parent,
                bind_translation: t,
                bind_rotation: r,
                inverse_bind: w.inverse(),
            });
        }
        Self { bones }
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Evaluate the world pose of every bone for `clip` at time `t`, then
    /// fold in the cached inverse binds to produce skinning matrices, all
    /// pre-multiplied by `root` (the actor's model transform).
    pub fn skinning_palette(&self, clip: &Clip, t: f32, root: Mat4) -> Vec<Mat4> {
        let locals = clip.sample(self, t);
        let mut world: Vec<Mat4> = Vec::with_capacity(self.bones.len());
        for (i, bone) in self.bones.iter().enumerate() {
            let w = match bone.parent {
                Some(p) => world[p] * locals[i],
                None => locals[i],
            };
            world.push(w);
        }
        self.bones
            .iter()
            .enumerate()
            .map(|(i, bone)| root * world[i] * bone.inverse_bind)
            .collect()
    }
}

/// Position keyframe track, times sorted ascending.
#[derive(Clone, Debug, Default)]
pub struct TrackVec3 {
    pub times: Vec<f32>,
    pub values: Vec<Vec3>,
}

/// Rotation keyframe track, times sorted ascending.
#[derive(Clone, Debug, Default)]
pub struct TrackQuat {
    pub times: Vec<f32>,
    pub values: Vec<Quat>,
}

/// An animation clip: per-bone position and rotation tracks.
#[derive(Clone, Debug, Default)]
pub struct Clip {
    pub name: String,
    pub duration: f32,
    pub t_tracks: HashMap<usize, TrackVec3>,
    pub r_tracks: HashMap<usize, TrackQuat>,
}

impl Clip {
    /// Sample every bone's local transform at time `t` (seconds, unwrapped).
    ///
    /// Bones without a track hold their bind pose; a zero-keyframe track
    /// likewise degenerates to the bind value.
    pub fn sample(&self, skeleton: &Skeleton, t: f32) -> Vec<Mat4> {
        let time = if self.duration > 0.0 {
            t % self.duration
        } else {
            0.0
        };
        skeleton
            .bones
            .iter()
            .enumerate()
            .map(|(i, bone)| {
                let translation = self
                    .t_tracks
                    .get(&i)
                    .map(|tr| sample_vec3(tr, time, bone.bind_translation))
                    .unwrap_or(bone.bind_translation);
                let rotation = self
                    .r_tracks
                    .get(&i)
                    .map(|tr| sample_quat(tr, time, bone.bind_rotation))
                    .unwrap_or(bone.bind_rotation);
                Mat4::from_rotation_translation(rotation, translation)
            })
            .collect()
    }
}

fn sample_vec3(tr: &TrackVec3, t: f32, default: Vec3) -> Vec3 {
    if tr.times.is_empty() {
        return default;
    }
    if t <= tr.times[0] {
        return tr.values[0];
    }
    if t >= *tr.times.last().unwrap() {
        return *tr.values.last().unwrap();
    }
    let mut i = 0;
    while i + 1 < tr.times.len() && !(t >= tr.times[i] && t <= tr.times[i + 1]) {
        i += 1;
    }
    let t0 = tr.times[i];
    let t1 = tr.times[i + 1];
    let f = (t - t0) / (t1 - t0).max(1e-6);
    tr.values[i].lerp(tr.values[i + 1], f)
}

fn sample_quat(tr: &TrackQuat, t: f32, default: Quat) -> Quat {
    if tr.times.is_empty() {
        return default;
    }
    if t <= tr.times[0] {
        return tr.values[0];
    }
    if t >= *tr.times.last().unwrap() {
        return *tr.values.last().unwrap();
    }
    let mut i = 0;
    while i + 1 < tr.times.len() && !(t >= tr.times[i] && t <= tr.times[i + 1]) {
        i += 1;
    }
    let t0 = tr.times[i];
    let t1 = tr.times[i + 1];
    let f = (t - t0) / (t1 - t0).max(1e-6);
    tr.values[i].slerp(tr.values[i + 1], f)
}

/// Per-actor animation state: which clip plays, where in it we are, and the
/// palettes the renderer uploads. Gameplay sets (clip, t) every frame; the
/// previous palette sticks around for motion vectors.
pub struct AnimationState {
    pub skeleton: Skeleton,
    pub clips: HashMap<String, Clip>,
    pub clip: String,
    pub time: f32,
    pub palette: Vec<Mat4>,
    pub prev_palette: Vec<Mat4>,
}

impl AnimationState {
    pub fn new(skeleton: Skeleton, clips: HashMap<String, Clip>, initial_clip: &str) -> Self {
        let n = skeleton.len();
        Self {
            skeleton,
            clips,
            clip: initial_clip.to_string(),
            time: 0.0,
            palette: vec![Mat4::IDENTITY; n],
            prev_palette: vec![Mat4::IDENTITY; n],
        }
    }

    pub fn set_clip(&mut self, name: &str) {
        if self.clip != name {
            self.clip = name.to_string();
            self.time = 0.0;
        }
    }

    /// Advance time and refresh the palette for `root` (the actor's model
    /// transform). The outgoing palette becomes the previous one.
    pub fn update(&mut self, dt: f32, root: Mat4) {
        self.time += dt;
        std::mem::swap(&mut self.palette, &mut self.prev_palette);
        match self.clips.get(&self.clip) {
            Some(clip) => {
                self.palette = self.skeleton.skinning_palette(clip, self.time, root);
            }
            None => {
                warn_missing_clip(&self.clip);
                // Hold the bind pose: palette collapses to the root transform.
                self.palette.fill(root);
            }
        }
    }
}

/// Warn once per missing clip name so a misnamed state does not spam logs.
fn warn_missing_clip(name: &str) {
    static WARNED: Mutex<Option<Vec<String>>> = Mutex::new(None);
    let mut guard = WARNED.lock().unwrap();
    let warned = guard.get_or_insert_with(Vec::new);
    if !warned.iter().any(|n| n == name) {
        log::warn!("animation clip {name:?} not found; holding bind pose");
        warned.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Skeleton {
        Skeleton::from_bind_poses(&[
            ("root", None, Vec3::ZERO, Quat::IDENTITY),
            ("tip", Some(0), Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY),
        ])
    }

    #[test]
    fn bind_pose_palette_is_identity() {
        let sk = chain();
        let clip = Clip {
            name: "empty".into(),
            duration: 1.0,
            ..Default::default()
        };
        for m in sk.skinning_palette(&clip, 0.37, Mat4::IDENTITY) {
            assert!(m.abs_diff_eq(Mat4::IDENTITY, 1e-6));
        }
    }

    #[test]
    fn track_endpoints_are_exact() {
        let tr = TrackVec3 {
            times: vec![0.0, 0.5, 1.0],
            values: vec![Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0), Vec3::X],
        };
        assert_eq!(sample_vec3(&tr, 0.0, Vec3::ZERO), Vec3::ZERO);
        assert_eq!(sample_vec3(&tr, 1.0, Vec3::ZERO), Vec3::X);
        // Midpoint of the first segment lerps.
        let mid = sample_vec3(&tr, 0.25, Vec3::ZERO);
        assert!((mid.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn single_keyframe_holds_value() {
        let tr = TrackVec3 {
            times: vec![0.3],
            values: vec![Vec3::new(1.0, 2.0, 3.0)],
        };
        assert_eq!(sample_vec3(&tr, 0.0, Vec3::ZERO), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(sample_vec3(&tr, 9.0, Vec3::ZERO), Vec3::new(1.0, 2.0, 3.0));
    }
}
