//! Skeletal animation properties: determinism, keyframe boundaries, and
//! skinning-matrix correctness on a small bone chain.

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};
use lamp_crusher::anim::{AnimationState, Clip, Skeleton, TrackQuat, TrackVec3};
use lamp_crusher::assets;

fn two_bone_chain() -> Skeleton {
    Skeleton::from_bind_poses(&[
        ("root", None, Vec3::ZERO, Quat::IDENTITY),
        ("tip", Some(0), Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY),
    ])
}

#[test]
fn sampling_is_deterministic_bit_for_bit() {
    let lamp = assets::lamp_model();
    let clip = &lamp.clips["Jump"];
    for t in [0.0, 0.1, 0.27, 0.5] {
        let a = lamp.skeleton.skinning_palette(clip, t, Mat4::IDENTITY);
        let b = lamp.skeleton.skinning_palette(clip, t, Mat4::IDENTITY);
        for (ma, mb) in a.iter().zip(&b) {
            assert_eq!(ma.to_cols_array(), mb.to_cols_array());
        }
    }
}

#[test]
fn clip_endpoints_reproduce_keyframe_values_exactly() {
    let sk = two_bone_chain();
    let first = Quat::from_rotation_z(0.3);
    let last = Quat::from_rotation_z(-0.7);
    let mut clip = Clip {
        name: "sway".into(),
        duration: 1.0,
        ..Default::default()
    };
    clip.r_tracks.insert(
        0,
        TrackQuat {
            times: vec![0.0, 0.4, 1.0],
            values: vec![first, Quat::IDENTITY, last],
        },
    );

    let at_start = clip.sample(&sk, 0.0);
    let expected = Mat4::from_rotation_translation(first, Vec3::ZERO);
    assert!(at_start[0].abs_diff_eq(expected, 1e-6));

    // Sampling just shy of the end hits the last key without overshoot (the
    // clip wraps at exactly t == duration).
    let at_end = clip.sample(&sk, 0.999999);
    let expected = Mat4::from_rotation_translation(last, Vec3::ZERO);
    assert!(at_end[0].abs_diff_eq(expected, 1e-4));
}

#[test]
fn position_track_midpoint_lerps() {
    let sk = two_bone_chain();
    let mut clip = Clip {
        name: "slide".into(),
        duration: 2.0,
        ..Default::default()
    };
    clip.t_tracks.insert(
        1,
        TrackVec3 {
            times: vec![0.0, 2.0],
            values: vec![Vec3::new(0.0, 1.0, 0.0), Vec3::new(2.0, 1.0, 0.0)],
        },
    );
    let locals = clip.sample(&sk, 1.0);
    let p = locals[1].w_axis.truncate();
    assert!((p - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-6);
}

#[test]
fn rotated_root_carries_the_child_through_skinning() {
    let sk = two_bone_chain();
    let mut clip = Clip {
        name: "bend".into(),
        duration: 1.0,
        ..Default::default()
    };
    let quarter = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
    clip.r_tracks.insert(
        0,
        TrackQuat {
            times: vec![0.0, 1.0],
            values: vec![quarter, quarter],
        },
    );

    let palette = sk.skinning_palette(&clip, 0.0, Mat4::IDENTITY);
    // A vertex bound to the tip at its bind position (0,1,0) swings to
    // (-1,0,0) when the root rotates 90° about Z.
    let moved = palette[1].transform_point3(Vec3::new(0.0, 1.0, 0.0));
    assert!((moved - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);
}

#[test]
fn animation_state_keeps_previous_palette_for_motion_vectors() {
    let lamp = assets::lamp_model();
    let mut state = AnimationState::new(lamp.skeleton, lamp.clips, "Jump");
    state.update(0.1, Mat4::IDENTITY);
    let first: Vec<[f32; 16]> = state.palette.iter().map(|m| m.to_cols_array()).collect();
    state.update(0.1, Mat4::IDENTITY);
    let prev: Vec<[f32; 16]> = state
        .prev_palette
        .iter()
        .map(|m| m.to_cols_array())
        .collect();
    assert_eq!(first, prev);
}

#[test]
fn missing_clip_holds_the_root_transform() {
    let sk = two_bone_chain();
    let mut state = AnimationState::new(sk, HashMap::new(), "NoSuchClip");
    let root = Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0));
    state.update(0.016, root);
    for m in &state.palette {
        assert!(m.abs_diff_eq(root, 1e-6));
    }
}
