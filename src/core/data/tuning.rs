//! Gameplay/renderer tuning schema.
//!
//! Constants that are tuned numbers rather than invariants (crush threshold,
//! spring stiffness, TAA blend weights, shadow bias) live here so they can
//! be overridden from `data/tuning.json` without recompiling. Defaults match
//! the shipped game feel.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Physics sub-step size in seconds.
    pub physics_timestep: f32,
    /// Internal clock advance per sub-step, as a multiple of the timestep.
    pub physics_time_scale: f32,
    pub ground_friction: f32,

    /// Rest factor at or below which a stomped letter is crushed outright.
    pub crush_threshold: f32,
    pub stomp_rest_factor_step: f32,
    pub stomp_impulse: f32,
    pub rigid_collision_tighten: f32,
    pub soft_collision_tighten: f32,

    /// Spring constants applied to letters at spawn.
    pub spring_ks: f32,
    pub spring_kd: f32,

    /// TAA history blend weight (the remainder goes to the current frame).
    pub taa_history_weight: f32,
    /// Weight of the 5-tap cross in the neighborhood clamp (the remainder
    /// goes to the full 3x3 box).
    pub taa_cross_weight: f32,
    pub shadow_pcf_bias: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            physics_timestep: 0.002,
            physics_time_scale: 3.0,
            ground_friction: 0.99,

            crush_threshold: 0.4,
            stomp_rest_factor_step: 0.33,
            stomp_impulse: 1200.0,
            rigid_collision_tighten: 0.8,
            soft_collision_tighten: 0.9,

            spring_ks: 120.0,
            spring_kd: 6.0,

            taa_history_weight: 0.9,
            taa_cross_weight: 0.5,
            shadow_pcf_bias: 0.005,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let t: Tuning = serde_json::from_str(r#"{ "crush_threshold": 0.5 }"#).unwrap();
        assert_eq!(t.crush_threshold, 0.5);
        assert_eq!(t.stomp_impulse, Tuning::default().stomp_impulse);
    }
}
