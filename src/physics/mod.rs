//! Fixed-timestep physics: integration, ground friction, OBB collision,
//! spring-damper squish deformation.
//!
//! `fixed_update` advances an internal clock toward wall-clock time in fixed
//! sub-steps, so a stalled frame produces extra sub-steps rather than missed
//! simulation. The step is deterministic given (scene, dt) and performs no
//! I/O; gameplay consequences (score, health, particle spawns, removals) are
//! reported as a drained event list instead of mutated in place.

mod obb;

pub use obb::{Obb, obb_intersect, resolve_collision_mtv};

use glam::Vec3;

use crate::core::data::tuning::Tuning;
use crate::scene::{ActorId, Scene};

/// Actors below this height count as grounded.
pub const GROUND_EPSILON: f32 = 0.01;

/// Y-scale floor during deformation; keeps squashed geometry non-degenerate.
pub const MIN_SCALE_Y: f32 = 0.1;

const GRAVITY: f32 = 9.8;

/// A rigid body falling slower than this still counts as "falling onto" a
/// soft body, which lets a stomp register right around the arc's apex.
const STOMP_VELOCITY_CEILING: f32 = 0.3;

const STOMP_SCORE: i32 = 15;
const STOMP_HEALTH: f32 = 15.0;
const CRUSH_SCORE: i32 = 20;
const CRUSH_HEALTH: f32 = 30.0;

/// Outcomes of one `fixed_update`, drained and applied by the gameplay layer.
#[derive(Clone, Debug, PartialEq)]
pub enum SimEvent {
    ScoreDelta(i32),
    HealthDelta(f32),
    Stomped {
        soft_body: ActorId,
        rest_factor: f32,
    },
    /// The soft body was removed from the scene this step; `position` is
    /// where gameplay should spawn the crush particle burst.
    ActorCrushed {
        soft_body: ActorId,
        position: Vec3,
    },
}

/// Collision/deformation constants, split out of [`Tuning`] so the engine
/// carries exactly what it reads.
#[derive(Copy, Clone, Debug)]
pub struct PhysicsConfig {
    /// Sub-step size in seconds.
    pub timestep: f32,
    /// The internal clock advances `timestep * time_scale` per sub-step, so
    /// one integration step covers several wall-clock steps.
    pub time_scale: f32,
    pub ground_friction: f32,
    /// Rest factor at or below which a stomp crushes the soft body outright.
    pub crush_threshold: f32,
    /// How much one stomp knocks off the rest factor.
    pub stomp_rest_factor_step: f32,
    /// Upward force granted to the rigid body on a stomp, scaled by
    /// `(1 + rest_factor) / 2`.
    pub stomp_impulse: f32,
    pub rigid_tighten: f32,
    pub soft_tighten: f32,
}

impl PhysicsConfig {
    pub fn from_tuning(t: &Tuning) -> Self {
        Self {
            timestep: t.physics_timestep,
            time_scale: t.physics_time_scale,
            ground_friction: t.ground_friction,
            crush_threshold: t.crush_threshold,
            stomp_rest_factor_step: t.stomp_rest_factor_step,
            stomp_impulse: t.stomp_impulse,
            rigid_tighten: t.rigid_collision_tighten,
            soft_tighten: t.soft_collision_tighten,
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self::from_tuning(&Tuning::default())
    }
}

pub struct PhysicsEngine {
    config: PhysicsConfig,
    time: f64,
}

impl PhysicsEngine {
    pub fn new(config: PhysicsConfig) -> Self {
        Self { config, time: 0.0 }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Advance simulation toward `time` (seconds of wall clock since start),
    /// looping over fixed sub-steps until caught up.
    pub fn fixed_update(&mut self, scene: &mut Scene, time: f64) -> Vec<SimEvent> {
        let mut events = Vec::new();
        let advance = (self.config.timestep * self.config.time_scale) as f64;
        while self.time < time {
            self.step(scene, &mut events);
            self.time += advance;
        }
        events
    }

    fn step(&mut self, scene: &mut Scene, events: &mut Vec<SimEvent>) {
        let dt = self.config.timestep;

        // (a) Gravity for airborne actors; friction opposing horizontal
        // motion for grounded ones, where the normal force cancels gravity.
        for (_, actor) in scene.iter_mut() {
            if actor.mass <= 0.0 {
                continue;
            }
            if actor.is_grounded() {
                let mut tangential = actor.velocity;
                tangential.y = 0.0;
                let friction = tangential.normalize_or_zero()
                    * (-self.config.ground_friction * actor.mass * GRAVITY);
                actor.add_force(friction);
                actor.velocity.y = 0.0;
            } else {
                actor.add_force(Vec3::new(0.0, -GRAVITY * actor.mass, 0.0));
            }
        }

        // (b) Rigid-vs-soft collision resolution and spring recovery.
        self.resolve_collisions(scene, dt, events);

        // (c) Semi-implicit integration with a floor plane at y = 0.
        for (_, actor) in scene.iter_mut() {
            if actor.mass <= 0.0 {
                continue;
            }
            let acceleration = actor.force / actor.mass;
            let mut position = actor.position();
            position += actor.velocity * dt + acceleration * (0.5 * dt * dt);
            position.y = position.y.max(0.0);
            actor.set_position(position);
            actor.velocity += acceleration * dt;
        }

        // (d) Forces do not persist across steps.
        for (_, actor) in scene.iter_mut() {
            actor.force = Vec3::ZERO;
        }
    }

    fn resolve_collisions(&self, scene: &mut Scene, dt: f32, events: &mut Vec<SimEvent>) {
        let rigid_ids: Vec<ActorId> = scene
            .iter()
            .filter(|(_, a)| a.is_rigid_body())
            .map(|(id, _)| id)
            .collect();
        let soft_ids: Vec<ActorId> = scene
            .iter()
            .filter(|(_, a)| a.is_soft_body())
            .map(|(id, _)| id)
            .collect();

        for rigid_id in rigid_ids {
            let Some(rigid) = scene.get(rigid_id) else {
                continue;
            };
            let rigid_obb =
                Obb::from_transform(&rigid.transform, &rigid.local_aabb, self.config.rigid_tighten);

            for &soft_id in &soft_ids {
                if soft_id == rigid_id {
                    continue;
                }
                let Some(soft) = scene.get(soft_id) else {
                    continue;
                };
                let Some(spring) = soft.spring else {
                    continue;
                };
                let soft_obb =
                    Obb::from_transform(&soft.transform, &soft.local_aabb, self.config.soft_tighten);

                // Heights always come from the undeformed local box times the
                // running scale, never the deformed world AABB.
                let local_height = soft.local_aabb.size().y;
                let soft_height = local_height * soft.scale().y;
                let soft_grounded = soft.is_grounded();
                let soft_position = soft.position();

                if !obb_intersect(&soft_obb, &rigid_obb) {
                    // Untouched: the vertical spring pulls the Y scale back
                    // toward its (possibly stomp-reduced) rest height.
                    let target_height = spring.rest_height * spring.rest_factor;
                    let soft = scene.get_mut(soft_id).expect("soft body vanished mid-step");
                    let spring_force = (target_height - soft_height) * spring.ks
                        - spring.kd * soft.scale_velocity.y;
                    soft.scale_velocity.y += spring_force * dt;
                    let mut scale = soft.scale() + soft.scale_velocity * dt;
                    scale.y = scale.y.max(MIN_SCALE_Y);
                    soft.set_scale(scale);
                    continue;
                }

                // Re-read the rigid body: an earlier pairing this step may
                // have pushed it.
                let Some(rigid) = scene.get(rigid_id) else {
                    break;
                };
                let rigid_position = rigid.position();
                let rigid_velocity_y = rigid.velocity.y;
                let rigid_grounded = rigid.is_grounded();

                let vertical_penetration = soft_position.y + soft_height - rigid_position.y;

                if rigid_grounded && soft_grounded {
                    // Shoulder-to-shoulder contact: push the rigid body out
                    // along the ground-plane axis of least overlap.
                    let correction = resolve_collision_mtv(&rigid_obb, &soft_obb);
                    let rigid = scene.get_mut(rigid_id).expect("rigid body vanished mid-step");
                    let p = rigid.position() + correction;
                    rigid.set_position(p);
                } else if vertical_penetration > 0.0
                    && rigid_velocity_y < STOMP_VELOCITY_CEILING
                    && soft_grounded
                {
                    if spring.rest_factor <= self.config.crush_threshold {
                        // Crushed flat: remove the actor and report it.
                        scene.remove(soft_id);
                        events.push(SimEvent::HealthDelta(CRUSH_HEALTH));
                        events.push(SimEvent::ScoreDelta(CRUSH_SCORE));
                        events.push(SimEvent::ActorCrushed {
                            soft_body: soft_id,
                            position: soft_position,
                        });
                        continue;
                    }

                    // Stomp: bounce the rigid body, ratchet the rest factor
                    // down. The impulse reads the pre-stomp rest factor.
                    let impulse =
                        self.config.stomp_impulse * (1.0 + spring.rest_factor) / 2.0;
                    {
                        let rigid =
                            scene.get_mut(rigid_id).expect("rigid body vanished mid-step");
                        rigid.add_force(Vec3::new(0.0, impulse, 0.0));
                    }
                    let new_rest_factor = {
                        let soft = scene.get_mut(soft_id).expect("soft body vanished mid-step");
                        let spring = soft.spring.as_mut().expect("soft body lost its spring");
                        spring.rest_factor -= self.config.stomp_rest_factor_step;
                        spring.rest_factor
                    };
                    events.push(SimEvent::HealthDelta(STOMP_HEALTH));
                    events.push(SimEvent::ScoreDelta(STOMP_SCORE));
                    events.push(SimEvent::Stomped {
                        soft_body: soft_id,
                        rest_factor: new_rest_factor,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Aabb, Actor, Material, SoftBody};
    use crate::gfx::MeshHandle;
    use glam::Mat4;

    fn dynamic_actor(pos: Vec3) -> Actor {
        let mut a = Actor::new(MeshHandle::PLACEHOLDER, Material::default(), Aabb::UNIT)
            .with_transform(Mat4::from_translation(pos));
        a.mass = 1.0;
        a
    }

    #[test]
    fn resting_actor_stays_put_under_zero_force() {
        let mut scene = Scene::new();
        let id = scene.spawn(dynamic_actor(Vec3::ZERO));
        let mut engine = PhysicsEngine::new(PhysicsConfig::default());
        let events = engine.fixed_update(&mut scene, 1.0);
        assert!(events.is_empty());
        let a = scene.get(id).unwrap();
        assert_eq!(a.position().y, 0.0);
        assert!(a.velocity.length() < 1e-6);
    }

    #[test]
    fn airborne_actor_falls_and_lands() {
        let mut scene = Scene::new();
        let id = scene.spawn(dynamic_actor(Vec3::new(0.0, 5.0, 0.0)));
        let mut engine = PhysicsEngine::new(PhysicsConfig::default());
        engine.fixed_update(&mut scene, 4.0);
        let a = scene.get(id).unwrap();
        assert!(a.position().y < GROUND_EPSILON);
    }

    #[test]
    fn ground_friction_decays_horizontal_velocity() {
        let mut scene = Scene::new();
        let mut actor = dynamic_actor(Vec3::ZERO);
        actor.velocity = Vec3::new(4.0, 0.0, 0.0);
        let id = scene.spawn(actor);
        let mut engine = PhysicsEngine::new(PhysicsConfig::default());
        engine.fixed_update(&mut scene, 0.25);
        let a = scene.get(id).unwrap();
        assert!(a.velocity.x < 4.0);
        assert!(a.velocity.x >= 0.0 - 1e-3);
    }

    #[test]
    fn soft_body_spring_recovers_rest_scale() {
        let mut scene = Scene::new();
        // Springs integrate inside the rigid-vs-soft pairing loop, so park a
        // rigid body far out of contact range.
        scene.spawn(dynamic_actor(Vec3::new(50.0, 0.0, 0.0)));
        let mut letter = dynamic_actor(Vec3::ZERO);
        letter.spring = Some(SoftBody {
            ks: 120.0,
            kd: 6.0,
            rest_factor: 1.0,
            rest_height: 1.0,
        });
        letter.set_scale(Vec3::new(1.0, 0.4, 1.0));
        let id = scene.spawn(letter);
        let mut engine = PhysicsEngine::new(PhysicsConfig::default());
        engine.fixed_update(&mut scene, 10.0);
        let a = scene.get(id).unwrap();
        assert!(
            (a.scale().y - 1.0).abs() < 0.02,
            "spring did not converge: scale.y = {}",
            a.scale().y
        );
    }
}
