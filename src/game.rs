//! Lamp Crusher gameplay: scene assembly, the intro → playing → game-over
//! state machine, letter spawning, health/score bookkeeping, and crush
//! particles.
//!
//! The game owns the scene and the physics engine. Each display tick it
//! applies input intents, advances physics toward wall-clock time, drains
//! the resulting simulation events, and hands the scene to the renderer.

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::anim::{AnimationState, Clip, Skeleton};
use crate::assets;
use crate::client::controller::{self, LampController};
use crate::client::input::InputState;
use crate::core::data::tuning::Tuning;
use crate::gfx::{MeshHandle, Renderer};
use crate::physics::{GROUND_EPSILON, Obb, PhysicsConfig, PhysicsEngine, SimEvent};
use crate::scene::{
    Aabb, Actor, ActorId, DirectionalLight, Material, Scene, SoftBody, SpotLight,
};

const LETTERS: [char; 5] = ['p', 'i', 'x', 'a', 'r'];
const STATIC_LETTER_SPACING: f32 = 4.0;
const LAMP_SPAWN: Vec3 = Vec3::new(-3.0, 0.0, 5.0);
const LAMP_SCALE: f32 = 1.5;
const LAMP_MASS: f32 = 0.2;
const LETTER_MASS: f32 = 1.0;
const STARTING_HEALTH: f32 = 50.0;
const MAX_HEALTH: f32 = 100.0;
const BASE_SPAWN_INTERVAL: f32 = 2.0;
const MIN_SPAWN_INTERVAL: f32 = 0.5;
const CRUSH_PARTICLE_COUNT: usize = 20;
const PARTICLE_LIFE: f32 = 3.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GameMode {
    Intro,
    Playing,
    GameOver,
}

struct GameMeshes {
    ground: MeshHandle,
    ground_aabb: Aabb,
    cube: MeshHandle,
    lamp: MeshHandle,
    lamp_aabb: Aabb,
    letters: Vec<(MeshHandle, Aabb)>,
}

struct Particle {
    id: ActorId,
    velocity: Vec3,
    age: f32,
}

pub struct Game {
    pub scene: Scene,
    pub input: InputState,
    physics: PhysicsEngine,
    tuning: Tuning,
    controller: LampController,
    mode: GameMode,
    lamp: ActorId,
    meshes: GameMeshes,
    lamp_skeleton: Skeleton,
    lamp_clips: HashMap<String, Clip>,
    rng: ChaCha8Rng,
    wall_time: f64,
    play_time: f64,
    spawn_timer: f32,
    spawn_interval: f32,
    particles: Vec<Particle>,
    health_decay_paused: bool,
    debug_draw: bool,
}

impl Game {
    pub fn new(renderer: &mut Renderer, tuning: Tuning) -> Self {
        let ground_cpu = assets::create_plane(100.0);
        let cube_cpu = assets::create_cube();
        let lamp_model = assets::lamp_model();

        let ground = renderer.upload_model(&ground_cpu, "ground");
        let cube = renderer.upload_model(&cube_cpu, "cube");
        let lamp = renderer.upload_skinned_model(&lamp_model.mesh, "lamp");
        let letters = LETTERS
            .iter()
            .map(|&c| {
                let cpu = assets::letter_mesh(c);
                let aabb = cpu.aabb;
                (renderer.upload_model(&cpu, &format!("letter-{c}")), aabb)
            })
            .collect();

        let meshes = GameMeshes {
            ground,
            ground_aabb: ground_cpu.aabb,
            cube,
            lamp,
            lamp_aabb: lamp_model.mesh.aabb,
            letters,
        };

        let physics = PhysicsEngine::new(PhysicsConfig::from_tuning(&tuning));
        let mut game = Self {
            scene: Scene::new(),
            input: InputState::default(),
            physics,
            tuning,
            controller: LampController::default(),
            mode: GameMode::Intro,
            lamp: ActorId::INVALID,
            meshes,
            lamp_skeleton: lamp_model.skeleton,
            lamp_clips: lamp_model.clips,
            rng: ChaCha8Rng::seed_from_u64(0x1a3b),
            wall_time: 0.0,
            play_time: 0.0,
            spawn_timer: 0.0,
            spawn_interval: BASE_SPAWN_INTERVAL,
            particles: Vec::new(),
            health_decay_paused: false,
            debug_draw: false,
        };
        game.populate_scene();
        game
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Leave the intro and begin a run.
    pub fn start(&mut self) {
        if self.mode != GameMode::Intro {
            return;
        }
        self.mode = GameMode::Playing;
        self.scene.health = STARTING_HEALTH;
        self.scene.score = 0;
        self.play_time = 0.0;
        self.spawn_timer = 0.0;
        self.spawn_interval = BASE_SPAWN_INTERVAL;
        log::info!("game started");
    }

    /// Tear the run down and return to the intro.
    pub fn reset(&mut self) {
        self.scene = Scene::new();
        self.particles.clear();
        self.populate_scene();
        self.mode = GameMode::Intro;
        self.play_time = 0.0;
        self.input.clear_movement();
        log::info!("game reset");
    }

    pub fn toggle_health_decay(&mut self) {
        self.health_decay_paused = !self.health_decay_paused;
        log::info!("health decay paused: {}", self.health_decay_paused);
    }

    pub fn toggle_debug_draw(&mut self) {
        self.debug_draw = !self.debug_draw;
    }

    /// One display tick: intents → physics catch-up → event drain → camera,
    /// lights, animation, and debug output for the renderer.
    pub fn update(&mut self, dt: f32, renderer: &mut Renderer) {
        self.wall_time += dt as f64;

        match self.mode {
            GameMode::Intro => {
                // Idle attract loop: the lamp hops in place.
                if let Some(lamp) = self.scene.get_mut(self.lamp)
                    && lamp.is_grounded()
                {
                    jump(lamp, self.controller.jump_strength);
                }
            }
            GameMode::Playing => {
                self.play_time += dt as f64;
                if let Some(lamp) = self.scene.get_mut(self.lamp) {
                    self.controller.update(&self.input, lamp, dt);
                }
                self.update_spawning(dt);
                self.update_health(dt);
            }
            GameMode::GameOver => {}
        }

        let events = self.physics.fixed_update(&mut self.scene, self.wall_time);
        self.apply_events(events);

        self.update_particles(dt);
        self.update_animation(dt);
        self.update_lights();
        self.update_camera();

        if self.debug_draw {
            self.draw_debug(renderer);
        }
    }

    fn populate_scene(&mut self) {
        let ground = Actor::new(
            self.meshes.ground,
            Material {
                diffuse: [0.4, 0.54, 1.0],
                metallic: 0.1,
                roughness: 1.0,
            },
            self.meshes.ground_aabb,
        );
        self.scene.spawn(ground);

        let mut lamp = Actor::new(
            self.meshes.lamp,
            Material {
                diffuse: [1.0, 1.0, 1.0],
                metallic: 0.5,
                roughness: 0.1,
            },
            self.meshes.lamp_aabb,
        )
        .with_transform(Mat4::from_scale_rotation_translation(
            Vec3::splat(LAMP_SCALE),
            Quat::from_rotation_y(-std::f32::consts::FRAC_PI_2),
            LAMP_SPAWN,
        ));
        lamp.mass = LAMP_MASS;
        lamp.anim = Some(AnimationState::new(
            self.lamp_skeleton.clone(),
            self.lamp_clips.clone(),
            "Idle",
        ));
        self.lamp = self.scene.spawn(lamp);

        let offset = (LETTERS.len() as f32 - 1.0) * STATIC_LETTER_SPACING * 0.5;
        for (i, _) in LETTERS.iter().enumerate() {
            let x = i as f32 * STATIC_LETTER_SPACING - offset;
            self.spawn_letter(i, Vec3::new(x, 0.0, 0.0));
        }

        self.scene.directional_light = Some(DirectionalLight {
            direction: Vec3::new(-1.0, -1.0, -1.0),
            chromaticity: Vec3::ONE,
            luminance: 7.0,
        });
        self.scene.health = MAX_HEALTH;
        self.scene.score = 0;
    }

    fn spawn_letter(&mut self, letter: usize, position: Vec3) -> ActorId {
        let (mesh, aabb) = self.meshes.letters[letter];
        let mut actor = Actor::new(
            mesh,
            Material {
                diffuse: [0.05, 0.05, 0.05],
                metallic: 0.1,
                roughness: 1.0,
            },
            aabb,
        )
        .with_transform(Mat4::from_rotation_translation(
            Quat::from_rotation_y(-std::f32::consts::FRAC_PI_2),
            position,
        ));
        actor.mass = LETTER_MASS;
        actor.spring = Some(SoftBody {
            ks: self.tuning.spring_ks,
            kd: self.tuning.spring_kd,
            rest_factor: 1.0,
            rest_height: aabb.size().y,
        });
        self.scene.spawn(actor)
    }

    fn update_spawning(&mut self, dt: f32) {
        self.spawn_timer += dt;
        if self.spawn_timer < self.spawn_interval {
            return;
        }
        self.spawn_timer = 0.0;
        // Letters fall faster and faster as the run drags on.
        self.spawn_interval =
            (BASE_SPAWN_INTERVAL - self.play_time as f32 * 0.1).max(MIN_SPAWN_INTERVAL);

        let letter = self.rng.random_range(0..LETTERS.len());
        let x = self.rng.random::<f32>() * 20.0 - 10.0;
        let z = self.rng.random::<f32>() * 20.0 - 10.0;
        self.spawn_letter(letter, Vec3::new(x, 20.0, z));
    }

    fn update_health(&mut self, dt: f32) {
        if self.health_decay_paused {
            return;
        }
        let rate = 1.0 + (self.play_time / 10.0).floor() as f32;
        self.scene.health -= 10.0 * rate * dt;
        if self.scene.health <= 0.0 {
            self.scene.health = 0.0;
            self.mode = GameMode::GameOver;
            log::info!("game over: score {}", self.scene.score);
        }
    }

    fn apply_events(&mut self, events: Vec<SimEvent>) {
        for event in events {
            match event {
                SimEvent::ScoreDelta(d) => self.scene.score += d,
                SimEvent::HealthDelta(d) => {
                    self.scene.health = (self.scene.health + d).min(MAX_HEALTH);
                }
                SimEvent::Stomped { rest_factor, .. } => {
                    log::info!("stomped letter; rest factor now {rest_factor:.2}");
                }
                SimEvent::ActorCrushed { position, .. } => {
                    log::info!("letter crushed at {position:?}");
                    self.spawn_crush_particles(position);
                }
            }
        }
    }

    fn spawn_crush_particles(&mut self, position: Vec3) {
        for _ in 0..CRUSH_PARTICLE_COUNT {
            let jitter = Vec3::new(
                (self.rng.random::<f32>() - 0.5) * 0.5,
                self.rng.random::<f32>() * 0.5,
                (self.rng.random::<f32>() - 0.5) * 0.5,
            );
            let velocity = Vec3::new(
                (self.rng.random::<f32>() - 0.5) * 0.3,
                0.2 + self.rng.random::<f32>() * 0.4,
                (self.rng.random::<f32>() - 0.5) * 0.3,
            );
            let mut actor = Actor::new(
                self.meshes.cube,
                Material {
                    diffuse: [0.9, 0.9, 0.9],
                    metallic: 0.0,
                    roughness: 0.8,
                },
                Aabb::UNIT,
            )
            .with_transform(Mat4::from_scale_rotation_translation(
                Vec3::splat(0.2),
                Quat::IDENTITY,
                position + jitter,
            ));
            // Kinematic: drift is integrated here, not by the physics step.
            actor.mass = 0.0;
            let id = self.scene.spawn(actor);
            self.particles.push(Particle {
                id,
                velocity,
                age: 0.0,
            });
        }
    }

    fn update_particles(&mut self, dt: f32) {
        let scene = &mut self.scene;
        self.particles.retain_mut(|p| {
            p.age += dt;
            if p.age >= PARTICLE_LIFE {
                scene.remove(p.id);
                return false;
            }
            if let Some(actor) = scene.get_mut(p.id) {
                let fade = 1.0 - p.age / PARTICLE_LIFE;
                let pos = actor.position() + p.velocity * dt;
                actor.transform = Mat4::from_scale_rotation_translation(
                    Vec3::splat((0.2 * fade).max(0.01)),
                    Quat::IDENTITY,
                    pos,
                );
            }
            true
        });
    }

    fn update_animation(&mut self, dt: f32) {
        if let Some(lamp) = self.scene.get_mut(self.lamp) {
            let airborne = !lamp.is_grounded() || lamp.velocity.y > GROUND_EPSILON;
            let root = lamp.transform;
            if let Some(anim) = lamp.anim.as_mut() {
                anim.set_clip(if airborne { "Jump" } else { "Idle" });
                anim.update(dt, root);
            }
        }
    }

    fn update_lights(&mut self) {
        // The head-mounted spot follows the lamp; the sun dims with health.
        if let Some(lamp) = self.scene.get(self.lamp) {
            let position = lamp.transform.transform_point3(Vec3::new(0.0, 1.0, 0.5));
            let direction = lamp
                .transform
                .transform_vector3(Vec3::new(0.0, -0.5, 1.0))
                .normalize_or_zero();
            self.scene.spot_light = Some(SpotLight {
                position,
                direction,
                chromaticity: Vec3::ONE,
                luminance: 10.0,
                inner_cutoff: std::f32::consts::PI / 9.0,
                outer_cutoff: std::f32::consts::PI / 6.0,
            });
        }

        if let Some(sun) = self.scene.directional_light.as_mut() {
            let max_luminance = 7.0;
            sun.luminance = if self.mode == GameMode::Playing {
                ((self.scene.health / 150.0).powi(3) * max_luminance).min(max_luminance)
            } else {
                max_luminance
            };
        }
    }

    fn update_camera(&mut self) {
        let transform = match self.mode {
            GameMode::Intro => controller::intro_camera(),
            GameMode::Playing | GameMode::GameOver => {
                let target = self
                    .scene
                    .get(self.lamp)
                    .map(|l| l.position())
                    .unwrap_or(Vec3::ZERO);
                controller::third_person_camera(&self.input, target)
            }
        };
        controller::apply_camera(&mut self.scene.camera, transform);
    }

    fn draw_debug(&mut self, renderer: &mut Renderer) {
        let rigid_tighten = self.physics.config().rigid_tighten;
        let soft_tighten = self.physics.config().soft_tighten;
        let dbg = renderer.debug();
        dbg.add_axes(Vec3::ZERO, 2.0);
        for (id, actor) in self.scene.iter() {
            if actor.mass <= 0.0 {
                continue;
            }
            let tighten = if actor.spring.is_some() {
                soft_tighten
            } else {
                rigid_tighten
            };
            let obb = Obb::from_transform(&actor.transform, &actor.local_aabb, tighten);
            let color = if id == self.lamp {
                [1.0, 0.9, 0.2]
            } else {
                [0.2, 1.0, 0.6]
            };
            dbg.add_obb(&obb, color);
        }
    }
}

fn jump(lamp: &mut Actor, strength: f32) {
    lamp.velocity.y = strength;
    let mut p = lamp.position();
    p.y = GROUND_EPSILON * 2.0;
    lamp.set_position(p);
}
