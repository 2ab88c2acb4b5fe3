//! Scene graph: actors, lights, camera, and the actor registry.
//!
//! The scene exclusively owns all actors through a generation-checked arena,
//! so a removed actor's id can never silently alias a recycled slot. Physics
//! and the renderer both walk the same registry each frame; gameplay-facing
//! scalars (health/score) live here but are only mutated by the gameplay
//! layer when it drains simulation events.

use glam::{Mat4, Quat, Vec3};

use crate::anim::AnimationState;
use crate::gfx::MeshHandle;

/// Axis-aligned box in mesh-local space, computed once at mesh build time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const UNIT: Self = Self {
        min: Vec3::new(-0.5, -0.5, -0.5),
        max: Vec3::new(0.5, 0.5, 0.5),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Grow to contain `p`.
    pub fn extend(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn half_size(&self) -> Vec3 {
        self.size() * 0.5
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::UNIT
    }
}

/// Spring-damper parameters for a "soft body" actor.
///
/// `rest_height` is the undeformed world-space height captured at spawn;
/// every spring target derives from it times `rest_factor`, never from the
/// already-deformed world box.
#[derive(Copy, Clone, Debug)]
pub struct SoftBody {
    pub ks: f32,
    pub kd: f32,
    pub rest_factor: f32,
    pub rest_height: f32,
}

/// PBR surface parameters uploaded per draw.
#[derive(Copy, Clone, Debug)]
pub struct Material {
    pub diffuse: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: [0.8, 0.8, 0.8],
            metallic: 0.0,
            roughness: 1.0,
        }
    }
}

/// A scene entity: one transform, optional dynamics, one mesh + material.
pub struct Actor {
    pub transform: Mat4,
    /// Previous-frame transform for motion-vector reprojection. Seeded with
    /// the spawn transform so frame 1 reports zero velocity.
    pub prev_transform: Mat4,
    pub velocity: Vec3,
    pub force: Vec3,
    /// Zero mass means kinematic: the integrator skips the actor entirely.
    pub mass: f32,
    pub scale_velocity: Vec3,
    pub spring: Option<SoftBody>,
    pub mesh: MeshHandle,
    pub material: Material,
    pub local_aabb: Aabb,
    pub anim: Option<AnimationState>,
}

impl Actor {
    pub fn new(mesh: MeshHandle, material: Material, local_aabb: Aabb) -> Self {
        Self {
            transform: Mat4::IDENTITY,
            prev_transform: Mat4::IDENTITY,
            velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            mass: 0.0,
            scale_velocity: Vec3::ZERO,
            spring: None,
            mesh,
            material,
            local_aabb,
            anim: None,
        }
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self.prev_transform = transform;
        self
    }

    pub fn position(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }

    pub fn set_position(&mut self, p: Vec3) {
        self.transform.w_axis = p.extend(1.0);
    }

    pub fn scale(&self) -> Vec3 {
        let (scale, _, _) = self.transform.to_scale_rotation_translation();
        scale
    }

    /// Replace the scale component, preserving rotation and translation.
    pub fn set_scale(&mut self, scale: Vec3) {
        let (_, rotation, translation) = self.transform.to_scale_rotation_translation();
        self.transform = Mat4::from_scale_rotation_translation(scale, rotation, translation);
    }

    pub fn rotation(&self) -> Quat {
        let (_, rotation, _) = self.transform.to_scale_rotation_translation();
        rotation
    }

    pub fn add_force(&mut self, f: Vec3) {
        self.force += f;
    }

    pub fn is_grounded(&self) -> bool {
        self.position().y < crate::physics::GROUND_EPSILON
    }

    /// Rigid bodies have mass but no spring; everything else with mass and a
    /// spring is a soft body.
    pub fn is_rigid_body(&self) -> bool {
        self.mass > 0.0 && self.spring.is_none()
    }

    pub fn is_soft_body(&self) -> bool {
        self.mass > 0.0 && self.spring.is_some()
    }
}

/// Handle into the actor arena: slot index plus generation.
///
/// A removed slot bumps its generation, so ids held past removal resolve to
/// `None` rather than whatever was respawned in the slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ActorId {
    index: u32,
    generation: u32,
}

impl ActorId {
    /// An id that never resolves; useful as a pre-spawn placeholder.
    pub const INVALID: Self = Self {
        index: u32::MAX,
        generation: u32::MAX,
    };
}

struct Slot {
    generation: u32,
    actor: Option<Actor>,
}

/// Camera described by its camera-to-world transform, as gameplay builds it.
#[derive(Copy, Clone, Debug)]
pub struct Camera {
    pub transform: Mat4,
    pub fovy: f32,
    pub znear: f32,
}

impl Camera {
    pub fn view(&self) -> Mat4 {
        self.transform.inverse()
    }

    pub fn eye(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            transform: Mat4::from_translation(Vec3::new(0.0, 3.0, 15.0)),
            fovy: 60f32.to_radians(),
            znear: 0.1,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub chromaticity: Vec3,
    pub luminance: f32,
}

#[derive(Copy, Clone, Debug)]
pub struct SpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    pub chromaticity: Vec3,
    pub luminance: f32,
    /// Cone half-angles in radians, inner < outer; the renderer converts to
    /// cosine space before upload.
    pub inner_cutoff: f32,
    pub outer_cutoff: f32,
}

/// The scene: actor arena, camera, one light of each kind, game scalars.
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
    pub camera: Camera,
    pub directional_light: Option<DirectionalLight>,
    pub spot_light: Option<SpotLight>,
    pub health: f32,
    pub score: i32,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            camera: Camera::default(),
            directional_light: None,
            spot_light: None,
            health: 100.0,
            score: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn spawn(&mut self, actor: Actor) -> ActorId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.actor = Some(actor);
            ActorId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                actor: Some(actor),
            });
            ActorId {
                index,
                generation: 0,
            }
        }
    }

    /// Remove the actor, invalidating `id` and all copies of it.
    pub fn remove(&mut self, id: ActorId) -> Option<Actor> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let actor = slot.actor.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(actor)
    }

    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.actor.as_ref()
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.actor.as_mut()
    }

    pub fn contains(&self, id: ActorId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActorId, &Actor)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.actor.as_ref().map(|a| {
                (
                    ActorId {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    a,
                )
            })
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ActorId, &mut Actor)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            let generation = slot.generation;
            slot.actor.as_mut().map(move |a| {
                (
                    ActorId {
                        index: i as u32,
                        generation,
                    },
                    a,
                )
            })
        })
    }

    /// Ids of all live actors; handy when a loop needs `&mut Scene` inside.
    pub fn ids(&self) -> Vec<ActorId> {
        self.iter().map(|(id, _)| id).collect()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
