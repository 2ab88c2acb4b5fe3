//! Actor-arena guarantees: generation-checked ids and registry bookkeeping.

use glam::{Mat4, Vec3};
use lamp_crusher::gfx::MeshHandle;
use lamp_crusher::scene::{Aabb, Actor, ActorId, Material, Scene};

fn actor() -> Actor {
    Actor::new(MeshHandle::PLACEHOLDER, Material::default(), Aabb::UNIT)
}

#[test]
fn spawn_and_get_round_trip() {
    let mut scene = Scene::new();
    let id = scene.spawn(actor().with_transform(Mat4::from_translation(Vec3::X)));
    assert_eq!(scene.len(), 1);
    assert_eq!(scene.get(id).unwrap().position(), Vec3::X);
}

#[test]
fn removal_invalidates_every_copy_of_the_id() {
    let mut scene = Scene::new();
    let id = scene.spawn(actor());
    let copy = id;
    assert!(scene.remove(id).is_some());
    assert!(scene.get(copy).is_none());
    assert!(scene.remove(copy).is_none());
    assert_eq!(scene.len(), 0);
}

#[test]
fn recycled_slot_does_not_alias_the_old_id() {
    let mut scene = Scene::new();
    let old = scene.spawn(actor());
    scene.remove(old);
    let new = scene.spawn(actor().with_transform(Mat4::from_translation(Vec3::Y)));
    // Same slot, different generation.
    assert_ne!(old, new);
    assert!(scene.get(old).is_none());
    assert_eq!(scene.get(new).unwrap().position(), Vec3::Y);
}

#[test]
fn invalid_id_never_resolves() {
    let mut scene = Scene::new();
    scene.spawn(actor());
    assert!(scene.get(ActorId::INVALID).is_none());
    assert!(!scene.contains(ActorId::INVALID));
}

#[test]
fn iteration_skips_removed_slots() {
    let mut scene = Scene::new();
    let a = scene.spawn(actor());
    let b = scene.spawn(actor());
    let c = scene.spawn(actor());
    scene.remove(b);
    let ids: Vec<ActorId> = scene.iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![a, c]);
    assert_eq!(scene.len(), 2);
}

#[test]
fn scale_round_trips_through_the_transform() {
    let mut scene = Scene::new();
    let id = scene.spawn(actor());
    let a = scene.get_mut(id).unwrap();
    a.set_scale(Vec3::new(1.0, 0.4, 1.0));
    assert!((a.scale().y - 0.4).abs() < 1e-6);
    // Position is untouched by scale edits.
    assert_eq!(a.position(), Vec3::ZERO);
}
