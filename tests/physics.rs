//! Cross-module physics scenarios: stomp, crush, and push-out behavior of
//! `fixed_update` against a real scene.

use glam::{Mat4, Vec3};
use lamp_crusher::gfx::MeshHandle;
use lamp_crusher::physics::{PhysicsConfig, PhysicsEngine, SimEvent};
use lamp_crusher::scene::{Aabb, Actor, Material, Scene, SoftBody};

const STEP: f64 = 0.006; // timestep * time_scale, one sub-step of wall clock

fn rigid_lamp(pos: Vec3) -> Actor {
    let mut a = Actor::new(MeshHandle::PLACEHOLDER, Material::default(), Aabb::UNIT)
        .with_transform(Mat4::from_translation(pos));
    a.mass = 0.2;
    a
}

fn soft_letter(pos: Vec3) -> Actor {
    let mut a = Actor::new(MeshHandle::PLACEHOLDER, Material::default(), Aabb::UNIT)
        .with_transform(Mat4::from_translation(pos));
    a.mass = 1.0;
    a.spring = Some(SoftBody {
        ks: 120.0,
        kd: 6.0,
        rest_factor: 1.0,
        rest_height: 1.0,
    });
    a
}

/// Place the rigid body overlapping the letter mid-fall so the next sub-step
/// registers a stomp.
fn arm_stomp(scene: &mut Scene, rigid: lamp_crusher::scene::ActorId) {
    let a = scene.get_mut(rigid).unwrap();
    a.set_position(Vec3::new(0.0, 0.5, 0.0));
    a.velocity = Vec3::new(0.0, -1.0, 0.0);
}

#[test]
fn stomp_grants_upward_impulse_and_reduces_rest_factor() {
    let mut scene = Scene::new();
    let rigid = scene.spawn(rigid_lamp(Vec3::new(0.0, 0.5, 0.0)));
    let letter = scene.spawn(soft_letter(Vec3::ZERO));
    scene.get_mut(rigid).unwrap().velocity = Vec3::new(0.0, -1.0, 0.0);

    let mut engine = PhysicsEngine::new(PhysicsConfig::default());
    let events = engine.fixed_update(&mut scene, STEP - 0.001);

    let stomps: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            SimEvent::Stomped { rest_factor, .. } => Some(*rest_factor),
            _ => None,
        })
        .collect();
    assert_eq!(stomps.len(), 1, "expected exactly one stomp, got {events:?}");
    assert!((stomps[0] - 0.67).abs() < 1e-3);
    assert!(scene.get(rigid).unwrap().velocity.y > 0.3);
    assert!(scene.contains(letter));
}

#[test]
fn crush_happens_on_the_third_stomp_with_one_removal_event() {
    let mut scene = Scene::new();
    let rigid = scene.spawn(rigid_lamp(Vec3::new(0.0, 0.5, 0.0)));
    let letter = scene.spawn(soft_letter(Vec3::ZERO));

    let mut engine = PhysicsEngine::new(PhysicsConfig::default());
    let mut crushes = 0;
    let mut stomps = 0;
    for i in 0..3 {
        arm_stomp(&mut scene, rigid);
        let target = (i + 1) as f64 * STEP - 0.001;
        for event in engine.fixed_update(&mut scene, target) {
            match event {
                SimEvent::Stomped { .. } => stomps += 1,
                SimEvent::ActorCrushed { soft_body, .. } => {
                    crushes += 1;
                    assert_eq!(soft_body, letter);
                }
                _ => {}
            }
        }
    }

    assert_eq!(stomps, 2);
    assert_eq!(crushes, 1);
    assert!(!scene.contains(letter), "letter should be removed on crush");
}

#[test]
fn end_to_end_fall_onto_letter_bounces_and_softens_it() {
    let mut scene = Scene::new();
    let rigid = scene.spawn(rigid_lamp(Vec3::new(0.0, 5.0, 0.0)));
    let letter = scene.spawn(soft_letter(Vec3::ZERO));
    scene.get_mut(rigid).unwrap().velocity = Vec3::new(0.0, -5.0, 0.0);

    let mut engine = PhysicsEngine::new(PhysicsConfig::default());
    let events = engine.fixed_update(&mut scene, 2.0);

    let stomped: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            SimEvent::Stomped { rest_factor, .. } => Some(*rest_factor),
            _ => None,
        })
        .collect();
    assert_eq!(stomped.len(), 1, "one landing, one stomp: {events:?}");
    assert!((stomped[0] - 0.67).abs() < 1e-3);
    // The bounce leaves the lamp moving upward, well above its initial fall.
    assert!(scene.get(rigid).unwrap().velocity.y > -5.0);
    assert!(scene.contains(letter));
}

#[test]
fn grounded_overlap_pushes_the_rigid_body_out_on_xz() {
    let mut scene = Scene::new();
    let rigid = scene.spawn(rigid_lamp(Vec3::ZERO));
    scene.spawn(soft_letter(Vec3::new(0.5, 0.0, 0.0)));

    let mut engine = PhysicsEngine::new(PhysicsConfig::default());
    engine.fixed_update(&mut scene, STEP - 0.001);

    let pos = scene.get(rigid).unwrap().position();
    assert!(pos.x < 0.0, "rigid body should be pushed away in -X: {pos:?}");
    assert_eq!(pos.z, 0.0);
}

#[test]
fn physics_reports_deltas_without_touching_scene_scalars() {
    let mut scene = Scene::new();
    let rigid = scene.spawn(rigid_lamp(Vec3::new(0.0, 0.5, 0.0)));
    scene.spawn(soft_letter(Vec3::ZERO));
    scene.health = 42.0;
    scene.score = 7;
    arm_stomp(&mut scene, rigid);

    let mut engine = PhysicsEngine::new(PhysicsConfig::default());
    let events = engine.fixed_update(&mut scene, STEP - 0.001);

    assert!(events.iter().any(|e| matches!(e, SimEvent::ScoreDelta(_))));
    assert!(events.iter().any(|e| matches!(e, SimEvent::HealthDelta(_))));
    assert_eq!(scene.health, 42.0);
    assert_eq!(scene.score, 7);
}

#[test]
fn squished_letter_recovers_toward_its_reduced_rest_height() {
    let mut scene = Scene::new();
    // A rigid body must exist for the pairing loop to run; keep it far away.
    scene.spawn(rigid_lamp(Vec3::new(50.0, 0.0, 0.0)));
    let letter = scene.spawn(soft_letter(Vec3::ZERO));
    {
        let a = scene.get_mut(letter).unwrap();
        a.spring.as_mut().unwrap().rest_factor = 0.67;
        a.set_scale(Vec3::new(1.0, 0.2, 1.0));
    }

    let mut engine = PhysicsEngine::new(PhysicsConfig::default());
    engine.fixed_update(&mut scene, 10.0);

    let scale_y = scene.get(letter).unwrap().scale().y;
    assert!(
        (scale_y - 0.67).abs() < 0.03,
        "expected recovery toward 0.67, got {scale_y}"
    );
}
