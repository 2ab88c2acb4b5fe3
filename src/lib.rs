//! Lamp Crusher: deferred renderer, skeletal animation, and squish physics.

pub mod anim;
pub mod assets;
pub mod client;
pub mod core;
pub mod game;
pub mod gfx;
pub mod physics;
pub mod platform_winit;
pub mod scene;
