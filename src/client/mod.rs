//! Client runtime systems: input state, the lamp controller, and camera
//! follow.
//!
//! This module ties platform input to in-world character movement and camera
//! control. It stays decoupled from rendering and simulation: the controller
//! only mutates actor intents, and the physics step consumes them.

pub mod controller;
pub mod input;
