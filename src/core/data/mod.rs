//! core::data — serde-friendly schemas and loaders for authorable game data.
//!
//! Loaders read from the top-level `data/` directory.

pub mod loader;
pub mod tuning;
