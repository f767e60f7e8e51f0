//! Zone generation library
//!
//! Deterministic procedural zones: cellular cave terrain, connectivity repair,
//! a single locked gate, seeded content, sparse delta persistence and
//! frontier-driven exploration.

pub mod ascii;
pub mod config;
pub mod content;
pub mod delta;
pub mod error;
pub mod exploration;
pub mod export;
pub mod generation;
pub mod interaction;
pub mod seeds;
pub mod tilemap;
pub mod zone;

pub use config::EngineConfig;
pub use error::{ZoneError, ZoneResult};
pub use zone::{build_zone, Zone, ZoneDefinition};
