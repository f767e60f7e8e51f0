//! Engine configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ZoneResult;
use crate::generation::GeneratorConfig;

/// Engine-wide settings, loadable from a JSON file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Generator parameters for zones that only give their size.
    pub generator: GeneratorConfig,

    /// Baseline walkable-tile count for scaled spawn tables that do not set
    /// their own (default: 400).
    pub spawn_base_tiles: usize,

    /// Milliseconds between exploration ticks (default: 250).
    pub explore_tick_ms: u64,

    /// Milliseconds between movement steps (default: 120).
    pub move_tick_ms: u64,

    /// Log filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            spawn_base_tiles: 400,
            explore_tick_ms: 250,
            move_tick_ms: 120,
            log_filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Read a config file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> ZoneResult<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> ZoneResult<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
