//! Zone definitions as they arrive from data files.

use serde::{Deserialize, Serialize};

use crate::generation::GeneratorConfig;
use crate::tilemap::Coord;

/// Generator id of the cellular cave pipeline, the only one registered.
pub const CELLULAR_GENERATOR: &str = "cellular";

/// Whether a zone's terrain is hand-authored or procedural.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    #[default]
    Static,
    Generated,
}

/// Declarative description of a zone.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneDefinition {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: ZoneKind,
    /// Overrides the generator config dimensions for generated zones
    #[serde(default)]
    pub width: Option<usize>,
    #[serde(default)]
    pub height: Option<usize>,
    /// Rows of `#`, `.` and `L` for static zones
    #[serde(default)]
    pub layout: Option<Vec<String>>,
    /// Generator id for generated zones (defaults to the cellular pipeline)
    #[serde(default)]
    pub generator: Option<String>,
    #[serde(default)]
    pub generator_config: Option<GeneratorConfig>,
    /// Spawn-table template shared by several zones
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub entry_spawn: Option<Coord>,
}

impl ZoneDefinition {
    /// A static zone from layout rows.
    pub fn from_layout(id: impl Into<String>, rows: &[&str]) -> Self {
        Self {
            id: id.into(),
            kind: ZoneKind::Static,
            layout: Some(rows.iter().map(|r| r.to_string()).collect()),
            ..Self::default()
        }
    }

    /// A generated zone using the cellular pipeline.
    pub fn generated(id: impl Into<String>, config: GeneratorConfig) -> Self {
        Self {
            id: id.into(),
            kind: ZoneKind::Generated,
            generator: Some(CELLULAR_GENERATOR.to_string()),
            generator_config: Some(config),
            ..Self::default()
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Load a list of definitions from a JSON array.
    pub fn list_from_json(json: &str) -> serde_json::Result<Vec<ZoneDefinition>> {
        serde_json::from_str(json)
    }
}
