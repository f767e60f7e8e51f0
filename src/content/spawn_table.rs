//! Spawn tables: how many of each content kind a zone gets, and which ones.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::seeds::SeededRng;

use super::ContentKind;

/// One weighted candidate in a spawn table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnEntry {
    pub def_id: String,
    pub weight: f64,
}

/// Spawn rules for a single content kind.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpawnTable {
    /// Fixed count, used when no range is given
    pub count: Option<usize>,
    /// Inclusive `[min, max]` count rolled per population
    pub count_range: Option<[usize; 2]>,
    /// Scale the count by walkable tiles relative to `base_tiles`
    pub scale_by_zone_size: bool,
    pub base_tiles: Option<usize>,
    pub min_count: Option<usize>,
    pub max_count: Option<usize>,
    pub entries: Vec<SpawnEntry>,
}

impl SpawnTable {
    /// Number of instances to place.
    ///
    /// A ranged count consumes one draw; a fixed count consumes none. When
    /// scaling is on the count is multiplied by `walkable / base_tiles` and
    /// rounded; the result is clamped to `[min_count, max_count]`.
    pub fn target_count(&self, walkable: usize, default_base_tiles: usize, rng: &mut SeededRng) -> usize {
        let base = match self.count_range {
            Some([lo, hi]) => rng.gen_range(lo.min(hi)..=lo.max(hi)),
            None => self.count.unwrap_or(0),
        };

        let scaled = if self.scale_by_zone_size {
            let baseline = self.base_tiles.unwrap_or(default_base_tiles).max(1);
            (base as f64 * walkable as f64 / baseline as f64).round() as usize
        } else {
            base
        };

        let lo = self.min_count.unwrap_or(0);
        let hi = self.max_count.unwrap_or(usize::MAX).max(lo);
        scaled.clamp(lo, hi)
    }
}

/// Spawn tables for every kind in one zone (or zone template).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZoneSpawnTables {
    pub resource_nodes: Option<SpawnTable>,
    pub entities: Option<SpawnTable>,
    pub pois: Option<SpawnTable>,
    pub locations: Option<SpawnTable>,
}

impl ZoneSpawnTables {
    pub fn get(&self, kind: ContentKind) -> Option<&SpawnTable> {
        match kind {
            ContentKind::ResourceNode => self.resource_nodes.as_ref(),
            ContentKind::Entity => self.entities.as_ref(),
            ContentKind::Poi => self.pois.as_ref(),
            ContentKind::Location => self.locations.as_ref(),
        }
    }
}

/// Spawn tables keyed by template id or zone id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpawnTableRegistry {
    tables: HashMap<String, ZoneSpawnTables>,
}

impl SpawnTableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, tables: ZoneSpawnTables) {
        self.tables.insert(key.into(), tables);
    }

    /// Resolve by template id first, then zone id. `None` means the zone
    /// simply has no content.
    pub fn resolve(&self, template_id: Option<&str>, zone_id: &str) -> Option<&ZoneSpawnTables> {
        template_id
            .and_then(|t| self.tables.get(t))
            .or_else(|| self.tables.get(zone_id))
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
