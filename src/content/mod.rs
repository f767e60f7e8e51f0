//! Zone content: resource nodes, entities, points of interest and locations.
//!
//! Instances are created once, when a zone is populated, and never removed.
//! A harvested node or a defeated entity stays in the list with its state
//! flag set; that is what lets a sparse delta reproduce the zone later.

pub mod definitions;
pub mod populate;
pub mod spawn_table;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tilemap::Coord;

pub use definitions::{ContentDefinition, ContentDefinitions, ContentRegistry};
pub use populate::{populate_zone, PopulationOutcome};
pub use spawn_table::{SpawnEntry, SpawnTable, SpawnTableRegistry, ZoneSpawnTables};

/// Category of a content instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContentKind {
    #[serde(rename = "resourceNodes")]
    ResourceNode,
    #[serde(rename = "entities")]
    Entity,
    #[serde(rename = "pois")]
    Poi,
    #[serde(rename = "locations")]
    Location,
}

impl ContentKind {
    /// Population order.
    pub const ALL: [ContentKind; 4] = [
        ContentKind::ResourceNode,
        ContentKind::Entity,
        ContentKind::Poi,
        ContentKind::Location,
    ];

    /// Collection key, also the prefix of instance ids.
    pub fn key(&self) -> &'static str {
        match self {
            ContentKind::ResourceNode => "resourceNodes",
            ContentKind::Entity => "entities",
            ContentKind::Poi => "pois",
            ContentKind::Location => "locations",
        }
    }

    /// Map glyph used by the ASCII renderer.
    pub fn glyph(&self) -> char {
        match self {
            ContentKind::ResourceNode => '*',
            ContentKind::Entity => 'e',
            ContentKind::Poi => '!',
            ContentKind::Location => '>',
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Quality tier of a harvested resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Crude,
    Common,
    Fine,
    Superior,
    Masterwork,
}

impl QualityTier {
    /// Tiers with their roll weights.
    pub const WEIGHTED: [(QualityTier, f64); 5] = [
        (QualityTier::Crude, 20.0),
        (QualityTier::Common, 50.0),
        (QualityTier::Fine, 20.0),
        (QualityTier::Superior, 8.0),
        (QualityTier::Masterwork, 2.0),
    ];

    pub fn code(&self) -> &'static str {
        match self {
            QualityTier::Crude => "crude",
            QualityTier::Common => "common",
            QualityTier::Fine => "fine",
            QualityTier::Superior => "superior",
            QualityTier::Masterwork => "masterwork",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::WEIGHTED
            .iter()
            .map(|(tier, _)| *tier)
            .find(|tier| tier.code() == code)
    }
}

/// Mutable per-instance state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentState {
    pub harvested: bool,
    pub defeated: bool,
    pub opened: bool,
    pub inspected: bool,
    pub discovered: bool,
    /// Harvests left before a node is exhausted; `None` means single use
    pub charges_left: Option<u32>,
}

impl ContentState {
    /// Whether the instance is "gone" for gameplay purposes.
    pub fn is_spent(&self, kind: ContentKind) -> bool {
        match kind {
            ContentKind::ResourceNode => self.harvested,
            ContentKind::Entity => self.defeated,
            ContentKind::Poi => self.opened,
            ContentKind::Location => false,
        }
    }
}

/// A placed piece of content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentInstance {
    pub id: String,
    pub def_id: String,
    pub kind: ContentKind,
    pub x: usize,
    pub y: usize,
    pub state: ContentState,
    #[serde(default)]
    pub quality: Option<QualityTier>,
}

impl ContentInstance {
    pub fn new(kind: ContentKind, def_id: &str, at: Coord, defaults: &ContentState) -> Self {
        Self {
            id: instance_id(kind, def_id, at),
            def_id: def_id.to_string(),
            kind,
            x: at.x,
            y: at.y,
            state: defaults.clone(),
            quality: None,
        }
    }

    pub fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

/// Deterministic instance id: `{kind}_{defId}_{x}_{y}`.
pub fn instance_id(kind: ContentKind, def_id: &str, at: Coord) -> String {
    format!("{}_{}_{}_{}", kind.key(), def_id, at.x, at.y)
}

/// All content of a zone, one list per kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZoneContent {
    pub resource_nodes: Vec<ContentInstance>,
    pub entities: Vec<ContentInstance>,
    pub pois: Vec<ContentInstance>,
    pub locations: Vec<ContentInstance>,
}

impl ZoneContent {
    pub fn list(&self, kind: ContentKind) -> &[ContentInstance] {
        match kind {
            ContentKind::ResourceNode => &self.resource_nodes,
            ContentKind::Entity => &self.entities,
            ContentKind::Poi => &self.pois,
            ContentKind::Location => &self.locations,
        }
    }

    pub fn list_mut(&mut self, kind: ContentKind) -> &mut Vec<ContentInstance> {
        match kind {
            ContentKind::ResourceNode => &mut self.resource_nodes,
            ContentKind::Entity => &mut self.entities,
            ContentKind::Poi => &mut self.pois,
            ContentKind::Location => &mut self.locations,
        }
    }

    /// True when every list is empty.
    pub fn is_empty(&self) -> bool {
        ContentKind::ALL.iter().all(|k| self.list(*k).is_empty())
    }

    pub fn len(&self) -> usize {
        ContentKind::ALL.iter().map(|k| self.list(*k).len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContentInstance> {
        ContentKind::ALL.into_iter().flat_map(move |k| self.list(k).iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ContentInstance> {
        self.resource_nodes
            .iter_mut()
            .chain(self.entities.iter_mut())
            .chain(self.pois.iter_mut())
            .chain(self.locations.iter_mut())
    }

    pub fn find(&self, id: &str) -> Option<&ContentInstance> {
        self.iter().find(|i| i.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut ContentInstance> {
        self.iter_mut().find(|i| i.id == id)
    }

    pub fn at(&self, c: Coord) -> Option<&ContentInstance> {
        self.iter().find(|i| i.coord() == c)
    }
}
