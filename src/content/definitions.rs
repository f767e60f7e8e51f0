//! Content definitions: the static data behind each `defId`.
//!
//! The engine only reads definitions through the [`ContentDefinitions`] trait;
//! where the data lives is up to the caller. [`ContentRegistry`] is the plain
//! in-memory implementation, loadable from JSON.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{ContentKind, ContentState};

/// Static data for one piece of content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDefinition {
    pub def_id: String,
    pub kind: ContentKind,
    pub name: String,
    /// Initial state copied into every new instance
    #[serde(default)]
    pub state_defaults: ContentState,
    #[serde(default)]
    pub loot_table_id: Option<String>,
}

/// Lookup of content definitions by kind and id.
pub trait ContentDefinitions {
    fn definition(&self, kind: ContentKind, def_id: &str) -> Option<&ContentDefinition>;
}

/// In-memory definition registry.
#[derive(Clone, Debug, Default)]
pub struct ContentRegistry {
    definitions: HashMap<(ContentKind, String), ContentDefinition>,
}

impl ContentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, definition: ContentDefinition) {
        self.definitions
            .insert((definition.kind, definition.def_id.clone()), definition);
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Build a registry from a JSON array of definitions.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let list: Vec<ContentDefinition> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for definition in list {
            registry.insert(definition);
        }
        Ok(registry)
    }
}

impl ContentDefinitions for ContentRegistry {
    fn definition(&self, kind: ContentKind, def_id: &str) -> Option<&ContentDefinition> {
        self.definitions.get(&(kind, def_id.to_string()))
    }
}
