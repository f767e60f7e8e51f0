//! Seeded content population.
//!
//! Walks the kinds in a fixed order, shuffles the walkable tiles for each one
//! and fills free tiles with weighted picks from the zone's spawn table. All
//! draws come from the zone's loot stream, so the same world seed and zone id
//! always give the same instance ids at the same coordinates.

use std::collections::{BTreeMap, HashSet};

use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::seeds::{SeedPurpose, ZoneSeeds};
use crate::tilemap::Coord;
use crate::zone::Zone;

use super::definitions::ContentDefinitions;
use super::spawn_table::SpawnTableRegistry;
use super::{ContentInstance, ContentKind, ContentState};

/// What a population call did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PopulationOutcome {
    /// The zone already had content; nothing changed.
    AlreadyPopulated,
    /// No spawn table for the zone's template or id; content stays empty.
    NoSpawnTable,
    /// Instances placed, per kind.
    Populated(BTreeMap<ContentKind, usize>),
}

/// Populate a zone's content from its spawn tables.
///
/// `default_base_tiles` is the baseline walkable count for scaled tables that
/// do not name their own.
pub fn populate_zone(
    zone: &mut Zone,
    tables: &SpawnTableRegistry,
    definitions: &dyn ContentDefinitions,
    default_base_tiles: usize,
) -> PopulationOutcome {
    if !zone.content.is_empty() {
        return PopulationOutcome::AlreadyPopulated;
    }

    let Some(zone_tables) = tables.resolve(zone.template_id.as_deref(), &zone.id) else {
        debug!(zone_id = %zone.id, "no spawn table; zone stays empty");
        return PopulationOutcome::NoSpawnTable;
    };

    let seeds = ZoneSeeds::new(zone.world_seed.as_str(), zone.id.as_str());
    let mut rng = seeds.rng(SeedPurpose::Loot);

    let walkable = zone.walkable_tiles();
    let mut used: HashSet<Coord> = HashSet::new();
    used.insert(zone.entry_spawn);

    let mut placed = BTreeMap::new();
    for kind in ContentKind::ALL {
        let Some(table) = zone_tables.get(kind) else {
            continue;
        };

        let target = table.target_count(walkable.len(), default_base_tiles, &mut rng);
        if target == 0 || table.entries.is_empty() {
            placed.insert(kind, 0);
            continue;
        }

        let mut candidates = walkable.clone();
        candidates.shuffle(&mut rng);

        let mut instances = Vec::with_capacity(target);
        for c in candidates {
            if instances.len() >= target {
                break;
            }
            if used.contains(&c) {
                continue;
            }
            let Some(entry) = rng.weighted_pick(&table.entries, |e| e.weight) else {
                break;
            };

            let defaults = definitions
                .definition(kind, &entry.def_id)
                .map(|d| d.state_defaults.clone())
                .unwrap_or_else(ContentState::default);
            instances.push(ContentInstance::new(kind, &entry.def_id, c, &defaults));
            used.insert(c);
        }

        placed.insert(kind, instances.len());
        *zone.content.list_mut(kind) = instances;
    }

    info!(zone_id = %zone.id, placed = ?placed, "zone populated");
    PopulationOutcome::Populated(placed)
}
