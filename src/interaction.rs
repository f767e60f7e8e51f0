//! Player interactions with zone content.
//!
//! Every interaction flips a state flag on the instance and records the same
//! flag in the zone's delta, so replaying the delta after regeneration gives
//! back the same zone. Loot resolution, inventory and the message log belong
//! to the caller and are reached through the traits below.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::content::{ContentDefinitions, ContentInstance, ContentKind, QualityTier};
use crate::delta::DeltaStore;
use crate::error::{ZoneError, ZoneResult};
use crate::seeds::{SeedPurpose, ZoneSeeds};
use crate::zone::{Zone, LOCKED_REGION_ID};

/// One stack of items produced by a loot roll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LootDrop {
    pub item_id: String,
    pub qty: u32,
}

/// Resolves a loot table into drops. The seed key is stable per instance
/// and per use, so the same action always yields the same drops.
pub trait LootRoller {
    fn roll(&mut self, loot_table_id: &str, seed_key: &str) -> Vec<LootDrop>;
}

/// Receives items the player picked up.
pub trait InventorySink {
    fn add_item(&mut self, drop: &LootDrop);
}

/// Receives player-facing messages.
pub trait MessageLog {
    fn message(&mut self, text: &str);
}

/// Collaborators an interaction needs.
pub struct InteractionContext<'a> {
    pub definitions: &'a dyn ContentDefinitions,
    pub loot: &'a mut dyn LootRoller,
    pub inventory: &'a mut dyn InventorySink,
    pub log: &'a mut dyn MessageLog,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteractionOutcome {
    Harvested {
        drops: Vec<LootDrop>,
        quality: Option<QualityTier>,
        /// No charges left; the node is now flagged harvested
        exhausted: bool,
    },
    Defeated,
    Opened { drops: Vec<LootDrop> },
    Inspected,
    Discovered,
    Unlocked,
    /// The instance (or region) was already in the target state.
    AlreadyDone,
    /// The zone has no locked region.
    NoLockedRegion,
}

fn find_mut<'z>(zone: &'z mut Zone, kind: ContentKind, id: &str) -> ZoneResult<&'z mut ContentInstance> {
    zone.content
        .list_mut(kind)
        .iter_mut()
        .find(|i| i.id == id)
        .ok_or_else(|| ZoneError::UnknownInstance(id.to_string()))
}

fn display_name(ctx: &InteractionContext<'_>, instance: &ContentInstance) -> String {
    ctx.definitions
        .definition(instance.kind, &instance.def_id)
        .map(|d| d.name.clone())
        .unwrap_or_else(|| instance.def_id.clone())
}

/// Roll loot for an instance and hand it to the inventory.
fn roll_loot(
    ctx: &mut InteractionContext<'_>,
    seeds: &ZoneSeeds,
    instance: &ContentInstance,
    use_index: u32,
) -> Vec<LootDrop> {
    let Some(table) = ctx
        .definitions
        .definition(instance.kind, &instance.def_id)
        .and_then(|d| d.loot_table_id.clone())
    else {
        return Vec::new();
    };

    let seed_key = format!("{}:{}:{}", seeds.seed_string(SeedPurpose::Loot), instance.id, use_index);
    let drops = ctx.loot.roll(&table, &seed_key);
    for drop in &drops {
        ctx.inventory.add_item(drop);
        ctx.log.message(&format!("Received {} x{}", drop.item_id, drop.qty));
    }
    drops
}

/// Harvest a resource node once.
///
/// Each harvest uses up a charge; the node is flagged harvested when the last
/// charge goes (immediately, for single-use nodes). The quality tier is
/// rolled on the first harvest from the instance's own quality stream and
/// then kept.
pub fn harvest(
    zone: &mut Zone,
    deltas: &mut DeltaStore,
    ctx: &mut InteractionContext<'_>,
    instance_id: &str,
) -> ZoneResult<InteractionOutcome> {
    let zone_id = zone.id.clone();
    let seeds = ZoneSeeds::new(zone.world_seed.as_str(), zone.id.as_str());
    let node = find_mut(zone, ContentKind::ResourceNode, instance_id)?;
    if node.state.harvested {
        return Ok(InteractionOutcome::AlreadyDone);
    }

    let use_index = node.state.charges_left.unwrap_or(0);
    let exhausted = match node.state.charges_left {
        Some(n) if n > 1 => {
            node.state.charges_left = Some(n - 1);
            false
        }
        Some(_) => {
            node.state.charges_left = Some(0);
            true
        }
        None => true,
    };
    if exhausted {
        node.state.harvested = true;
        deltas.record_harvested(&zone_id, instance_id);
    }

    if node.quality.is_none() {
        let mut rng = seeds.rng_for(SeedPurpose::Quality, instance_id);
        if let Some((tier, _)) = rng.weighted_pick(&QualityTier::WEIGHTED, |(_, w)| *w) {
            node.quality = Some(*tier);
            deltas.record_quality(&zone_id, instance_id, *tier);
        }
    }
    let quality = node.quality;

    let node = node.clone();
    let name = display_name(ctx, &node);
    ctx.log.message(&format!("You harvest the {}.", name));
    let drops = roll_loot(ctx, &seeds, &node, use_index);
    if exhausted {
        ctx.log.message(&format!("The {} is depleted.", name));
    }

    debug!(zone_id = %zone_id, instance = %instance_id, exhausted, "harvested");
    Ok(InteractionOutcome::Harvested { drops, quality, exhausted })
}

/// Flag an entity as defeated. Combat itself happens elsewhere.
pub fn mark_defeated(
    zone: &mut Zone,
    deltas: &mut DeltaStore,
    ctx: &mut InteractionContext<'_>,
    instance_id: &str,
) -> ZoneResult<InteractionOutcome> {
    let zone_id = zone.id.clone();
    let entity = find_mut(zone, ContentKind::Entity, instance_id)?;
    if entity.state.defeated {
        return Ok(InteractionOutcome::AlreadyDone);
    }
    entity.state.defeated = true;
    deltas.record_defeated(&zone_id, instance_id);

    let entity = entity.clone();
    ctx.log.message(&format!("The {} is defeated.", display_name(ctx, &entity)));
    Ok(InteractionOutcome::Defeated)
}

/// Open a point of interest. Its loot is rolled exactly once.
pub fn open(
    zone: &mut Zone,
    deltas: &mut DeltaStore,
    ctx: &mut InteractionContext<'_>,
    instance_id: &str,
) -> ZoneResult<InteractionOutcome> {
    let zone_id = zone.id.clone();
    let seeds = ZoneSeeds::new(zone.world_seed.as_str(), zone.id.as_str());
    let poi = find_mut(zone, ContentKind::Poi, instance_id)?;
    if poi.state.opened {
        return Ok(InteractionOutcome::AlreadyDone);
    }
    poi.state.opened = true;
    deltas.record_opened(&zone_id, instance_id);

    let poi = poi.clone();
    ctx.log.message(&format!("You open the {}.", display_name(ctx, &poi)));
    let drops = roll_loot(ctx, &seeds, &poi, 0);
    Ok(InteractionOutcome::Opened { drops })
}

/// Inspect any instance.
pub fn inspect(
    zone: &mut Zone,
    deltas: &mut DeltaStore,
    ctx: &mut InteractionContext<'_>,
    instance_id: &str,
) -> ZoneResult<InteractionOutcome> {
    let zone_id = zone.id.clone();
    let instance = zone
        .content
        .find_mut(instance_id)
        .ok_or_else(|| ZoneError::UnknownInstance(instance_id.to_string()))?;
    if instance.state.inspected {
        return Ok(InteractionOutcome::AlreadyDone);
    }
    instance.state.inspected = true;
    deltas.record_inspected(&zone_id, instance_id);

    let instance = instance.clone();
    ctx.log.message(&format!("You look over the {}.", display_name(ctx, &instance)));
    Ok(InteractionOutcome::Inspected)
}

/// Mark a location as discovered.
pub fn discover(
    zone: &mut Zone,
    deltas: &mut DeltaStore,
    ctx: &mut InteractionContext<'_>,
    instance_id: &str,
) -> ZoneResult<InteractionOutcome> {
    let zone_id = zone.id.clone();
    let location = find_mut(zone, ContentKind::Location, instance_id)?;
    if location.state.discovered {
        return Ok(InteractionOutcome::AlreadyDone);
    }
    location.state.discovered = true;
    deltas.record_discovered(&zone_id, instance_id);

    let location = location.clone();
    ctx.log.message(&format!("Discovered: {}.", display_name(ctx, &location)));
    Ok(InteractionOutcome::Discovered)
}

/// Open the zone's locked region and record it.
pub fn unlock_gate(
    zone: &mut Zone,
    deltas: &mut DeltaStore,
    log: &mut dyn MessageLog,
) -> InteractionOutcome {
    match zone.locked_region(LOCKED_REGION_ID) {
        None => return InteractionOutcome::NoLockedRegion,
        Some(region) if region.unlocked => return InteractionOutcome::AlreadyDone,
        Some(_) => {}
    }

    zone.unlock_region(LOCKED_REGION_ID);
    deltas.record_unlocked(&zone.id, LOCKED_REGION_ID);
    log.message("The gate swings open.");
    info!(zone_id = %zone.id, "locked region opened");
    InteractionOutcome::Unlocked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentDefinition, ContentRegistry, ContentState};
    use crate::tilemap::Coord;
    use crate::zone::{build_zone, TileKind, ZoneDefinition};

    #[derive(Default)]
    struct FixedLoot {
        keys: Vec<String>,
    }

    impl LootRoller for FixedLoot {
        fn roll(&mut self, loot_table_id: &str, seed_key: &str) -> Vec<LootDrop> {
            self.keys.push(seed_key.to_string());
            vec![LootDrop { item_id: format!("{loot_table_id}_item"), qty: 1 }]
        }
    }

    #[derive(Default)]
    struct Bag(Vec<LootDrop>);

    impl InventorySink for Bag {
        fn add_item(&mut self, drop: &LootDrop) {
            self.0.push(drop.clone());
        }
    }

    #[derive(Default)]
    struct Log(Vec<String>);

    impl MessageLog for Log {
        fn message(&mut self, text: &str) {
            self.0.push(text.to_string());
        }
    }

    fn registry() -> ContentRegistry {
        let mut defs = ContentRegistry::new();
        defs.insert(ContentDefinition {
            def_id: "oak_tree".into(),
            kind: ContentKind::ResourceNode,
            name: "Oak Tree".into(),
            state_defaults: ContentState { charges_left: Some(2), ..ContentState::default() },
            loot_table_id: Some("wood".into()),
        });
        defs.insert(ContentDefinition {
            def_id: "chest".into(),
            kind: ContentKind::Poi,
            name: "Chest".into(),
            state_defaults: ContentState::default(),
            loot_table_id: Some("chest".into()),
        });
        defs
    }

    fn zone(defs: &ContentRegistry) -> Zone {
        let def = ZoneDefinition::from_layout(
            "glade",
            &["#########", "#...#...#", "#...L...#", "#...#...#", "#########"],
        );
        let mut zone = build_zone(&def, "w").unwrap();
        for (kind, def_id, x, y) in [
            (ContentKind::ResourceNode, "oak_tree", 2, 1),
            (ContentKind::Poi, "chest", 2, 3),
            (ContentKind::Entity, "rat", 3, 3),
            (ContentKind::Location, "exit", 1, 3),
        ] {
            let defaults = defs
                .definition(kind, def_id)
                .map(|d| d.state_defaults.clone())
                .unwrap_or_default();
            zone.content
                .list_mut(kind)
                .push(ContentInstance::new(kind, def_id, Coord::new(x, y), &defaults));
        }
        zone
    }

    #[test]
    fn test_harvest_uses_charges_then_exhausts() {
        let defs = registry();
        let mut zone = zone(&defs);
        let mut deltas = DeltaStore::new();
        let (mut loot, mut bag, mut log) = (FixedLoot::default(), Bag::default(), Log::default());
        let mut ctx = InteractionContext {
            definitions: &defs,
            loot: &mut loot,
            inventory: &mut bag,
            log: &mut log,
        };
        let id = "resourceNodes_oak_tree_2_1";

        let first = harvest(&mut zone, &mut deltas, &mut ctx, id).unwrap();
        let InteractionOutcome::Harvested { quality, exhausted, .. } = first else {
            panic!("expected a harvest");
        };
        assert!(!exhausted);
        assert!(quality.is_some());
        assert!(deltas.zone("glade").unwrap().harvested.is_empty());

        let second = harvest(&mut zone, &mut deltas, &mut ctx, id).unwrap();
        assert!(matches!(second, InteractionOutcome::Harvested { exhausted: true, quality: q, .. } if q == quality));
        assert!(deltas.zone("glade").unwrap().harvested.contains(id));
        assert_eq!(harvest(&mut zone, &mut deltas, &mut ctx, id).unwrap(), InteractionOutcome::AlreadyDone);

        assert_eq!(bag.0.len(), 2);
        assert_ne!(loot.keys[0], loot.keys[1]);
    }

    #[test]
    fn test_quality_is_deterministic() {
        let defs = registry();
        let id = "resourceNodes_oak_tree_2_1";
        let mut tiers = Vec::new();
        for _ in 0..2 {
            let mut zone = zone(&defs);
            let mut deltas = DeltaStore::new();
            let (mut loot, mut bag, mut log) = (FixedLoot::default(), Bag::default(), Log::default());
            let mut ctx = InteractionContext {
                definitions: &defs,
                loot: &mut loot,
                inventory: &mut bag,
                log: &mut log,
            };
            harvest(&mut zone, &mut deltas, &mut ctx, id).unwrap();
            tiers.push(deltas.zone("glade").unwrap().qualities[id]);
        }
        assert_eq!(tiers[0], tiers[1]);
    }

    #[test]
    fn test_open_rolls_once_and_wrong_kind_is_unknown() {
        let defs = registry();
        let mut zone = zone(&defs);
        let mut deltas = DeltaStore::new();
        let (mut loot, mut bag, mut log) = (FixedLoot::default(), Bag::default(), Log::default());
        let mut ctx = InteractionContext {
            definitions: &defs,
            loot: &mut loot,
            inventory: &mut bag,
            log: &mut log,
        };

        let opened = open(&mut zone, &mut deltas, &mut ctx, "pois_chest_2_3").unwrap();
        assert_eq!(
            opened,
            InteractionOutcome::Opened { drops: vec![LootDrop { item_id: "chest_item".into(), qty: 1 }] }
        );
        assert_eq!(open(&mut zone, &mut deltas, &mut ctx, "pois_chest_2_3").unwrap(), InteractionOutcome::AlreadyDone);
        assert!(matches!(
            open(&mut zone, &mut deltas, &mut ctx, "entities_rat_3_3"),
            Err(ZoneError::UnknownInstance(_))
        ));
        assert_eq!(bag.0.len(), 1);
    }

    #[test]
    fn test_flags_recorded_in_delta() {
        let defs = registry();
        let mut zone = zone(&defs);
        let mut deltas = DeltaStore::new();
        let (mut loot, mut bag, mut log) = (FixedLoot::default(), Bag::default(), Log::default());
        let mut ctx = InteractionContext {
            definitions: &defs,
            loot: &mut loot,
            inventory: &mut bag,
            log: &mut log,
        };

        mark_defeated(&mut zone, &mut deltas, &mut ctx, "entities_rat_3_3").unwrap();
        discover(&mut zone, &mut deltas, &mut ctx, "locations_exit_1_3").unwrap();
        inspect(&mut zone, &mut deltas, &mut ctx, "pois_chest_2_3").unwrap();
        assert_eq!(
            inspect(&mut zone, &mut deltas, &mut ctx, "pois_chest_2_3").unwrap(),
            InteractionOutcome::AlreadyDone
        );

        let delta = deltas.zone("glade").unwrap();
        assert!(delta.defeated.contains("entities_rat_3_3"));
        assert!(delta.discovered_locations.contains("locations_exit_1_3"));
        assert!(delta.inspected.contains("pois_chest_2_3"));
        // Rat has no definition; its def id is used as the name
        assert!(log.0.iter().any(|m| m.contains("rat")));
    }

    #[test]
    fn test_unlock_gate() {
        let defs = registry();
        let mut zone = zone(&defs);
        let mut deltas = DeltaStore::new();
        let mut log = Log::default();

        assert_eq!(unlock_gate(&mut zone, &mut deltas, &mut log), InteractionOutcome::Unlocked);
        assert_eq!(zone.kind_at(Coord::new(4, 2)), Some(TileKind::Walkable));
        assert!(deltas.zone("glade").unwrap().unlocked_regions.contains("1"));
        assert_eq!(unlock_gate(&mut zone, &mut deltas, &mut log), InteractionOutcome::AlreadyDone);

        let mut open_zone = build_zone(&ZoneDefinition::from_layout("o", &["###", "#.#", "###"]), "w").unwrap();
        assert_eq!(unlock_gate(&mut open_zone, &mut deltas, &mut log), InteractionOutcome::NoLockedRegion);
    }
}
