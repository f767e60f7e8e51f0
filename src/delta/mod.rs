//! Sparse per-zone state overlay.
//!
//! Zones are never saved whole. A [`ZoneDelta`] remembers only what changed
//! since generation (flags by instance id, explored tiles by coordinate key,
//! rolled quality tiers and opened regions) and is replayed onto a freshly
//! regenerated zone by [`DeltaStore::apply_deltas`]. Because generation is
//! deterministic the ids and coordinates line up again.
//!
//! Loading goes through [`DeltaStore::normalize`], which accepts any JSON
//! value and coerces what it does not understand to empty defaults.

pub mod storage;

use std::collections::{BTreeMap, BTreeSet};

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::content::QualityTier;
use crate::exploration::normalize_explored;
use crate::tilemap::Coord;
use crate::zone::Zone;

pub use storage::DeltaStorage;

/// Current delta layout version.
pub const DELTA_SCHEMA_VERSION: u32 = 1;

/// Set of string keys, persisted as a `key -> true` map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlagSet(BTreeSet<String>);

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key. Returns true if it was not already present.
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.0.insert(key.into())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Lenient read. Objects keep the keys whose value is `true`; arrays keep
    /// their string elements; anything else is empty.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self(
                map.iter()
                    .filter(|(_, v)| v.as_bool() == Some(true))
                    .map(|(k, _)| k.clone())
                    .collect(),
            ),
            Value::Array(items) => Self(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            ),
            Value::Null => Self::default(),
            other => {
                debug!(found = %other, "flag map has an unexpected shape; treated as empty");
                Self::default()
            }
        }
    }
}

impl Serialize for FlagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for key in &self.0 {
            map.serialize_entry(key, &true)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FlagSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

impl<S: Into<String>> FromIterator<S> for FlagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Instance flags a delta can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstanceFlag {
    Harvested,
    Defeated,
    Opened,
    Inspected,
    Discovered,
}

/// Everything that changed in one zone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZoneDelta {
    pub schema_version: u32,
    pub harvested: FlagSet,
    pub defeated: FlagSet,
    pub opened: FlagSet,
    pub inspected: FlagSet,
    pub discovered_locations: FlagSet,
    /// Coordinate keys (`"x,y"`)
    pub explored_tiles: FlagSet,
    pub qualities: BTreeMap<String, QualityTier>,
    /// Region ids as strings
    pub unlocked_regions: FlagSet,
}

impl Default for ZoneDelta {
    fn default() -> Self {
        Self {
            schema_version: DELTA_SCHEMA_VERSION,
            harvested: FlagSet::new(),
            defeated: FlagSet::new(),
            opened: FlagSet::new(),
            inspected: FlagSet::new(),
            discovered_locations: FlagSet::new(),
            explored_tiles: FlagSet::new(),
            qualities: BTreeMap::new(),
            unlocked_regions: FlagSet::new(),
        }
    }
}

impl ZoneDelta {
    pub fn flags(&self, flag: InstanceFlag) -> &FlagSet {
        match flag {
            InstanceFlag::Harvested => &self.harvested,
            InstanceFlag::Defeated => &self.defeated,
            InstanceFlag::Opened => &self.opened,
            InstanceFlag::Inspected => &self.inspected,
            InstanceFlag::Discovered => &self.discovered_locations,
        }
    }

    fn flags_mut(&mut self, flag: InstanceFlag) -> &mut FlagSet {
        match flag {
            InstanceFlag::Harvested => &mut self.harvested,
            InstanceFlag::Defeated => &mut self.defeated,
            InstanceFlag::Opened => &mut self.opened,
            InstanceFlag::Inspected => &mut self.inspected,
            InstanceFlag::Discovered => &mut self.discovered_locations,
        }
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.harvested.is_empty()
            && self.defeated.is_empty()
            && self.opened.is_empty()
            && self.inspected.is_empty()
            && self.discovered_locations.is_empty()
            && self.explored_tiles.is_empty()
            && self.qualities.is_empty()
            && self.unlocked_regions.is_empty()
    }

    /// Coerce an arbitrary JSON value into a delta. Known-good subtrees are
    /// kept; missing or malformed ones become empty. Never fails.
    pub fn normalize(value: &Value) -> Self {
        let mut delta = Self::default();
        let Some(obj) = value.as_object() else {
            if !value.is_null() {
                warn!("zone delta is not an object; reset to empty");
            }
            return delta;
        };

        let flags = |key: &str| obj.get(key).map(FlagSet::from_value).unwrap_or_default();
        delta.harvested = flags("harvested");
        delta.defeated = flags("defeated");
        delta.opened = flags("opened");
        delta.inspected = flags("inspected");
        delta.discovered_locations = flags("discoveredLocations");
        delta.explored_tiles = flags("exploredTiles");
        delta.unlocked_regions = flags("unlockedRegions");

        if let Some(Value::Object(map)) = obj.get("qualities") {
            for (id, code) in map {
                match code.as_str().and_then(QualityTier::from_code) {
                    Some(tier) => {
                        delta.qualities.insert(id.clone(), tier);
                    }
                    None => debug!(instance = %id, "dropping unknown quality code"),
                }
            }
        }

        let version = obj.get("schemaVersion").and_then(Value::as_u64);
        if version != Some(u64::from(DELTA_SCHEMA_VERSION)) {
            debug!(found = ?version, "delta schema version normalized");
        }
        delta
    }
}

/// What [`DeltaStore::apply_deltas`] changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub unlocked_regions: usize,
    pub flags_set: usize,
    pub qualities_restored: usize,
    pub explored_restored: usize,
    /// Ids or keys in the delta that no longer match the zone
    pub unmatched: usize,
    /// Restored tiles dropped by the connectivity pass
    pub explored_reset: usize,
}

/// Deltas for every zone, keyed by zone id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeltaStore {
    zones: BTreeMap<String, ZoneDelta>,
}

impl DeltaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coerce a whole persisted store. Non-object roots load as empty.
    pub fn normalize(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            if !value.is_null() {
                warn!("delta store is not an object; starting empty");
            }
            return Self::default();
        };
        Self {
            zones: obj
                .iter()
                .map(|(zone_id, v)| (zone_id.clone(), ZoneDelta::normalize(v)))
                .collect(),
        }
    }

    pub fn zone(&self, zone_id: &str) -> Option<&ZoneDelta> {
        self.zones.get(zone_id)
    }

    /// Delta for a zone, created empty on first use.
    pub fn zone_mut(&mut self, zone_id: &str) -> &mut ZoneDelta {
        self.zones.entry(zone_id.to_string()).or_default()
    }

    pub fn zone_ids(&self) -> impl Iterator<Item = &str> {
        self.zones.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Forget everything recorded for a zone.
    pub fn clear_zone(&mut self, zone_id: &str) -> bool {
        self.zones.remove(zone_id).is_some()
    }

    pub fn record_flag(&mut self, zone_id: &str, flag: InstanceFlag, instance_id: &str) -> bool {
        self.zone_mut(zone_id).flags_mut(flag).insert(instance_id)
    }

    pub fn record_harvested(&mut self, zone_id: &str, instance_id: &str) -> bool {
        self.record_flag(zone_id, InstanceFlag::Harvested, instance_id)
    }

    pub fn record_defeated(&mut self, zone_id: &str, instance_id: &str) -> bool {
        self.record_flag(zone_id, InstanceFlag::Defeated, instance_id)
    }

    pub fn record_opened(&mut self, zone_id: &str, instance_id: &str) -> bool {
        self.record_flag(zone_id, InstanceFlag::Opened, instance_id)
    }

    pub fn record_inspected(&mut self, zone_id: &str, instance_id: &str) -> bool {
        self.record_flag(zone_id, InstanceFlag::Inspected, instance_id)
    }

    pub fn record_discovered(&mut self, zone_id: &str, instance_id: &str) -> bool {
        self.record_flag(zone_id, InstanceFlag::Discovered, instance_id)
    }

    pub fn record_explored(&mut self, zone_id: &str, at: Coord) -> bool {
        self.zone_mut(zone_id).explored_tiles.insert(at.key())
    }

    pub fn record_unlocked(&mut self, zone_id: &str, region_id: u32) -> bool {
        self.zone_mut(zone_id).unlocked_regions.insert(region_id.to_string())
    }

    /// Remember a quality tier. The first recorded tier sticks.
    pub fn record_quality(&mut self, zone_id: &str, instance_id: &str, tier: QualityTier) -> bool {
        let qualities = &mut self.zone_mut(zone_id).qualities;
        if qualities.contains_key(instance_id) {
            return false;
        }
        qualities.insert(instance_id.to_string(), tier);
        true
    }

    /// Replay the zone's delta onto a freshly built and populated zone.
    ///
    /// Regions open first so that explored tiles inside them can be restored,
    /// then instance flags and qualities, then explored tiles, followed by a
    /// connectivity pass from the player (or the entry spawn).
    pub fn apply_deltas(&self, zone: &mut Zone) -> ApplyReport {
        let mut report = ApplyReport::default();
        let Some(delta) = self.zones.get(&zone.id) else {
            return report;
        };

        for key in delta.unlocked_regions.iter() {
            match key.parse::<u32>() {
                Ok(id) if zone.unlock_region(id) => report.unlocked_regions += 1,
                _ => report.unmatched += 1,
            }
        }

        let flags = [
            InstanceFlag::Harvested,
            InstanceFlag::Defeated,
            InstanceFlag::Opened,
            InstanceFlag::Inspected,
            InstanceFlag::Discovered,
        ];
        for flag in flags {
            for id in delta.flags(flag).iter() {
                let Some(instance) = zone.content.find_mut(id) else {
                    report.unmatched += 1;
                    continue;
                };
                let state = &mut instance.state;
                match flag {
                    InstanceFlag::Harvested => {
                        state.harvested = true;
                        if state.charges_left.is_some() {
                            state.charges_left = Some(0);
                        }
                    }
                    InstanceFlag::Defeated => state.defeated = true,
                    InstanceFlag::Opened => state.opened = true,
                    InstanceFlag::Inspected => state.inspected = true,
                    InstanceFlag::Discovered => state.discovered = true,
                }
                report.flags_set += 1;
            }
        }

        for (id, tier) in &delta.qualities {
            match zone.content.find_mut(id) {
                Some(instance) => {
                    instance.quality = Some(*tier);
                    report.qualities_restored += 1;
                }
                None => report.unmatched += 1,
            }
        }

        for key in delta.explored_tiles.iter() {
            match Coord::from_key(key) {
                Some(c) if zone.mark_explored(c) => report.explored_restored += 1,
                _ => report.unmatched += 1,
            }
        }

        if report.explored_restored > 0 {
            report.explored_reset = normalize_explored(zone);
        }

        debug!(zone_id = %zone.id, report = ?report, "deltas applied");
        report
    }
}
