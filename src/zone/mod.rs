//! Assembled zones: tile grid, entry spawn, locked regions and content.
//!
//! A `Zone` is built once from a [`ZoneDefinition`] (see [`assembly`]) and then
//! mutated only through the accessors here, which keep the tile markers
//! consistent: exactly one player marker, at most one exploration highlight,
//! and neither ever on a non-walkable tile.

pub mod assembly;
pub mod definition;
pub mod tile;

use serde::{Deserialize, Serialize};

use crate::content::{ContentInstance, ZoneContent};
use crate::tilemap::{Coord, Tilemap};

pub use assembly::{build_zone, parse_layout, select_entry_spawn, tag_locked_regions};
pub use definition::{ZoneDefinition, ZoneKind, CELLULAR_GENERATOR};
pub use tile::{Tile, TileKind, TileMarker};

/// The only locked-region id a zone can carry.
pub const LOCKED_REGION_ID: u32 = 1;

/// Registry entry for a locked region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedRegion {
    pub id: u32,
    pub unlocked: bool,
}

/// A playable zone.
#[derive(Clone, Debug)]
pub struct Zone {
    pub id: String,
    pub name: String,
    /// Spawn-table template id, if the definition named one
    pub template_id: Option<String>,
    /// World-tile seed every random stream of this zone derives from
    pub world_seed: String,
    pub entry_spawn: Coord,
    pub locked_regions: Vec<LockedRegion>,
    pub content: ZoneContent,
    tiles: Tilemap<Tile>,
    player: Option<Coord>,
    active_explore: Option<Coord>,
}

impl Zone {
    pub(crate) fn new(
        definition: &ZoneDefinition,
        world_seed: &str,
        tiles: Tilemap<Tile>,
        entry_spawn: Coord,
        locked_regions: Vec<LockedRegion>,
    ) -> Self {
        Self {
            id: definition.id.clone(),
            name: definition.display_name().to_string(),
            template_id: definition.template_id.clone(),
            world_seed: world_seed.to_string(),
            entry_spawn,
            locked_regions,
            content: ZoneContent::default(),
            tiles,
            player: None,
            active_explore: None,
        }
    }

    pub fn width(&self) -> usize {
        self.tiles.width
    }

    pub fn height(&self) -> usize {
        self.tiles.height
    }

    pub fn tiles(&self) -> &Tilemap<Tile> {
        &self.tiles
    }

    pub fn contains(&self, c: Coord) -> bool {
        c.x < self.width() && c.y < self.height()
    }

    pub fn tile(&self, c: Coord) -> Option<&Tile> {
        self.contains(c).then(|| self.tiles.at(c))
    }

    pub fn kind_at(&self, c: Coord) -> Option<TileKind> {
        self.tile(c).map(Tile::kind)
    }

    pub fn is_walkable(&self, c: Coord) -> bool {
        self.tile(c).is_some_and(Tile::is_walkable)
    }

    /// Walkable and either explored or under the player.
    pub fn is_known_walkable(&self, c: Coord) -> bool {
        self.tile(c).is_some_and(|t| t.is_walkable() && t.is_known())
    }

    /// In-bounds 4-neighbors of a coordinate.
    pub fn neighbors(&self, c: Coord) -> impl Iterator<Item = Coord> + '_ {
        self.tiles.neighbors(c)
    }

    pub fn player(&self) -> Option<Coord> {
        self.player
    }

    pub fn active_explore(&self) -> Option<Coord> {
        self.active_explore
    }

    /// Put the player on the entry spawn and mark it explored.
    pub fn enter(&mut self) -> bool {
        let spawn = self.entry_spawn;
        if !self.move_player(spawn) {
            return false;
        }
        self.mark_explored(spawn);
        true
    }

    /// Move the player marker. Refused for anything but walkable tiles.
    pub fn move_player(&mut self, to: Coord) -> bool {
        if !self.is_walkable(to) {
            return false;
        }
        if let Some(prev) = self.player.take() {
            self.tiles.at_mut(prev).set_marker(TileMarker::None);
        }
        if self.active_explore == Some(to) {
            self.active_explore = None;
        }
        self.tiles.at_mut(to).set_marker(TileMarker::Player);
        self.player = Some(to);
        true
    }

    /// Remove the player marker (leaving the zone).
    pub fn clear_player(&mut self) {
        if let Some(prev) = self.player.take() {
            self.tiles.at_mut(prev).set_marker(TileMarker::None);
        }
    }

    /// Highlight a tile as the pending exploration target, or clear it.
    pub fn set_active_explore(&mut self, target: Option<Coord>) -> bool {
        if let Some(c) = target {
            if !self.is_walkable(c) || self.player == Some(c) {
                return false;
            }
        }
        if let Some(prev) = self.active_explore.take() {
            self.tiles.at_mut(prev).set_marker(TileMarker::None);
        }
        if let Some(c) = target {
            self.tiles.at_mut(c).set_marker(TileMarker::ActiveExplore);
            self.active_explore = Some(c);
        }
        true
    }

    /// Mark a walkable tile explored. Returns false for anything else.
    pub fn mark_explored(&mut self, c: Coord) -> bool {
        self.contains(c) && self.tiles.at_mut(c).set_explored(true)
    }

    pub(crate) fn clear_explored(&mut self, c: Coord) {
        if self.contains(c) {
            self.tiles.at_mut(c).set_explored(false);
        }
    }

    pub fn explored_count(&self) -> usize {
        self.tiles
            .iter()
            .filter(|(_, _, t)| t.is_walkable() && t.is_explored())
            .count()
    }

    /// Tiles that count towards completion: walkable only. Locked gates and
    /// sealed region tiles join the count once their region opens.
    pub fn explorable_count(&self) -> usize {
        self.tiles.iter().filter(|(_, _, t)| t.is_walkable()).count()
    }

    pub fn is_fully_explored(&self) -> bool {
        self.explored_count() >= self.explorable_count()
    }

    /// Coordinates of every walkable tile in row-major order.
    pub fn walkable_tiles(&self) -> Vec<Coord> {
        self.tiles
            .iter()
            .filter(|(_, _, t)| t.is_walkable())
            .map(|(x, y, _)| Coord::new(x, y))
            .collect()
    }

    pub fn locked_region(&self, id: u32) -> Option<&LockedRegion> {
        self.locked_regions.iter().find(|r| r.id == id)
    }

    /// Open a locked region: gates become walkable for good, sealed tiles
    /// get their original kind back. Idempotent. Returns false if the zone
    /// has no such region.
    pub fn unlock_region(&mut self, id: u32) -> bool {
        let Some(entry) = self.locked_regions.iter_mut().find(|r| r.id == id) else {
            return false;
        };
        entry.unlocked = true;

        for (_, _, tile) in self.tiles.iter_mut() {
            if tile.locked_region() == Some(id) {
                tile.unlock();
            }
        }
        true
    }

    /// Content instance standing on a coordinate, if any.
    pub fn content_at(&self, c: Coord) -> Option<&ContentInstance> {
        self.content.at(c)
    }
}
