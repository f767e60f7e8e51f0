//! Tile model for assembled zones.

use serde::{Deserialize, Serialize};

/// Passability class of a tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileKind {
    #[default]
    Walkable,
    Blocked,
    Locked,
}

impl TileKind {
    /// Static layout symbol table: `#` blocked, `.` walkable, `L` locked.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '#' => Some(TileKind::Blocked),
            '.' => Some(TileKind::Walkable),
            'L' => Some(TileKind::Locked),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            TileKind::Walkable => '.',
            TileKind::Blocked => '#',
            TileKind::Locked => 'L',
        }
    }
}

/// Transient marker on a tile. A tile holds at most one, so the player can
/// never stand on the tile that is highlighted for exploration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TileMarker {
    #[default]
    None,
    Player,
    ActiveExplore,
}

/// A single zone tile.
///
/// Fields are private: the zone enforces that markers and exploration only
/// ever land on walkable tiles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tile {
    kind: TileKind,
    explored: bool,
    marker: TileMarker,
    locked_region: Option<u32>,
    original_kind: Option<TileKind>,
}

impl Tile {
    pub fn new(kind: TileKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn kind(&self) -> TileKind {
        self.kind
    }

    pub fn is_walkable(&self) -> bool {
        self.kind == TileKind::Walkable
    }

    pub fn is_explored(&self) -> bool {
        self.explored
    }

    pub fn has_player(&self) -> bool {
        self.marker == TileMarker::Player
    }

    pub fn is_active_explore(&self) -> bool {
        self.marker == TileMarker::ActiveExplore
    }

    /// Explored, or currently occupied by the player.
    pub fn is_known(&self) -> bool {
        self.explored || self.has_player()
    }

    pub fn marker(&self) -> TileMarker {
        self.marker
    }

    pub fn locked_region(&self) -> Option<u32> {
        self.locked_region
    }

    /// Kind to restore when the owning locked region opens.
    pub fn original_kind(&self) -> Option<TileKind> {
        self.original_kind
    }

    pub(crate) fn set_kind(&mut self, kind: TileKind) {
        self.kind = kind;
        if kind != TileKind::Walkable {
            self.marker = TileMarker::None;
            self.explored = false;
        }
    }

    pub(crate) fn set_explored(&mut self, explored: bool) -> bool {
        if explored && !self.is_walkable() {
            return false;
        }
        self.explored = explored;
        true
    }

    pub(crate) fn set_marker(&mut self, marker: TileMarker) -> bool {
        if marker != TileMarker::None && !self.is_walkable() {
            return false;
        }
        self.marker = marker;
        true
    }

    /// Tag this tile as part of a locked region. Non-gate tiles are sealed
    /// (forced to blocked) until the region opens.
    pub(crate) fn lock_into(&mut self, region: u32) {
        self.locked_region = Some(region);
        if self.kind != TileKind::Locked {
            self.original_kind = Some(self.kind);
            self.set_kind(TileKind::Blocked);
        }
    }

    /// Undo [`Tile::lock_into`]: gates become permanently walkable, sealed
    /// tiles get their original kind back.
    pub(crate) fn unlock(&mut self) {
        match self.kind {
            TileKind::Locked => self.set_kind(TileKind::Walkable),
            TileKind::Blocked => {
                let restored = self.original_kind.take().unwrap_or(TileKind::Walkable);
                self.set_kind(restored);
            }
            TileKind::Walkable => {}
        }
    }
}
