//! Procedural terrain for generated zones.
//!
//! The pipeline runs synchronously in four phases:
//! 1. `cellular` - random fill and cellular-automata smoothing
//! 2. `regions` - flood fill into connected floor regions
//! 3. `repair` - drop tiny islands, tunnel the rest to the primary region
//! 4. `gate` - wall the secondary region off behind a single locked gate
//!
//! The output is a symbol grid (`#`, `.`, `L`) that the zone assembler reads
//! exactly like a hand-written static layout.

pub mod cellular;
pub mod gate;
pub mod regions;
pub mod repair;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ZoneError, ZoneResult};
use crate::seeds::SeededRng;
use crate::tilemap::Tilemap;

pub use cellular::synthesize;
pub use gate::{place_gate, GatePlacement};
pub use regions::{find_regions, region_mask, regions_by_size, Region};
pub use repair::{carve_corridor, closest_pair, corridor_path, repair_connectivity, RepairReport};

/// Raw generation cell, before it becomes a zone tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Cell {
    #[default]
    Wall,
    Floor,
    Gate,
}

impl Cell {
    /// Layout symbol for this cell.
    pub fn symbol(&self) -> char {
        match self {
            Cell::Wall => '#',
            Cell::Floor => '.',
            Cell::Gate => 'L',
        }
    }

    pub fn is_floor(&self) -> bool {
        matches!(self, Cell::Floor)
    }
}

pub type CellGrid = Tilemap<Cell>;

/// Parameters for the cellular cave generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    pub width: usize,
    pub height: usize,
    /// Probability that an interior cell starts as wall
    pub fill_chance: f64,
    /// Number of smoothing passes
    pub smooth_iterations: usize,
    /// Force the outer ring to wall
    pub border_is_wall: bool,
    /// Regions beyond the two largest smaller than this are filled in
    pub min_region_size_to_keep: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            width: 40,
            height: 30,
            fill_chance: 0.45,
            smooth_iterations: 4,
            border_is_wall: true,
            min_region_size_to_keep: 12,
        }
    }
}

/// Result of a full terrain run.
#[derive(Clone, Debug)]
pub struct GeneratedLayout {
    pub grid: CellGrid,
    pub repair: RepairReport,
    pub gate: GatePlacement,
}

impl GeneratedLayout {
    /// Layout rows in the static symbol encoding.
    pub fn symbol_rows(&self) -> Vec<String> {
        to_symbol_rows(&self.grid)
    }
}

/// Run synthesis, repair and gate placement.
pub fn generate_layout(config: &GeneratorConfig, rng: &mut SeededRng) -> ZoneResult<GeneratedLayout> {
    if config.width == 0 || config.height == 0 {
        return Err(ZoneError::InvalidDimensions {
            width: config.width,
            height: config.height,
        });
    }

    let mut grid = synthesize(config, rng);
    let repair = repair_connectivity(&mut grid, config.min_region_size_to_keep);
    let gate = place_gate(&mut grid);

    debug!(
        width = config.width,
        height = config.height,
        removed = repair.removed_regions,
        tunneled = repair.connected_regions,
        gate = ?gate,
        "generated cave layout"
    );

    Ok(GeneratedLayout { grid, repair, gate })
}

/// Convert a cell grid to layout rows.
pub fn to_symbol_rows(grid: &CellGrid) -> Vec<String> {
    (0..grid.height)
        .map(|y| (0..grid.width).map(|x| grid.get(x, y).symbol()).collect())
        .collect()
}
