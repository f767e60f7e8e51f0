//! Zone assembly: symbol grid to tiles, locked-region tagging and entry spawn.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::error::{ZoneError, ZoneResult};
use crate::generation::{generate_layout, regions_by_size, GeneratorConfig};
use crate::seeds::{SeedPurpose, ZoneSeeds};
use crate::tilemap::{Coord, Tilemap};

use super::definition::{ZoneDefinition, ZoneKind, CELLULAR_GENERATOR};
use super::tile::{Tile, TileKind};
use super::{LockedRegion, Zone, LOCKED_REGION_ID};

/// Gate-distance thresholds tried in order when picking the entry spawn.
const SPAWN_GATE_THRESHOLDS: [usize; 3] = [4, 2, 0];

/// Border bands tried in order: one step in, two steps in, anywhere.
const SPAWN_BANDS: [Option<usize>; 3] = [Some(1), Some(2), None];

/// Build a zone from its definition. Terrain for generated zones is drawn
/// from the zone's terrain stream, so the same world seed always rebuilds the
/// same grid.
pub fn build_zone(definition: &ZoneDefinition, world_seed: &str) -> ZoneResult<Zone> {
    let rows = layout_rows(definition, world_seed)?;
    let kinds = parse_layout(&rows)?;
    let mut tiles = kinds.map(|&k| Tile::new(k));

    let locked_regions = tag_locked_regions(&mut tiles);

    let entry_spawn = match definition.entry_spawn {
        Some(c) if c.x < tiles.width && c.y < tiles.height && tiles.at(c).is_walkable() => c,
        Some(c) => {
            warn!(zone_id = %definition.id, spawn = %c, "configured entry spawn is not walkable; selecting one");
            select_entry_spawn(&mut tiles)
        }
        None => select_entry_spawn(&mut tiles),
    };

    info!(
        zone_id = %definition.id,
        width = tiles.width,
        height = tiles.height,
        locked = locked_regions.len(),
        spawn = %entry_spawn,
        "zone assembled"
    );

    Ok(Zone::new(definition, world_seed, tiles, entry_spawn, locked_regions))
}

/// Layout rows for a definition: the authored layout, or a generator run.
fn layout_rows(definition: &ZoneDefinition, world_seed: &str) -> ZoneResult<Vec<String>> {
    match definition.kind {
        ZoneKind::Static => definition.layout.clone().ok_or(ZoneError::EmptyLayout),
        ZoneKind::Generated => {
            let generator = definition.generator.as_deref().unwrap_or(CELLULAR_GENERATOR);
            if generator != CELLULAR_GENERATOR {
                return Err(ZoneError::UnknownGenerator(generator.to_string()));
            }

            let mut config = match (&definition.generator_config, definition.width, definition.height) {
                (Some(config), _, _) => config.clone(),
                (None, Some(_), Some(_)) => GeneratorConfig::default(),
                _ => return Err(ZoneError::MissingGeneratorConfig(definition.id.clone())),
            };
            if let Some(w) = definition.width {
                config.width = w;
            }
            if let Some(h) = definition.height {
                config.height = h;
            }

            let seeds = ZoneSeeds::new(world_seed, definition.id.as_str());
            let mut rng = seeds.rng(SeedPurpose::Terrain);
            let layout = generate_layout(&config, &mut rng)?;
            Ok(layout.symbol_rows())
        }
    }
}

/// Map layout symbols to tile kinds. Unknown symbols become walkable with a
/// warning; ragged or empty layouts are rejected.
pub fn parse_layout(rows: &[String]) -> ZoneResult<Tilemap<TileKind>> {
    let expected = rows.first().map(|r| r.chars().count()).unwrap_or(0);
    if expected == 0 {
        return Err(ZoneError::EmptyLayout);
    }

    let mut unknown = BTreeSet::new();
    let mut parsed = Vec::with_capacity(rows.len());
    for (row, line) in rows.iter().enumerate() {
        let found = line.chars().count();
        if found != expected {
            return Err(ZoneError::MalformedLayout { row, expected, found });
        }
        parsed.push(
            line.chars()
                .map(|c| {
                    TileKind::from_symbol(c).unwrap_or_else(|| {
                        unknown.insert(c);
                        TileKind::Walkable
                    })
                })
                .collect::<Vec<_>>(),
        );
    }

    if !unknown.is_empty() {
        warn!(symbols = ?unknown, "unknown layout symbols treated as walkable");
    }

    Tilemap::from_rows(parsed).ok_or(ZoneError::EmptyLayout)
}

/// Tag everything outside the largest walkable component as locked region 1.
///
/// Only runs when the grid has a gate. Gates keep their kind; every other
/// tagged tile is sealed to blocked until the region is unlocked. At most one
/// locked region per zone is supported.
pub fn tag_locked_regions(tiles: &mut Tilemap<Tile>) -> Vec<LockedRegion> {
    let has_gate = tiles.iter().any(|(_, _, t)| t.kind() == TileKind::Locked);
    if !has_gate {
        return Vec::new();
    }

    let regions = regions_by_size(&*tiles, Tile::is_walkable);
    let mut open = Tilemap::new_with(tiles.width, tiles.height, false);
    if let Some(largest) = regions.first() {
        for c in &largest.cells {
            open.set(c.x, c.y, true);
        }
    }

    let mut tagged = 0usize;
    for (x, y, tile) in tiles.iter_mut() {
        let lockable = tile.kind() == TileKind::Locked || (tile.is_walkable() && !*open.get(x, y));
        if lockable {
            tile.lock_into(LOCKED_REGION_ID);
            tagged += 1;
        }
    }

    debug!(tagged, "tagged locked region");
    vec![LockedRegion {
        id: LOCKED_REGION_ID,
        unlocked: false,
    }]
}

/// Pick the entry spawn.
///
/// A minimum gate distance of 4 is tried first, relaxed to 2 and then
/// dropped. Under each threshold, walkable tiles exactly one step in from the
/// border are preferred, then two steps, then anywhere. Within a band the tile
/// farthest from any gate wins (first in row-major order on ties). If nothing
/// qualifies the grid center is forced walkable and used.
pub fn select_entry_spawn(tiles: &mut Tilemap<Tile>) -> Coord {
    let gates: Vec<Coord> = tiles
        .iter()
        .filter(|(_, _, t)| t.kind() == TileKind::Locked)
        .map(|(x, y, _)| Coord::new(x, y))
        .collect();
    let gate_distance = |c: Coord| gates.iter().map(|g| g.manhattan(c)).min().unwrap_or(usize::MAX);

    for threshold in SPAWN_GATE_THRESHOLDS {
        for band in SPAWN_BANDS {
            let mut best: Option<(usize, Coord)> = None;
            for (x, y, tile) in tiles.iter() {
                if !tile.is_walkable() {
                    continue;
                }
                if band.is_some_and(|b| tiles.border_distance(x, y) != b) {
                    continue;
                }
                let c = Coord::new(x, y);
                let dist = gate_distance(c);
                if dist < threshold {
                    continue;
                }
                if best.map_or(true, |(d, _)| dist > d) {
                    best = Some((dist, c));
                }
            }
            if let Some((_, c)) = best {
                return c;
            }
        }
    }

    let center = Coord::new(tiles.width / 2, tiles.height / 2);
    warn!(spawn = %center, "no walkable tile for entry spawn; opening grid center");
    *tiles.at_mut(center) = Tile::new(TileKind::Walkable);
    center
}
