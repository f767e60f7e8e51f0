//! Locked gate placement between the primary and secondary regions.

use tracing::debug;

use crate::tilemap::Coord;

use super::regions::{region_mask, regions_by_size};
use super::repair::{closest_pair, corridor_path};
use super::{Cell, CellGrid};

/// How a gate was placed, or why none was.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GatePlacement {
    /// A wall cell already touching both regions became the gate.
    Adjacent(Coord),
    /// A corridor was dug and its middle cell became the gate.
    Corridor { gate: Coord, carved: usize },
    /// Fewer than two regions remain; nothing to lock.
    SingleRegion,
    /// The corridor between the regions crossed no wall.
    NoWallToCarve,
}

impl GatePlacement {
    pub fn gate(&self) -> Option<Coord> {
        match self {
            GatePlacement::Adjacent(c) => Some(*c),
            GatePlacement::Corridor { gate, .. } => Some(*gate),
            _ => None,
        }
    }
}

/// Insert a single locked gate between the two largest floor regions.
pub fn place_gate(grid: &mut CellGrid) -> GatePlacement {
    let regions = regions_by_size(&*grid, Cell::is_floor);
    if regions.len() < 2 {
        return GatePlacement::SingleRegion;
    }

    let (primary, secondary) = (&regions[0], &regions[1]);
    let primary_mask = region_mask(grid.width, grid.height, primary);
    let secondary_mask = region_mask(grid.width, grid.height, secondary);

    // Preferred: an existing wall that already separates the two regions
    let shared_wall = grid.coords().find(|&c| {
        *grid.at(c) == Cell::Wall
            && grid.neighbors(c).any(|n| *primary_mask.at(n))
            && grid.neighbors(c).any(|n| *secondary_mask.at(n))
    });
    if let Some(c) = shared_wall {
        grid.set(c.x, c.y, Cell::Gate);
        return GatePlacement::Adjacent(c);
    }

    // Fallback: dig a corridor and lock its midpoint
    let Some((from, to)) = closest_pair(secondary, primary) else {
        return GatePlacement::SingleRegion;
    };
    let walls: Vec<Coord> = corridor_path(from, to)
        .into_iter()
        .filter(|&c| *grid.at(c) == Cell::Wall)
        .collect();
    if walls.is_empty() {
        debug!(%from, %to, "gate corridor carves nothing; skipping gate");
        return GatePlacement::NoWallToCarve;
    }

    let mid = walls.len() / 2;
    for (i, c) in walls.iter().enumerate() {
        let cell = if i == mid { Cell::Gate } else { Cell::Floor };
        grid.set(c.x, c.y, cell);
    }

    GatePlacement::Corridor {
        gate: walls[mid],
        carved: walls.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::Tilemap;

    fn grid(rows: &[&str]) -> CellGrid {
        Tilemap::from_rows(
            rows.iter()
                .map(|r| r.chars().map(|c| if c == '.' { Cell::Floor } else { Cell::Wall }).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_single_region_skips_gate() {
        let mut g = grid(&["#####", "#...#", "#####"]);
        assert_eq!(place_gate(&mut g), GatePlacement::SingleRegion);
        assert!(g.iter().all(|(_, _, c)| *c != Cell::Gate));
    }

    #[test]
    fn test_shared_wall_becomes_gate() {
        let mut g = grid(&[
            "#######",
            "#...#.#",
            "#...#.#",
            "#######",
        ]);
        let placement = place_gate(&mut g);
        assert_eq!(placement, GatePlacement::Adjacent(Coord::new(4, 1)));
        assert_eq!(*g.get(4, 1), Cell::Gate);
        assert_eq!(g.iter().filter(|(_, _, c)| **c == Cell::Gate).count(), 1);
    }

    #[test]
    fn test_thick_wall_gets_corridor_with_middle_gate() {
        let mut g = grid(&[
            "#########",
            "#..###..#",
            "#..###..#",
            "#########",
        ]);
        let placement = place_gate(&mut g);
        match placement {
            GatePlacement::Corridor { gate, carved } => {
                assert_eq!(carved, 3);
                assert_eq!(gate, Coord::new(4, 1));
            }
            other => panic!("unexpected placement {other:?}"),
        }
        assert_eq!(*g.get(3, 1), Cell::Floor);
        assert_eq!(*g.get(4, 1), Cell::Gate);
        assert_eq!(*g.get(5, 1), Cell::Floor);
    }
}
