//! Connectivity repair.
//!
//! The two largest regions are left alone (the secondary one is reserved for
//! the locked gate). Every other region is either filled in, when it is too
//! small to be worth a corridor, or tunneled to the primary region.

use tracing::trace;

use crate::tilemap::Coord;

use super::regions::{regions_by_size, Region};
use super::{Cell, CellGrid};

/// What the repair pass changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Regions found before repair
    pub initial_regions: usize,
    /// Regions converted back to wall
    pub removed_regions: usize,
    /// Regions joined to the primary region by a corridor
    pub connected_regions: usize,
    /// Wall cells opened by corridors
    pub carved_cells: usize,
}

/// Remove tiny islands and tunnel the remaining minor regions to the primary.
pub fn repair_connectivity(grid: &mut CellGrid, min_region_size: usize) -> RepairReport {
    let regions = regions_by_size(&*grid, Cell::is_floor);
    let mut report = RepairReport {
        initial_regions: regions.len(),
        ..RepairReport::default()
    };

    let Some(primary) = regions.first() else {
        return report;
    };

    let (small, large): (Vec<&Region>, Vec<&Region>) = regions
        .iter()
        .skip(2)
        .partition(|r| r.size() < min_region_size);

    // All fills happen before any corridor is dug
    for region in small {
        for c in &region.cells {
            grid.set(c.x, c.y, Cell::Wall);
        }
        report.removed_regions += 1;
    }

    for region in large {
        if let Some((from, to)) = closest_pair(region, primary) {
            let carved = carve_corridor(grid, from, to);
            trace!(region = region.id, %from, %to, carved = carved.len(), "tunneled region to primary");
            report.carved_cells += carved.len();
            report.connected_regions += 1;
        }
    }

    report
}

/// Closest pair of cells between two regions by Manhattan distance.
///
/// Exhaustive search; the first pair found at the minimum distance wins.
pub fn closest_pair(from: &Region, to: &Region) -> Option<(Coord, Coord)> {
    let mut best: Option<(usize, Coord, Coord)> = None;

    for &a in &from.cells {
        for &b in &to.cells {
            let dist = a.manhattan(b);
            if best.map_or(true, |(d, _, _)| dist < d) {
                best = Some((dist, a, b));
            }
        }
    }

    best.map(|(_, a, b)| (a, b))
}

/// Every cell on the L-shaped path from `from` to `to`: horizontal leg first,
/// then vertical. Both endpoints are included.
pub fn corridor_path(from: Coord, to: Coord) -> Vec<Coord> {
    let mut path = Vec::with_capacity(from.manhattan(to) + 1);
    let mut x = from.x;
    let y = from.y;

    path.push(from);
    while x != to.x {
        x = if x < to.x { x + 1 } else { x - 1 };
        path.push(Coord::new(x, y));
    }

    let mut y = y;
    while y != to.y {
        y = if y < to.y { y + 1 } else { y - 1 };
        path.push(Coord::new(x, y));
    }

    path
}

/// Open every wall cell along the corridor. Returns the converted cells in
/// path order.
pub fn carve_corridor(grid: &mut CellGrid, from: Coord, to: Coord) -> Vec<Coord> {
    let mut carved = Vec::new();
    for c in corridor_path(from, to) {
        if *grid.at(c) == Cell::Wall {
            grid.set(c.x, c.y, Cell::Floor);
            carved.push(c);
        }
    }
    carved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::find_regions;
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
    fn test_corridor_goes_x_then_y() {
        let path = corridor_path(Coord::new(1, 1), Coord::new(3, 3));
        assert_eq!(
            path,
            vec![
                Coord::new(1, 1),
                Coord::new(2, 1),
                Coord::new(3, 1),
                Coord::new(3, 2),
                Coord::new(3, 3),
            ]
        );
    }

    #[test]
    fn test_small_third_region_removed() {
        let mut g = grid(&[
            "##########",
            "#....#..##",
            "#....#..##",
            "#....#####",
            "######.###",
            "##########",
        ]);
        let report = repair_connectivity(&mut g, 12);
        assert_eq!(report.initial_regions, 3);
        assert_eq!(report.removed_regions, 1);
        assert_eq!(*g.get(6, 4), Cell::Wall);
        assert_eq!(find_regions(&g, Cell::is_floor).len(), 2);
    }

    #[test]
    fn test_large_third_region_tunneled() {
        let mut g = grid(&[
            "##############",
            "#.....#...####",
            "#.....#...####",
            "#.....########",
            "##############",
            "#....#########",
            "#....#########",
            "##############",
        ]);
        // The 3x2 block top right is the third largest; min size 4 keeps it
        let report = repair_connectivity(&mut g, 4);
        assert_eq!(report.connected_regions, 1);
        assert_eq!(report.removed_regions, 0);
        assert!(report.carved_cells >= 1);
        assert_eq!(find_regions(&g, Cell::is_floor).len(), 2);
    }

    #[test]
    fn test_two_regions_untouched() {
        let mut g = grid(&["#####", "#.#.#", "#####"]);
        let before = g.clone();
        let report = repair_connectivity(&mut g, 12);
        assert_eq!(report.removed_regions + report.connected_regions, 0);
        assert_eq!(g, before);
    }
}
