//! Connected-region analysis.
//!
//! Pure flood fill over any grid: the caller decides what counts as passable,
//! so the same routine serves the raw cell grid before repair and the final
//! tile grid after assembly.

use std::collections::VecDeque;

use crate::tilemap::{Coord, Tilemap};

/// A maximal 4-connected set of passable cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    /// Discovery index (row-major order of the region's first cell)
    pub id: usize,
    /// Cells in BFS order, starting with the discovery cell
    pub cells: Vec<Coord>,
}

impl Region {
    pub fn size(&self) -> usize {
        self.cells.len()
    }
}

/// Find all regions, in row-major discovery order.
pub fn find_regions<T>(grid: &Tilemap<T>, passable: impl Fn(&T) -> bool) -> Vec<Region> {
    let mut visited = Tilemap::new_with(grid.width, grid.height, false);
    let mut regions = Vec::new();

    for start in grid.coords() {
        if *visited.at(start) || !passable(grid.at(start)) {
            continue;
        }

        // BFS flood fill
        let mut cells = Vec::new();
        let mut queue = VecDeque::new();
        visited.set(start.x, start.y, true);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            cells.push(current);
            for next in grid.neighbors(current) {
                if !*visited.at(next) && passable(grid.at(next)) {
                    visited.set(next.x, next.y, true);
                    queue.push_back(next);
                }
            }
        }

        regions.push(Region {
            id: regions.len(),
            cells,
        });
    }

    regions
}

/// Regions sorted largest first. Equal sizes keep discovery order.
pub fn regions_by_size<T>(grid: &Tilemap<T>, passable: impl Fn(&T) -> bool) -> Vec<Region> {
    let mut regions = find_regions(grid, passable);
    regions.sort_by(|a, b| b.size().cmp(&a.size()));
    regions
}

/// Boolean membership mask for a region.
pub fn region_mask(width: usize, height: usize, region: &Region) -> Tilemap<bool> {
    let mut mask = Tilemap::new_with(width, height, false);
    for c in &region.cells {
        mask.set(c.x, c.y, true);
    }
    mask
}
