//! Cellular-automata cave synthesis.
//!
//! Random fill followed by the classic 4-5 smoothing rule: a cell with more
//! than four wall neighbors becomes wall, fewer than four becomes floor, and
//! exactly four leaves it alone.

use rand::Rng;

use crate::seeds::SeededRng;

use super::{Cell, CellGrid, GeneratorConfig};

/// Produce the raw wall/floor grid.
pub fn synthesize(config: &GeneratorConfig, rng: &mut SeededRng) -> CellGrid {
    let mut grid = random_fill(config, rng);
    for _ in 0..config.smooth_iterations {
        grid = smooth_pass(&grid, config.border_is_wall);
    }
    grid
}

/// Initial noise. Border cells skip the draw when they are forced to wall.
fn random_fill(config: &GeneratorConfig, rng: &mut SeededRng) -> CellGrid {
    let mut grid = CellGrid::new_with(config.width, config.height, Cell::Wall);
    let fill = if config.fill_chance.is_nan() { 0.0 } else { config.fill_chance.clamp(0.0, 1.0) };

    for y in 0..config.height {
        for x in 0..config.width {
            if config.border_is_wall && grid.is_border(x, y) {
                continue;
            }
            let cell = if rng.gen_bool(fill) {
                Cell::Wall
            } else {
                Cell::Floor
            };
            grid.set(x, y, cell);
        }
    }

    grid
}

/// One smoothing pass over interior cells. Reads from `grid`, writes into a
/// fresh buffer. Border cells keep their fill unless forced to wall.
fn smooth_pass(grid: &CellGrid, border_is_wall: bool) -> CellGrid {
    let mut next = grid.clone();

    for y in 0..grid.height {
        for x in 0..grid.width {
            if grid.is_border(x, y) {
                if border_is_wall {
                    next.set(x, y, Cell::Wall);
                }
                continue;
            }

            let walls = count_wall_neighbors(grid, x, y);
            if walls > 4 {
                next.set(x, y, Cell::Wall);
            } else if walls < 4 {
                next.set(x, y, Cell::Floor);
            }
        }
    }

    next
}

/// Count walls among the eight surrounding cells; off-grid counts as wall.
fn count_wall_neighbors(grid: &CellGrid, x: usize, y: usize) -> usize {
    let mut count = 0;

    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            match grid.try_get(x as i64 + dx, y as i64 + dy) {
                Some(Cell::Floor) => {}
                _ => count += 1,
            }
        }
    }

    count
}
