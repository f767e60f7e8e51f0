//! Bounded 2D tile grid used by every stage of zone generation.
//!
//! Unlike a world map, zones do not wrap: coordinates outside the grid simply
//! do not exist, and neighbor queries clip at the edges.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A cell coordinate inside a zone grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Manhattan distance between two coordinates.
    pub fn manhattan(&self, other: Coord) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Key used for explored-tile persistence (`"x,y"`).
    pub fn key(&self) -> String {
        format!("{},{}", self.x, self.y)
    }

    /// Parse a persistence key produced by [`Coord::key`].
    pub fn from_key(key: &str) -> Option<Self> {
        let (x, y) = key.split_once(',')?;
        Some(Self::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal offsets in the order neighbors are visited: up, down, left, right.
pub const CARDINALS: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// A rectangular 2D grid stored in row-major order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone + Default> Tilemap<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }
}

impl<T: Clone> Tilemap<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Fill the entire map with a value.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl<T> Tilemap<T> {
    /// Build a map from rows of equal length. Returns `None` when the rows are
    /// ragged or empty.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Option<Self> {
        let height = rows.len();
        let width = rows.first()?.len();
        if width == 0 || rows.iter().any(|r| r.len() != width) {
            return None;
        }
        Some(Self {
            width,
            height,
            data: rows.into_iter().flatten().collect(),
        })
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// True if the cell lies on the outermost ring of the grid.
    pub fn is_border(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x + 1 == self.width || y + 1 == self.height
    }

    /// Steps from the cell to the nearest edge cell (0 on the border itself).
    pub fn border_distance(&self, x: usize, y: usize) -> usize {
        x.min(y)
            .min(self.width.saturating_sub(1 + x))
            .min(self.height.saturating_sub(1 + y))
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let idx = self.index(x, y);
        &mut self.data[idx]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    pub fn at(&self, c: Coord) -> &T {
        self.get(c.x, c.y)
    }

    pub fn at_mut(&mut self, c: Coord) -> &mut T {
        self.get_mut(c.x, c.y)
    }

    /// Bounds-checked lookup with signed coordinates.
    pub fn try_get(&self, x: i64, y: i64) -> Option<&T> {
        if self.in_bounds(x, y) {
            Some(self.get(x as usize, y as usize))
        } else {
            None
        }
    }

    /// 4-connected neighbors that lie inside the grid (up, down, left, right).
    pub fn neighbors(&self, c: Coord) -> impl Iterator<Item = Coord> + '_ {
        CARDINALS.iter().filter_map(move |&(dx, dy)| {
            let nx = c.x as i64 + dx as i64;
            let ny = c.y as i64 + dy as i64;
            self.in_bounds(nx, ny)
                .then(|| Coord::new(nx as usize, ny as usize))
        })
    }

    /// Iterate over all cells with their coordinates, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| {
            (idx % width, idx / width, val)
        })
    }

    /// Iterate mutably over all cells with their coordinates, row-major.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let width = self.width;
        self.data.iter_mut().enumerate().map(move |(idx, val)| {
            (idx % width, idx / width, val)
        })
    }

    /// All coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> {
        let width = self.width;
        (0..self.width * self.height).map(move |idx| Coord::new(idx % width, idx / width))
    }

    /// Build a new map of the same shape by transforming every cell.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Tilemap<U> {
        Tilemap {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(&mut f).collect(),
        }
    }
}
