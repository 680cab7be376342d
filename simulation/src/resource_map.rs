//! Sparse per-tile quantity maps and disc queries
//!
//! The same container carries several per-turn contracts: effort keyed by
//! production category, production keyed by resource, and drafts keyed by
//! person. A tile that was never written reads as all zero.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

// ============================================================================
// Point
// ============================================================================

/// Integer grid coordinate. Doubles as the position component of a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// North, east, west, south.
    pub fn neighbours(self) -> [Point; 4] {
        [
            self.offset(0, 1),
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(0, -1),
        ]
    }

    /// Grid indices when the point lies inside a `size` x `size` square.
    pub fn index(self, size: usize) -> Option<(usize, usize)> {
        let in_range = |v: i32| v >= 0 && (v as usize) < size;
        if in_range(self.x) && in_range(self.y) {
            Some((self.x as usize, self.y as usize))
        } else {
            None
        }
    }

    pub fn manhattan(self, other: Point) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Canonical string key, `"x,y"`.
    pub fn key(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePointError(String);

impl fmt::Display for ParsePointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid point key {:?}", self.0)
    }
}

impl std::error::Error for ParsePointError {}

impl FromStr for Point {
    type Err = ParsePointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParsePointError(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(err)?;
        let x = x.trim().parse().map_err(|_| err())?;
        let y = y.trim().parse().map_err(|_| err())?;
        Ok(Point::new(x, y))
    }
}

// ============================================================================
// Radius cache
// ============================================================================

/// Memoized disc offsets, keyed by radius in whole tenths.
///
/// Offsets are stored relative to the origin and translated per query, so
/// every agent sharing a radius shares one entry.
#[derive(Debug, Default, Clone)]
pub struct RadiusCache {
    offsets: HashMap<i32, Vec<Point>>,
}

impl RadiusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Radius truncated to one decimal place, in tenths.
    fn tenths(radius: f64) -> i32 {
        // Nudge so that e.g. 2.3 * 10 = 22.999.. still lands on 23.
        (radius * 10.0 + 1e-9).floor() as i32
    }

    /// Offsets `(i, j)` with `i² + j² <= r²`.
    pub fn offsets(&mut self, radius: f64) -> &[Point] {
        let tenths = Self::tenths(radius);
        self.offsets.entry(tenths).or_insert_with(|| {
            debug!(radius = tenths as f64 / 10.0, "Adding radius to cache");
            if tenths < 0 {
                return Vec::new();
            }
            let full = tenths / 10;
            let limit = i64::from(tenths) * i64::from(tenths);
            let mut result = Vec::new();
            for i in -full..=full {
                for j in -full..=full {
                    let dist = 100 * (i64::from(i) * i64::from(i) + i64::from(j) * i64::from(j));
                    if dist <= limit {
                        result.push(Point::new(i, j));
                    }
                }
            }
            result
        })
    }

    /// All points within `radius` of `center`, including out-of-map ones.
    pub fn positions(&mut self, center: Point, radius: f64) -> Vec<Point> {
        self.offsets(radius)
            .iter()
            .map(|o| center.offset(o.x, o.y))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

// ============================================================================
// Resource map
// ============================================================================

/// Sparse map from tile to a record of keyed quantities.
#[derive(Debug, Clone)]
pub struct ResourceMap<K> {
    boundary: usize,
    tiles: BTreeMap<Point, BTreeMap<K, f64>>,
}

impl<K: Ord + Copy> ResourceMap<K> {
    pub fn new(boundary: usize) -> Self {
        Self {
            boundary,
            tiles: BTreeMap::new(),
        }
    }

    pub fn boundary(&self) -> usize {
        self.boundary
    }

    /// Additive upsert. Points outside the map are silently dropped.
    pub fn place(&mut self, point: Point, key: K, amount: f64) {
        if point.index(self.boundary).is_none() {
            return;
        }
        *self
            .tiles
            .entry(point)
            .or_default()
            .entry(key)
            .or_insert(0.0) += amount;
    }

    /// Every quantity recorded at `point`; empty when nothing was written.
    pub fn resource_at(&self, point: Point) -> impl Iterator<Item = (K, f64)> + '_ {
        self.tiles
            .get(&point)
            .into_iter()
            .flat_map(|record| record.iter().map(|(k, v)| (*k, *v)))
    }

    pub fn resource_type_at(&self, point: Point, key: K) -> f64 {
        self.tiles
            .get(&point)
            .and_then(|record| record.get(&key))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn record(&self, point: Point) -> Option<&BTreeMap<K, f64>> {
        self.tiles.get(&point)
    }

    pub fn tiles(&self) -> impl Iterator<Item = (Point, &BTreeMap<K, f64>)> + '_ {
        self.tiles.iter().map(|(p, r)| (*p, r))
    }

    /// Sum of one key across every tile.
    pub fn total(&self, key: K) -> f64 {
        self.tiles
            .values()
            .filter_map(|record| record.get(&key))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}
