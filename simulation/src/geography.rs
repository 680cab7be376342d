//! World generation: height fields, terrain classification and per-tile cache
//!
//! Elevation comes from a randomized diffusion that walks the grid one
//! anti-diagonal at a time, starting at the origin. Each cell hands its
//! elevation, plus a perturbation in [-1, 1], to its right and down
//! neighbours; a cell reached from both sides takes the mean. Four fields,
//! three of them rotated, are summed so the walk direction washes out.

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, SimulationError};
use crate::resource_map::Point;

/// Generation attempts before giving up on finding enough land.
const MAX_WORLD_ATTEMPTS: u32 = 10_000;

// ============================================================================
// Terrain
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    Deep,
    Water,
    Barren,
    Grassland,
    Forest,
    Mountain,
}

impl Terrain {
    /// Integer terrain code: -1 deep water through 4 mountain.
    pub fn code(self) -> i8 {
        match self {
            Terrain::Deep => -1,
            Terrain::Water => 0,
            Terrain::Barren => 1,
            Terrain::Grassland => 2,
            Terrain::Forest => 3,
            Terrain::Mountain => 4,
        }
    }

    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            -1 => Some(Terrain::Deep),
            0 => Some(Terrain::Water),
            1 => Some(Terrain::Barren),
            2 => Some(Terrain::Grassland),
            3 => Some(Terrain::Forest),
            4 => Some(Terrain::Mountain),
            _ => None,
        }
    }

    pub fn is_land(self) -> bool {
        self.code() > 0
    }

    /// Deterministic thresholding of an (elevation, precipitation) pair.
    pub fn classify(height: f64, precipitation: f64) -> Self {
        if height < -0.5 {
            Terrain::Deep
        } else if height < 0.0 {
            Terrain::Water
        } else if height > 1.2 {
            Terrain::Mountain
        } else if precipitation < 2.0 {
            Terrain::Barren
        } else if precipitation < 2.6 {
            Terrain::Grassland
        } else {
            Terrain::Forest
        }
    }
}

// ============================================================================
// Height generation
// ============================================================================

/// Square matrix indexed `[x][y]`.
pub type Field = Vec<Vec<f64>>;

/// One randomized diffusion from the origin.
pub fn diffuse<R: Rng + ?Sized>(size: usize, start: f64, rng: &mut R) -> Field {
    let offset = Uniform::new_inclusive(-1.0, 1.0);
    let mut field = vec![vec![0.0; size]; size];
    if size == 0 {
        return field;
    }
    field[0][0] = start;

    // Cells on diagonal d satisfy x + y == d and only depend on diagonal d - 1.
    for diagonal in 1..(2 * size - 1) {
        let x_min = diagonal.saturating_sub(size - 1);
        let x_max = diagonal.min(size - 1);
        for x in x_min..=x_max {
            let y = diagonal - x;
            let mut total = 0.0;
            let mut reached = 0;
            if x > 0 {
                total += field[x - 1][y] + offset.sample(rng);
                reached += 1;
            }
            if y > 0 {
                total += field[x][y - 1] + offset.sample(rng);
                reached += 1;
            }
            field[x][y] = total / reached as f64;
        }
    }
    field
}

/// Quarter turn: `res[j][i] = m[n - 1 - i][j]`.
pub fn rotate(field: &Field) -> Field {
    let n = field.len();
    let mut rotated = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            rotated[j][i] = field[n - 1 - i][j];
        }
    }
    rotated
}

fn add_into(acc: &mut Field, other: &Field) {
    for (row, other_row) in acc.iter_mut().zip(other) {
        for (cell, value) in row.iter_mut().zip(other_row) {
            *cell += value;
        }
    }
}

/// Sum of four diffusions, rotated by 0, 3, 2 and 1 quarter turns.
pub fn height_field<R: Rng + ?Sized>(size: usize, start: f64, rng: &mut R) -> Field {
    let mut height = diffuse(size, start, rng);
    for i in 0..3 {
        let mut more = diffuse(size, start, rng);
        for _ in i..3 {
            more = rotate(&more);
        }
        add_into(&mut height, &more);
    }
    height
}

fn scaled(mut field: Field, factor: f64) -> Field {
    for row in field.iter_mut() {
        for cell in row.iter_mut() {
            *cell *= factor;
        }
    }
    field
}

/// Elevation, precipitation and the terrain derived from them.
#[derive(Debug, Clone)]
pub struct TerrainMap {
    pub size: usize,
    pub height: Field,
    pub precipitation: Field,
    pub terrain: Vec<Vec<Terrain>>,
}

impl TerrainMap {
    pub fn generate<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Self {
        let multiplier = 2.0 / size.max(1) as f64;
        let height = scaled(height_field(size, 0.0, rng), multiplier);
        let precipitation = scaled(height_field(size, size as f64 / 4.0, rng), multiplier);
        let terrain = height
            .iter()
            .zip(&precipitation)
            .map(|(h_row, p_row)| {
                h_row
                    .iter()
                    .zip(p_row)
                    .map(|(h, p)| Terrain::classify(*h, *p))
                    .collect()
            })
            .collect();
        Self {
            size,
            height,
            precipitation,
            terrain,
        }
    }

    pub fn land_count(&self) -> usize {
        self.terrain
            .iter()
            .flatten()
            .filter(|t| t.is_land())
            .count()
    }
}

// ============================================================================
// Geography
// ============================================================================

/// Per-tile cache built once per world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocalInformation {
    pub terrain: Terrain,
    pub is_coast: bool,
}

/// Immutable terrain grid of one generated world.
#[derive(Debug, Clone)]
pub struct Geography {
    size: usize,
    terrain: Vec<Vec<Terrain>>,
    local: Vec<Vec<LocalInformation>>,
    land: Vec<Point>,
}

impl Geography {
    /// Build from an explicit `[x][y]` terrain grid. The grid must be square.
    pub fn from_terrain(terrain: Vec<Vec<Terrain>>) -> Self {
        let size = terrain.len();
        let mut local: Vec<Vec<LocalInformation>> = terrain
            .iter()
            .map(|row| {
                row.iter()
                    .map(|t| LocalInformation {
                        terrain: *t,
                        is_coast: false,
                    })
                    .collect()
            })
            .collect();

        // Land touching water on any of the four sides is coast.
        let mut land = Vec::new();
        for x in 0..size {
            for y in 0..size {
                let here = terrain[x][y];
                if !here.is_land() {
                    continue;
                }
                let point = Point::new(x as i32, y as i32);
                land.push(point);
                local[x][y].is_coast = point.neighbours().iter().any(|n| {
                    n.index(size)
                        .map(|(nx, ny)| !terrain[nx][ny].is_land())
                        .unwrap_or(false)
                });
            }
        }

        Self {
            size,
            terrain,
            local,
            land,
        }
    }

    /// Single generation attempt, regardless of how much land it produced.
    pub fn generate<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Self {
        Self::from_terrain(TerrainMap::generate(size, rng).terrain)
    }

    /// Regenerate until at least `min_land` tiles are land.
    pub fn generate_viable<R: Rng + ?Sized>(size: usize, min_land: usize, rng: &mut R) -> Result<Self> {
        for attempt in 1..=MAX_WORLD_ATTEMPTS {
            let map = TerrainMap::generate(size, rng);
            let land = map.land_count();
            if land >= min_land {
                info!(attempt, land, size, "Generated world");
                return Ok(Self::from_terrain(map.terrain));
            }
            debug!(attempt, land, min_land, "Rejected world with too little land");
        }
        Err(SimulationError::BarrenWorld {
            attempts: MAX_WORLD_ATTEMPTS,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn contains(&self, point: Point) -> bool {
        point.index(self.size).is_some()
    }

    pub fn terrain_at(&self, point: Point) -> Option<Terrain> {
        point.index(self.size).map(|(x, y)| self.terrain[x][y])
    }

    pub fn local_at(&self, point: Point) -> Option<&LocalInformation> {
        point.index(self.size).map(|(x, y)| &self.local[x][y])
    }

    pub fn is_land(&self, point: Point) -> bool {
        self.terrain_at(point).map(Terrain::is_land).unwrap_or(false)
    }

    pub fn is_coast(&self, point: Point) -> bool {
        self.local_at(point).map(|l| l.is_coast).unwrap_or(false)
    }

    pub fn land_tiles(&self) -> &[Point] {
        &self.land
    }

    /// Terrain codes indexed `[x][y]`.
    pub fn codes(&self) -> Vec<Vec<i8>> {
        self.terrain
            .iter()
            .map(|row| row.iter().map(|t| t.code()).collect())
            .collect()
    }
}
