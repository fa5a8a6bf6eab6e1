use std::f64::consts::TAU;

use glam::Vec2;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainKind {
    Sand,
    Stone,
    Water,
}

impl TerrainKind {
    pub fn all() -> &'static [TerrainKind] {
        &[TerrainKind::Sand, TerrainKind::Stone, TerrainKind::Water]
    }

    /// Tile group name in the level's tile set.
    pub fn group_name(self) -> &'static str {
        match self {
            TerrainKind::Sand => "Sand",
            TerrainKind::Stone => "Cobblestone",
            TerrainKind::Water => "Water",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainCell {
    pub column: u32,
    pub row: u32,
    pub kind: TerrainKind,
}

const OCTAVES: usize = 6;
const FREQUENCY: f64 = 1.0;
const LACUNARITY: f64 = 2.0;

/// Terrain classes laid out on a fixed grid, row-major.
///
/// Generated once per level and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainGrid {
    pub columns: u32,
    pub rows: u32,
    pub tile_size: f32,
    /// World position of the grid's lower-left corner.
    pub origin: Vec2,
    pub persistence: f64,
    /// Tile groups missing from the tile set. When any is missing the whole grid is sand.
    pub missing_groups: Vec<String>,
    cells: Vec<TerrainKind>,
}

/// Generate a terrain grid, drawing the noise persistence from `seed`.
///
/// Persistence is 1.0 plus a random step in {0.0, 0.1, ..., 1.0}.
pub fn generate_terrain(columns: u32, rows: u32, seed: u64, tile_groups: &[String]) -> TerrainGrid {
    let persistence = random_persistence(seed);
    generate_with_persistence(columns, rows, seed, persistence, tile_groups)
}

pub fn random_persistence(seed: u64) -> f64 {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let step: u32 = rng.gen_range(0..=10);
    1.0 + step as f64 / 10.0
}

pub fn generate_with_persistence(
    columns: u32,
    rows: u32,
    seed: u64,
    persistence: f64,
    tile_groups: &[String],
) -> TerrainGrid {
    let has_group = |kind: TerrainKind| tile_groups.iter().any(|g| g == kind.group_name());
    let missing_groups: Vec<String> = [TerrainKind::Stone, TerrainKind::Water]
        .into_iter()
        .filter(|k| !has_group(*k))
        .map(|k| k.group_name().to_string())
        .collect();
    let top_layer = missing_groups.is_empty();
    if !top_layer {
        warn!(
            missing = ?missing_groups,
            "Tile set incomplete, terrain falls back to sand"
        );
    }

    let fbm = Fbm::<Perlin>::new(noise_seed(seed))
        .set_octaves(OCTAVES)
        .set_frequency(FREQUENCY)
        .set_lacunarity(LACUNARITY)
        .set_persistence(persistence);

    let mut cells = Vec::with_capacity((columns * rows) as usize);
    for row in 0..rows {
        for column in 0..columns {
            let u = column as f64 / columns as f64;
            let v = row as f64 / rows as f64;
            let kind = if !top_layer {
                TerrainKind::Sand
            } else if sample_seamless(&fbm, u, v) >= 0.0 {
                TerrainKind::Stone
            } else {
                TerrainKind::Water
            };
            cells.push(kind);
        }
    }

    debug!(columns, rows, seed, persistence, "Terrain generated");

    TerrainGrid {
        columns,
        rows,
        tile_size: 1.0,
        origin: Vec2::ZERO,
        persistence,
        missing_groups,
        cells,
    }
}

/// Fold the level seed into the noise generator's 32-bit seed.
fn noise_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

/// Sample the unit square wrapped onto a 4D torus so opposite edges meet.
fn sample_seamless(noise: &impl NoiseFn<f64, 4>, u: f64, v: f64) -> f64 {
    let radius = 1.0 / TAU;
    let (su, cu) = (u * TAU).sin_cos();
    let (sv, cv) = (v * TAU).sin_cos();
    noise.get([cu * radius, su * radius, cv * radius, sv * radius])
}

impl TerrainGrid {
    /// Place the grid in world space, centered on `center`.
    pub fn with_layout(mut self, tile_size: f32, center: Vec2) -> Self {
        self.tile_size = tile_size;
        self.origin = center
            - Vec2::new(
                self.columns as f32 * tile_size / 2.0,
                self.rows as f32 * tile_size / 2.0,
            );
        self
    }

    pub fn is_degraded(&self) -> bool {
        !self.missing_groups.is_empty()
    }

    /// True when the stored cells match the declared grid dimensions.
    pub fn is_consistent(&self) -> bool {
        self.cells.len() == self.columns as usize * self.rows as usize
    }

    pub fn cell(&self, column: u32, row: u32) -> Option<TerrainCell> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        let kind = self.cells[(row * self.columns + column) as usize];
        Some(TerrainCell { column, row, kind })
    }

    /// The cell under a world-space point, if the point is on the grid.
    pub fn cell_at(&self, point: Vec2) -> Option<TerrainCell> {
        let local = (point - self.origin) / self.tile_size;
        if local.x < 0.0 || local.y < 0.0 {
            return None;
        }
        self.cell(local.x.floor() as u32, local.y.floor() as u32)
    }

    pub fn cells(&self) -> impl Iterator<Item = TerrainCell> + '_ {
        self.cells.iter().enumerate().map(|(i, &kind)| TerrainCell {
            column: i as u32 % self.columns,
            row: i as u32 / self.columns,
            kind,
        })
    }

    pub fn count(&self, kind: TerrainKind) -> usize {
        self.cells.iter().filter(|&&k| k == kind).count()
    }
}
