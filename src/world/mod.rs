pub mod generation;
pub mod geometry;
pub mod spawn;
pub mod terrain;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::level::LevelParams;
pub use geometry::{Bounds, Footprint, Obstacle, Polygon};
pub use terrain::{TerrainCell, TerrainGrid, TerrainKind};

/// Degradations observed while generating a level. None of them are fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LevelWarning {
    MissingTileGroups(Vec<String>),
    SeparationRelaxed { rounds: u32 },
    ObstacleShortfall { placed: u32, requested: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub id: Uuid,
    pub name: String,
    pub created_at: String,
    pub params: LevelParams,
    pub bounds: Bounds,
    pub terrain: TerrainGrid,
    pub goal: Footprint,
    pub obstacles: Vec<Obstacle>,
    pub player_spawn: Vec2,
    pub warnings: Vec<LevelWarning>,
}

impl Level {
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}
