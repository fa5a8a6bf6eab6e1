pub mod clock;
pub mod difficulty;
pub mod entity;
pub mod outcome;
pub mod statistics;
pub mod steering;

use glam::Vec2;
use serde::Serialize;

use crate::simulation::entity::Entity;
use crate::simulation::outcome::Outcome;
use crate::world::TerrainKind;

pub use clock::{SimulationClock, WorldState};

/// Position and motion of one entity, as handed to the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pose {
    pub id: u32,
    pub position: Vec2,
    pub heading: f32,
    pub velocity: Vec2,
}

impl Pose {
    pub fn of(entity: &Entity) -> Self {
        Pose {
            id: entity.id,
            position: entity.position,
            heading: entity.heading,
            velocity: entity.velocity,
        }
    }
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickFrame {
    pub tick: u64,
    pub elapsed_secs: u64,
    pub player: Pose,
    pub enemies: Vec<Pose>,
    pub player_speed: f32,
    pub terrain: Option<TerrainKind>,
    pub enemy_speed: f32,
    pub speed_bonus: f64,
    pub outcome: Option<Outcome>,
}

/// Signals raised during ticks, drained by the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SimEvent {
    EnemySpawned { id: u32, position: Vec2 },
    /// Spawn timer firings dropped because the population cap was reached.
    SpawnSkipped { firings: u64 },
    PlacementFailed { reason: String },
    SpeedBonusRaised { grade: f64, bonus: f64 },
    GoalReached(Outcome),
    PlayerCaught(Outcome),
}

/// Invalid use of the simulation clock.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    LevelNotStarted,
    ClockRegressed { previous: f64, now: f64 },
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationError::LevelNotStarted => {
                write!(f, "Tick before level start. Call start_level first")
            }
            SimulationError::ClockRegressed { previous, now } => write!(
                f,
                "Timestamp went backwards: {:.3}s after {:.3}s",
                now, previous
            ),
        }
    }
}

impl std::error::Error for SimulationError {}
