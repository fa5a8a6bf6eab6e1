use std::collections::HashMap;

use serde::Serialize;

use crate::simulation::outcome::Outcome;
use crate::simulation::{SimEvent, TickFrame};
use crate::world::TerrainKind;

/// Aggregate metrics over a run, for summaries and tuning.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStatistics {
    pub ticks: u64,
    pub elapsed_secs: u64,
    pub enemies_spawned: u32,
    pub spawn_firings_skipped: u64,
    pub placement_failures: u32,
    pub bonus_raises: u32,
    pub final_speed_bonus: f64,
    pub peak_enemies: usize,
    /// Ticks the player spent on each terrain kind. Off-grid ticks are not counted.
    pub terrain_ticks: HashMap<TerrainKind, u64>,
    pub outcome: Option<Outcome>,
}

impl RunStatistics {
    pub fn record_frame(&mut self, frame: &TickFrame) {
        self.ticks = frame.tick;
        self.elapsed_secs = frame.elapsed_secs;
        self.final_speed_bonus = frame.speed_bonus;
        self.peak_enemies = self.peak_enemies.max(frame.enemies.len());
        if let Some(kind) = frame.terrain {
            *self.terrain_ticks.entry(kind).or_insert(0) += 1;
        }
        self.outcome = frame.outcome;
    }

    pub fn record_events(&mut self, events: &[SimEvent]) {
        for event in events {
            match event {
                SimEvent::EnemySpawned { .. } => self.enemies_spawned += 1,
                SimEvent::SpawnSkipped { firings } => self.spawn_firings_skipped += firings,
                SimEvent::PlacementFailed { .. } => self.placement_failures += 1,
                SimEvent::SpeedBonusRaised { .. } => self.bonus_raises += 1,
                SimEvent::GoalReached(_) | SimEvent::PlayerCaught(_) => {}
            }
        }
    }

    /// Share of terrain-sampled ticks spent on `kind`, in [0, 1].
    pub fn terrain_share(&self, kind: TerrainKind) -> f32 {
        let total: u64 = self.terrain_ticks.values().sum();
        if total == 0 {
            return 0.0;
        }
        *self.terrain_ticks.get(&kind).unwrap_or(&0) as f32 / total as f32
    }
}
