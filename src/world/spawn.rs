use glam::Vec2;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::config::level::PlacementPolicy;
use crate::world::geometry::{Bounds, Footprint, Obstacle};

/// Placement ran out of attempts even after relaxing its constraints.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementError {
    Exhausted {
        what: &'static str,
        placed: Vec<Obstacle>,
        requested: u32,
    },
}

impl std::fmt::Display for PlacementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlacementError::Exhausted {
                what,
                placed,
                requested,
            } => write!(
                f,
                "Placement exhausted for {}: placed {} of {}",
                what,
                placed.len(),
                requested
            ),
        }
    }
}

impl std::error::Error for PlacementError {}

/// Obstacles accepted by `place_obstacles`, with how often constraints were relaxed.
#[derive(Debug, Clone, PartialEq)]
pub struct ObstaclePlacement {
    pub obstacles: Vec<Obstacle>,
    pub relaxations: u32,
}

/// Seeded rejection sampler for goals, obstacles and enemies.
#[derive(Debug, Clone)]
pub struct SpawnPlacer {
    rng: ChaCha8Rng,
    policy: PlacementPolicy,
    inset: f32,
}

impl SpawnPlacer {
    pub fn new(seed: u64, policy: PlacementPolicy, inset: f32) -> Self {
        SpawnPlacer {
            rng: ChaCha8Rng::seed_from_u64(seed),
            policy,
            inset,
        }
    }

    /// One of the four corners, offset inward so a goal of `goal_size` stays on screen.
    /// Returns the goal's lower-left anchor.
    pub fn place_goal(&mut self, bounds: Bounds, goal_size: f32) -> Vec2 {
        let far_x = bounds.width - goal_size;
        let far_y = bounds.height - goal_size;
        let corners = [
            Vec2::new(0.0, 0.0),
            Vec2::new(far_x, 0.0),
            Vec2::new(0.0, far_y),
            Vec2::new(far_x, far_y),
        ];
        corners[self.rng.gen_range(0..corners.len())]
    }

    fn sample(&mut self, bounds: Bounds) -> Vec2 {
        let x = self.rng.gen_range(self.inset..=bounds.width - self.inset);
        let y = self.rng.gen_range(self.inset..=bounds.height - self.inset);
        Vec2::new(x, y)
    }

    /// Place `count` square obstacles of side `obstacle_size`.
    ///
    /// A candidate is rejected when its center is within `2 x obstacle_size` of an
    /// accepted obstacle or within `2 x player_size` of `player_spawn`.
    pub fn place_obstacles(
        &mut self,
        count: u32,
        bounds: Bounds,
        obstacle_size: f32,
        player_spawn: Vec2,
        player_size: f32,
    ) -> Result<ObstaclePlacement, PlacementError> {
        let mut obstacles: Vec<Obstacle> = Vec::with_capacity(count as usize);
        let mut obstacle_gap = obstacle_size * 2.0;
        let mut player_gap = player_size * 2.0;
        let mut relaxations = 0;

        while obstacles.len() < count as usize {
            let accepted = (0..self.policy.max_attempts).find_map(|_| {
                let candidate = self.sample(bounds);
                let crowded = obstacles
                    .iter()
                    .any(|o| o.footprint.center.distance(candidate) < obstacle_gap);
                let blocks_spawn = candidate.distance(player_spawn) < player_gap;
                (!crowded && !blocks_spawn).then_some(candidate)
            });

            match accepted {
                Some(center) => {
                    obstacles.push(Obstacle::new(Footprint::square(center, obstacle_size)));
                }
                None if relaxations < self.policy.max_relaxations => {
                    relaxations += 1;
                    obstacle_gap /= 2.0;
                    player_gap /= 2.0;
                    warn!(
                        placed = obstacles.len(),
                        requested = count,
                        obstacle_gap,
                        player_gap,
                        "Obstacle placement relaxed separation"
                    );
                }
                None => {
                    return Err(PlacementError::Exhausted {
                        what: "obstacles",
                        placed: obstacles,
                        requested: count,
                    });
                }
            }
        }

        debug!(count, relaxations, "Obstacles placed");
        Ok(ObstaclePlacement {
            obstacles,
            relaxations,
        })
    }

    /// Find a spawn point at least `min_separation` away from the player.
    ///
    /// Relaxation halves the separation each round but never below `floor`.
    pub fn place_enemy(
        &mut self,
        bounds: Bounds,
        player_position: Vec2,
        min_separation: f32,
        floor: f32,
    ) -> Result<Vec2, PlacementError> {
        let mut gap = min_separation.max(floor);
        for round in 0..=self.policy.max_relaxations {
            if round > 0 {
                let relaxed = (gap / 2.0).max(floor);
                if relaxed == gap {
                    break;
                }
                gap = relaxed;
                warn!(gap, round, "Enemy placement relaxed separation");
            }
            for _ in 0..self.policy.max_attempts {
                let candidate = self.sample(bounds);
                if candidate.distance(player_position) >= gap {
                    return Ok(candidate);
                }
            }
        }
        Err(PlacementError::Exhausted {
            what: "enemy",
            placed: Vec::new(),
            requested: 1,
        })
    }
}
