use glam::Vec2;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::level::LevelParams;
use crate::world::geometry::{Bounds, Footprint};
use crate::world::spawn::{PlacementError, SpawnPlacer};
use crate::world::terrain::{TerrainKind, generate_terrain};
use crate::world::{Level, LevelWarning};

/// Generate a new level from the given parameters.
///
/// If `params.seed` is 0, a random seed is chosen. The actual seed used
/// is stored in the returned Level's `params` for reproducibility.
/// Parameters are validated first; invalid ones are returned as an error.
pub fn generate_level(params: &LevelParams) -> Result<Level, String> {
    params.validate()?;
    let seed = if params.seed == 0 {
        rand::thread_rng().r#gen()
    } else {
        params.seed
    };
    let resolved_params = LevelParams {
        seed,
        ..params.clone()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let bounds = Bounds::new(params.width, params.height);
    let mut warnings = Vec::new();

    let terrain = generate_terrain(params.columns, params.rows, seed, &params.tile_groups)
        .with_layout(params.tile_size, bounds.center());
    if terrain.is_degraded() {
        warnings.push(LevelWarning::MissingTileGroups(
            terrain.missing_groups.clone(),
        ));
    }

    let mut placer = SpawnPlacer::new(seed.wrapping_add(1), params.placement, params.spawn_inset);
    let goal_anchor = placer.place_goal(bounds, params.goal_size);
    let goal = Footprint::square(
        goal_anchor + Vec2::splat(params.goal_size / 2.0),
        params.goal_size,
    );

    let player_spawn = bounds.center();
    let obstacles = match placer.place_obstacles(
        params.obstacle_count,
        bounds,
        params.obstacle_size,
        player_spawn,
        params.player_size,
    ) {
        Ok(placement) => {
            if placement.relaxations > 0 {
                warnings.push(LevelWarning::SeparationRelaxed {
                    rounds: placement.relaxations,
                });
            }
            placement.obstacles
        }
        Err(PlacementError::Exhausted {
            placed, requested, ..
        }) => {
            warn!(
                placed = placed.len(),
                requested, "Level continues with fewer obstacles"
            );
            warnings.push(LevelWarning::ObstacleShortfall {
                placed: placed.len() as u32,
                requested,
            });
            placed
        }
    };

    let id = Uuid::from_bytes(rng.r#gen());
    info!(%id, seed, obstacles = obstacles.len(), "Level generated");

    Ok(Level {
        id,
        name: format!("Level-{}", seed),
        created_at: format!(
            "{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs()
        ),
        params: resolved_params,
        bounds,
        terrain,
        goal,
        obstacles,
        player_spawn,
        warnings,
    })
}

/// Print a summary of the generated level.
pub fn print_level_summary(level: &Level) {
    println!("=== Level Summary ===");
    println!("Name: {}", level.name);
    println!("Seed: {}", level.params.seed);
    println!(
        "Grid: {}x{} ({} units per tile)",
        level.terrain.columns, level.terrain.rows, level.terrain.tile_size
    );
    println!("Noise persistence: {:.1}", level.terrain.persistence);

    let total = (level.terrain.columns * level.terrain.rows) as f32;
    println!("\nTerrain:");
    for &kind in TerrainKind::all() {
        let count = level.terrain.count(kind);
        let pct = count as f32 / total * 100.0;
        println!("  {:<8} {:>5} ({:.1}%)", format!("{:?}", kind), count, pct);
    }

    println!(
        "\nGoal: ({:.0}, {:.0})",
        level.goal.center.x, level.goal.center.y
    );
    println!(
        "Player spawn: ({:.0}, {:.0})",
        level.player_spawn.x, level.player_spawn.y
    );
    println!("Obstacles: {}", level.obstacles.len());

    if !level.warnings.is_empty() {
        println!("\nWarnings:");
        for w in &level.warnings {
            println!("  {:?}", w);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_params() -> LevelParams {
        LevelParams {
            seed: 42,
            ..LevelParams::default()
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let a = generate_level(&default_params()).unwrap();
        let b = generate_level(&default_params()).unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(a.terrain, b.terrain);
        assert_eq!(a.goal, b.goal);
        assert_eq!(a.obstacles, b.obstacles);
    }

    #[test]
    fn default_level_is_complete() {
        let level = generate_level(&default_params()).unwrap();
        assert_eq!(level.obstacles.len(), 10);
        assert!(level.warnings.is_empty(), "warnings: {:?}", level.warnings);
        assert_eq!(level.player_spawn, Vec2::splat(1024.0));
        assert_eq!(level.terrain.origin, Vec2::ZERO);
        assert_eq!(level.goal.width(), 128.0);
        assert!(level.goal.min().x >= 0.0 && level.goal.max().x <= 2048.0);
        assert!(level.goal.min().y >= 0.0 && level.goal.max().y <= 2048.0);
    }

    #[test]
    fn missing_tile_groups_are_recorded() {
        let params = LevelParams {
            tile_groups: vec!["Sand".to_string()],
            ..default_params()
        };
        let level = generate_level(&params).unwrap();
        assert!(level.is_degraded());
        assert!(matches!(
            &level.warnings[0],
            LevelWarning::MissingTileGroups(groups) if groups.len() == 2
        ));
        assert_eq!(level.terrain.count(TerrainKind::Sand), 256);
    }

    #[test]
    fn impossible_obstacle_density_is_recoverable() {
        let params = LevelParams {
            width: 400.0,
            height: 400.0,
            obstacle_count: 40,
            obstacle_size: 96.0,
            goal_size: 64.0,
            spawn_inset: 32.0,
            placement: crate::config::level::PlacementPolicy {
                max_attempts: 50,
                max_relaxations: 1,
            },
            ..default_params()
        };
        let level = generate_level(&params).unwrap();
        assert!(level.obstacles.len() < 40);
        assert!(level.warnings.iter().any(|w| matches!(
            w,
            LevelWarning::ObstacleShortfall { requested: 40, .. }
        )));
    }

    #[test]
    fn seed_zero_generates_random() {
        let params = LevelParams {
            seed: 0,
            ..default_params()
        };
        let level = generate_level(&params).unwrap();
        assert_ne!(level.params.seed, 0, "Resolved seed should be non-zero");
    }

    #[test]
    fn invalid_params_are_rejected_without_panicking() {
        let params = LevelParams {
            width: 100.0,
            height: 100.0,
            goal_size: 32.0,
            ..default_params()
        };
        let err = generate_level(&params).unwrap_err();
        assert!(err.contains("spawn_inset"), "got: {}", err);
    }
}
