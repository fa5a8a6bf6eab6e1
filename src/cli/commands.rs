use std::path::Path;

use glam::Vec2;
use tracing::{debug, info, warn};

use crate::config::level::LevelParams;
use crate::config::simulation::SimulationConfig;
use crate::persistence;
use crate::simulation::statistics::RunStatistics;
use crate::simulation::{SimEvent, SimulationClock};
use crate::world::generation::{generate_level, print_level_summary};
use crate::world::{Level, TerrainKind};

/// Options for a headless run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Upper bound on ticks; the run also stops at the first outcome.
    pub max_ticks: u64,
    /// Print a JSON frame every this many ticks. 0 disables frame output.
    pub frame_every: u64,
    /// Constant joystick vector held for the whole run.
    pub input: Vec2,
}

/// Resolve where a run's level comes from.
///
/// A `.toml` path is read as level parameters and generated fresh; any other
/// path is loaded as a saved level. Without a path, the newest saved level in
/// `levels_dir` is used.
pub fn load_level_source(source: Option<&str>, levels_dir: &Path) -> Result<Level, String> {
    match source {
        Some(path) if path.ends_with(".toml") => {
            let params = LevelParams::from_file(Path::new(path))?;
            info!(path, "Generating level from parameters");
            generate_level(&params)
        }
        Some(path) => {
            info!(path, "Loading saved level");
            persistence::load_level(Path::new(path))
                .map_err(|e| format!("Failed to load level: {}", e))
        }
        None => {
            info!(dir = %levels_dir.display(), "Loading newest saved level");
            persistence::load_latest_level(levels_dir)
                .map_err(|e| format!("Failed to load level: {}", e))
        }
    }
}

/// Run a level without rendering, on a fixed timestep at the configured frame rate.
pub fn run_headless(
    config: &SimulationConfig,
    level: Level,
    options: &RunOptions,
) -> Result<RunStatistics, String> {
    let hz = config.frame_rate_hz as f64;
    let mut clock = SimulationClock::new(config.clone());
    clock.start_level(level);
    clock.on_input_vector(options.input.x, options.input.y);

    let mut stats = RunStatistics::default();
    for i in 0..options.max_ticks {
        let frame = clock
            .on_tick(i as f64 / hz)
            .map_err(|e| format!("Tick {} failed: {}", i, e))?;
        let events = clock.drain_events();
        log_events(frame.tick, &events);
        stats.record_events(&events);
        stats.record_frame(&frame);

        if options.frame_every > 0 && frame.tick % options.frame_every == 0 {
            let json = serde_json::to_string(&frame)
                .map_err(|e| format!("Cannot encode frame: {}", e))?;
            println!("{}", json);
        }
        if frame.outcome.is_some() {
            break;
        }
    }

    Ok(stats)
}

fn log_events(tick: u64, events: &[SimEvent]) {
    for event in events {
        match event {
            SimEvent::EnemySpawned { id, position } => {
                debug!(tick, id, x = position.x, y = position.y, "Enemy spawned");
            }
            SimEvent::SpawnSkipped { firings } => {
                debug!(tick, firings, "Spawn skipped at population cap");
            }
            SimEvent::PlacementFailed { reason } => {
                warn!(tick, %reason, "Enemy placement failed");
            }
            SimEvent::SpeedBonusRaised { grade, bonus } => {
                debug!(tick, grade, bonus, "Speed bonus raised");
            }
            SimEvent::GoalReached(outcome) | SimEvent::PlayerCaught(outcome) => {
                info!(tick, kind = ?outcome.kind, elapsed = outcome.elapsed_secs, "Run finished");
            }
        }
    }
}

pub fn print_run_summary(stats: &RunStatistics) {
    println!("=== Run Summary ===");
    println!("Ticks: {}", stats.ticks);
    println!("Elapsed: {}s", stats.elapsed_secs);
    println!(
        "Enemies: {} spawned, peak {} on field",
        stats.enemies_spawned, stats.peak_enemies
    );
    if stats.spawn_firings_skipped > 0 || stats.placement_failures > 0 {
        println!(
            "Spawns missed: {} at cap, {} unplaceable",
            stats.spawn_firings_skipped, stats.placement_failures
        );
    }
    println!(
        "Speed bonus: {:.2} after {} raises",
        stats.final_speed_bonus, stats.bonus_raises
    );
    println!("\nTerrain under player:");
    for &kind in TerrainKind::all() {
        println!(
            "  {:<8} {:>5.1}%",
            format!("{:?}", kind),
            stats.terrain_share(kind) * 100.0
        );
    }
    match stats.outcome {
        Some(outcome) => println!("\n{:?} at {}s: {}", outcome.kind, outcome.elapsed_secs, outcome.rank),
        None => println!("\nNo outcome before the tick limit"),
    }
}

/// Print a saved level: summary, then the terrain map if asked.
pub fn inspect(path: &Path, show_map: bool) -> Result<(), String> {
    let level =
        persistence::load_level(path).map_err(|e| format!("Failed to load level: {}", e))?;
    println!("ID: {}", level.id);
    println!("Created: {}", level.created_at);
    print_level_summary(&level);
    if show_map {
        println!("\nMap (top row first, S sand, # stone, ~ water):");
        for line in terrain_map(&level) {
            println!("  {}", line);
        }
    }
    Ok(())
}

/// One line per grid row, highest row first so the map reads like the screen.
pub fn terrain_map(level: &Level) -> Vec<String> {
    let terrain = &level.terrain;
    (0..terrain.rows)
        .rev()
        .map(|row| {
            (0..terrain.columns)
                .map(|column| match terrain.cell(column, row).map(|c| c.kind) {
                    Some(TerrainKind::Sand) => 'S',
                    Some(TerrainKind::Stone) => '#',
                    Some(TerrainKind::Water) => '~',
                    None => ' ',
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn small_level(seed: u64) -> Level {
        generate_level(&LevelParams {
            seed,
            columns: 6,
            rows: 4,
            ..LevelParams::default()
        })
        .unwrap()
    }

    #[test]
    fn map_has_one_line_per_row() {
        let level = small_level(5);
        let map = terrain_map(&level);
        assert_eq!(map.len(), 4);
        assert!(map.iter().all(|line| line.chars().count() == 6));
        assert!(
            map.iter()
                .flat_map(|l| l.chars())
                .all(|c| matches!(c, 'S' | '#' | '~'))
        );
    }

    #[test]
    fn toml_source_generates_a_level() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "seed = 99\ncolumns = 5\nrows = 5").unwrap();

        let level =
            load_level_source(Some(file.path().to_str().unwrap()), Path::new("unused")).unwrap();
        assert_eq!(level.params.seed, 99);
        assert_eq!(level.terrain.columns, 5);
    }

    #[test]
    fn saved_source_and_latest_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let saved = persistence::save_level(&small_level(12), dir.path()).unwrap();

        let by_path = load_level_source(Some(saved.to_str().unwrap()), dir.path()).unwrap();
        let latest = load_level_source(None, dir.path()).unwrap();
        assert_eq!(by_path, latest);
    }

    #[test]
    fn empty_levels_dir_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_level_source(None, dir.path()).unwrap_err();
        assert!(err.contains("No saved levels"), "got: {}", err);
    }

    #[test]
    fn headless_run_stops_at_tick_limit() {
        let config = SimulationConfig {
            spawn_interval_secs: 1.0e6,
            ..SimulationConfig::default()
        };
        let options = RunOptions {
            max_ticks: 120,
            frame_every: 0,
            input: Vec2::ZERO,
        };
        let stats = run_headless(&config, small_level(3), &options).unwrap();
        assert_eq!(stats.ticks, 120);
        assert_eq!(stats.elapsed_secs, 1);
        assert_eq!(stats.enemies_spawned, 0);
        assert!(stats.outcome.is_none());
    }

    #[test]
    fn headless_run_spawns_on_schedule() {
        let config = SimulationConfig {
            spawn_interval_secs: 1.0,
            enemy_base_speed: 0.0,
            ..SimulationConfig::default()
        };
        let options = RunOptions {
            max_ticks: 60 * 3 + 1,
            frame_every: 0,
            input: Vec2::ZERO,
        };
        let stats = run_headless(&config, small_level(8), &options).unwrap();
        assert_eq!(stats.enemies_spawned + stats.placement_failures, 3);
    }
}
