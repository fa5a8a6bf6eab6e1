use serde::Deserialize;
use std::path::Path;

use crate::world::terrain::TerrainKind;

/// Weights and limits for enemy steering.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    pub wander_weight: f32,
    pub seek_weight: f32,
    pub avoid_weight: f32,
    /// How far ahead (in steering time units) obstacle avoidance looks.
    pub avoid_horizon: f32,
    /// Maximum heading change per wander sample, in radians.
    pub wander_jitter: f32,
    pub max_speed: f32,
    pub max_acceleration: f32,
    /// Multiplier applied to real delta time before agents are advanced.
    pub time_scale: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        SteeringConfig {
            wander_weight: 10.0,
            seek_weight: 0.01,
            avoid_weight: 100.0,
            avoid_horizon: 0.1,
            wander_jitter: 0.5,
            max_speed: 50.0,
            max_acceleration: 100.0,
            time_scale: 5.0,
        }
    }
}

/// Thresholds of the difficulty rule set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    pub bonus_interval_secs: u64,
    pub bonus_grade: f64,
    pub crowd_threshold: u32,
    pub crowd_grade: f64,
    pub horde_threshold: u32,
    pub horde_grade: f64,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        DifficultyConfig {
            bonus_interval_secs: 15,
            bonus_grade: 0.5,
            crowd_threshold: 10,
            crowd_grade: 0.1,
            horde_threshold: 20,
            horde_grade: 0.2,
        }
    }
}

/// Player speed per terrain kind, in units per second.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TerrainSpeeds {
    pub sand: f32,
    pub water: f32,
    pub stone: f32,
}

impl Default for TerrainSpeeds {
    fn default() -> Self {
        TerrainSpeeds {
            sand: 100.0,
            water: 40.0,
            stone: 160.0,
        }
    }
}

impl TerrainSpeeds {
    /// Speed for the terrain under the player. No cell means sand.
    pub fn speed_for(&self, terrain: Option<TerrainKind>) -> f32 {
        match terrain {
            Some(TerrainKind::Stone) => self.stone,
            Some(TerrainKind::Water) => self.water,
            Some(TerrainKind::Sand) | None => self.sand,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_frame_rate")]
    pub frame_rate_hz: f32,
    #[serde(default = "default_spawn_interval")]
    pub spawn_interval_secs: f64,
    #[serde(default = "default_population_cap")]
    pub population_cap: u32,
    #[serde(default = "default_enemy_base_speed")]
    pub enemy_base_speed: f32,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub steering: SteeringConfig,
    #[serde(default)]
    pub difficulty: DifficultyConfig,
    #[serde(default)]
    pub terrain_speeds: TerrainSpeeds,
}

fn default_frame_rate() -> f32 {
    60.0
}
fn default_spawn_interval() -> f64 {
    5.0
}
fn default_population_cap() -> u32 {
    30
}
fn default_enemy_base_speed() -> f32 {
    50.0
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            frame_rate_hz: default_frame_rate(),
            spawn_interval_secs: default_spawn_interval(),
            population_cap: default_population_cap(),
            enemy_base_speed: default_enemy_base_speed(),
            log_level: default_log_level(),
            steering: SteeringConfig::default(),
            difficulty: DifficultyConfig::default(),
            terrain_speeds: TerrainSpeeds::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let config: SimulationConfig =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        if self.frame_rate_hz <= 0.0 {
            errors.push(format!(
                "frame_rate_hz must be > 0.0, got {}. Example: frame_rate_hz = 60.0",
                self.frame_rate_hz
            ));
        }

        if self.spawn_interval_secs <= 0.0 {
            errors.push(format!(
                "spawn_interval_secs must be > 0.0, got {}. Example: spawn_interval_secs = 5.0",
                self.spawn_interval_secs
            ));
        }

        if self.enemy_base_speed < 0.0 {
            errors.push(format!(
                "enemy_base_speed must be >= 0.0, got {}. Example: enemy_base_speed = 50.0",
                self.enemy_base_speed
            ));
        }

        let s = &self.steering;
        if s.max_speed <= 0.0 || s.max_acceleration <= 0.0 {
            errors.push(format!(
                "steering.max_speed and steering.max_acceleration must be > 0.0, got {} and {}",
                s.max_speed, s.max_acceleration
            ));
        }
        if s.time_scale <= 0.0 {
            errors.push(format!(
                "steering.time_scale must be > 0.0, got {}. Example: time_scale = 5.0",
                s.time_scale
            ));
        }
        if s.wander_weight < 0.0 || s.seek_weight < 0.0 || s.avoid_weight < 0.0 {
            errors.push("steering weights must be >= 0.0".to_string());
        }

        let d = &self.difficulty;
        if d.bonus_interval_secs == 0 {
            errors.push(
                "difficulty.bonus_interval_secs must be > 0, got 0. Example: bonus_interval_secs = 15"
                    .to_string(),
            );
        }
        for (name, grade) in [
            ("bonus_grade", d.bonus_grade),
            ("crowd_grade", d.crowd_grade),
            ("horde_grade", d.horde_grade),
        ] {
            if !(0.0..=1.0).contains(&grade) {
                errors.push(format!("difficulty.{} must be 0.0-1.0, got {}", name, grade));
            }
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn test_path() -> PathBuf {
        PathBuf::from("test-config.toml")
    }

    #[test]
    fn defaults_applied_for_empty_config() {
        let config = SimulationConfig::from_toml_str("", &test_path()).unwrap();
        assert_eq!(config.frame_rate_hz, 60.0);
        assert_eq!(config.spawn_interval_secs, 5.0);
        assert_eq!(config.population_cap, 30);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.steering, SteeringConfig::default());
        assert_eq!(config.difficulty, DifficultyConfig::default());
        assert_eq!(config.terrain_speeds, TerrainSpeeds::default());
    }

    #[test]
    fn nested_tables_override_fields() {
        let toml = r#"
            population_cap = 12

            [steering]
            time_scale = 2.5
            seek_weight = 1.0

            [terrain_speeds]
            water = 20.0
        "#;
        let config = SimulationConfig::from_toml_str(toml, &test_path()).unwrap();
        assert_eq!(config.population_cap, 12);
        assert_eq!(config.steering.time_scale, 2.5);
        assert_eq!(config.steering.seek_weight, 1.0);
        assert_eq!(config.steering.wander_weight, 10.0);
        assert_eq!(config.terrain_speeds.water, 20.0);
        assert_eq!(config.terrain_speeds.stone, 160.0);
    }

    #[test]
    fn terrain_speed_lookup() {
        let speeds = TerrainSpeeds::default();
        assert_eq!(speeds.speed_for(Some(TerrainKind::Stone)), 160.0);
        assert_eq!(speeds.speed_for(Some(TerrainKind::Water)), 40.0);
        assert_eq!(speeds.speed_for(Some(TerrainKind::Sand)), 100.0);
        assert_eq!(speeds.speed_for(None), 100.0);
    }

    #[test]
    fn invalid_spawn_interval_rejected() {
        let err =
            SimulationConfig::from_toml_str("spawn_interval_secs = 0.0", &test_path()).unwrap_err();
        assert!(err.contains("spawn_interval_secs"));
    }

    #[test]
    fn invalid_grade_rejected() {
        let err = SimulationConfig::from_toml_str("[difficulty]\nbonus_grade = 1.5", &test_path())
            .unwrap_err();
        assert!(err.contains("bonus_grade"));
    }

    #[test]
    fn invalid_log_level_rejected() {
        let err =
            SimulationConfig::from_toml_str(r#"log_level = "verbose""#, &test_path()).unwrap_err();
        assert!(err.contains("log_level"));
    }

    #[test]
    fn multiple_errors_reported_together() {
        let toml = "frame_rate_hz = 0.0\nspawn_interval_secs = -1.0\n[steering]\ntime_scale = 0.0";
        let err = SimulationConfig::from_toml_str(toml, &test_path()).unwrap_err();
        assert!(err.contains("frame_rate_hz"));
        assert!(err.contains("spawn_interval_secs"));
        assert!(err.contains("time_scale"));
    }

    #[test]
    fn malformed_toml_includes_source_path() {
        let err = SimulationConfig::from_toml_str("frame_rate_hz = [invalid", &test_path())
            .unwrap_err();
        assert!(err.contains("test-config.toml"));
    }

    #[test]
    fn from_file_loads_valid_config() {
        let mut tmp = NamedTempFile::new().unwrap();
        use std::io::Write;
        writeln!(tmp, "population_cap = 5").unwrap();
        let config = SimulationConfig::from_file(tmp.path()).unwrap();
        assert_eq!(config.population_cap, 5);
    }

    #[test]
    fn from_file_missing_file_error() {
        let err = SimulationConfig::from_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(err.contains("Cannot read"));
    }
}
