use serde::{Deserialize, Serialize};
use std::path::Path;

/// Retry budget for rejection sampling during spawn placement.
///
/// `max_attempts` bounds the samples drawn for a single item before the
/// separation constraints are halved. `max_relaxations` bounds how many times
/// that halving may happen before placement gives up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_max_relaxations")]
    pub max_relaxations: u32,
}

fn default_max_attempts() -> u32 {
    1000
}

fn default_max_relaxations() -> u32 {
    3
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        PlacementPolicy {
            max_attempts: 1000,
            max_relaxations: 3,
        }
    }
}

/// Parameters used to generate a level.
/// Stored with the level for reproducibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelParams {
    pub seed: u64,
    #[serde(default = "default_grid_size")]
    pub columns: u32,
    #[serde(default = "default_grid_size")]
    pub rows: u32,
    #[serde(default = "default_tile_size")]
    pub tile_size: f32,
    #[serde(default = "default_extent")]
    pub width: f32,
    #[serde(default = "default_extent")]
    pub height: f32,
    #[serde(default = "default_obstacle_count")]
    pub obstacle_count: u32,
    #[serde(default = "default_obstacle_size")]
    pub obstacle_size: f32,
    #[serde(default = "default_actor_size")]
    pub player_size: f32,
    #[serde(default = "default_actor_size")]
    pub enemy_size: f32,
    #[serde(default = "default_goal_size")]
    pub goal_size: f32,
    /// Distance kept from the level edge when sampling spawn positions.
    #[serde(default = "default_spawn_inset")]
    pub spawn_inset: f32,
    /// Tile groups the level's tile set provides.
    #[serde(default = "default_tile_groups")]
    pub tile_groups: Vec<String>,
    #[serde(default)]
    pub placement: PlacementPolicy,
}

fn default_grid_size() -> u32 {
    16
}
fn default_tile_size() -> f32 {
    128.0
}
fn default_extent() -> f32 {
    2048.0
}
fn default_obstacle_count() -> u32 {
    10
}
fn default_obstacle_size() -> f32 {
    96.0
}
fn default_actor_size() -> f32 {
    64.0
}
fn default_goal_size() -> f32 {
    128.0
}
fn default_spawn_inset() -> f32 {
    64.0
}
fn default_tile_groups() -> Vec<String> {
    vec![
        "Sand".to_string(),
        "Cobblestone".to_string(),
        "Water".to_string(),
    ]
}

impl Default for LevelParams {
    fn default() -> Self {
        LevelParams {
            seed: 0,
            columns: default_grid_size(),
            rows: default_grid_size(),
            tile_size: default_tile_size(),
            width: default_extent(),
            height: default_extent(),
            obstacle_count: default_obstacle_count(),
            obstacle_size: default_obstacle_size(),
            player_size: default_actor_size(),
            enemy_size: default_actor_size(),
            goal_size: default_goal_size(),
            spawn_inset: default_spawn_inset(),
            tile_groups: default_tile_groups(),
            placement: PlacementPolicy::default(),
        }
    }
}

impl LevelParams {
    /// Load level parameters from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        let params: Self = toml::from_str(&content)
            .map_err(|e| format!("Invalid TOML in {}: {}", path.display(), e))?;
        params.validate()?;
        Ok(params)
    }

    /// Validate parameter ranges.
    pub fn validate(&self) -> Result<(), String> {
        if self.columns == 0 || self.rows == 0 {
            return Err(format!(
                "columns and rows must be > 0, got {}x{}",
                self.columns, self.rows
            ));
        }
        if self.tile_size <= 0.0 {
            return Err(format!("tile_size must be > 0, got {}", self.tile_size));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(format!(
                "width and height must be > 0, got {}x{}",
                self.width, self.height
            ));
        }
        for (name, value) in [
            ("obstacle_size", self.obstacle_size),
            ("player_size", self.player_size),
            ("enemy_size", self.enemy_size),
            ("goal_size", self.goal_size),
        ] {
            if value <= 0.0 {
                return Err(format!("{} must be > 0, got {}", name, value));
            }
        }
        if self.goal_size > self.width.min(self.height) {
            return Err(format!(
                "goal_size must fit inside the level, got {} for {}x{}",
                self.goal_size, self.width, self.height
            ));
        }
        if self.spawn_inset < 0.0 || self.spawn_inset * 2.0 >= self.width.min(self.height) {
            return Err(format!(
                "spawn_inset must be >= 0 and leave room to spawn, got {}",
                self.spawn_inset
            ));
        }
        if self.placement.max_attempts == 0 {
            return Err("placement.max_attempts must be > 0, got 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let params = LevelParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.columns, 16);
        assert_eq!(params.rows, 16);
        assert_eq!(params.obstacle_count, 10);
        assert_eq!(params.tile_groups.len(), 3);
    }

    #[test]
    fn zero_grid_rejected() {
        let params = LevelParams {
            columns: 0,
            ..LevelParams::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.contains("columns"), "Error should mention columns: {}", err);
    }

    #[test]
    fn oversized_goal_rejected() {
        let params = LevelParams {
            goal_size: 4096.0,
            ..LevelParams::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.contains("goal_size"), "Error: {}", err);
    }

    #[test]
    fn negative_actor_size_rejected() {
        let params = LevelParams {
            player_size: -1.0,
            ..LevelParams::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.contains("player_size"), "Error: {}", err);
    }

    #[test]
    fn from_toml_string_fills_defaults() {
        let toml_str = r#"
seed = 42
columns = 8
"#;
        let params: LevelParams = toml::from_str(toml_str).unwrap();
        assert_eq!(params.seed, 42);
        assert_eq!(params.columns, 8);
        assert_eq!(params.rows, 16);
        assert_eq!(params.placement, PlacementPolicy::default());
        params.validate().unwrap();
    }

    #[test]
    fn from_file_valid() {
        let mut tmpfile = tempfile::NamedTempFile::new().unwrap();
        write!(
            tmpfile,
            r#"
seed = 7
obstacle_count = 4
tile_groups = ["Sand", "Water"]

[placement]
max_attempts = 50
"#
        )
        .unwrap();

        let params = LevelParams::from_file(tmpfile.path()).unwrap();
        assert_eq!(params.seed, 7);
        assert_eq!(params.obstacle_count, 4);
        assert_eq!(params.tile_groups, vec!["Sand", "Water"]);
        assert_eq!(params.placement.max_attempts, 50);
        assert_eq!(params.placement.max_relaxations, 3);
    }

    #[test]
    fn from_file_missing() {
        let err = LevelParams::from_file(Path::new("/nonexistent/level.toml")).unwrap_err();
        assert!(err.contains("Cannot read"), "Error: {}", err);
    }

    #[test]
    fn from_file_invalid_toml() {
        let mut tmpfile = tempfile::NamedTempFile::new().unwrap();
        write!(tmpfile, "this is not valid toml {{{{").unwrap();

        let err = LevelParams::from_file(tmpfile.path()).unwrap_err();
        assert!(err.contains("Invalid TOML"), "Error: {}", err);
    }
}
