pub mod snapshot;

pub use snapshot::{
    LevelFile, SnapshotError, list_levels, load_latest_level, load_level, save_level,
};
