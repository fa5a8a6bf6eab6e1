//! Saved levels: one bincode file per level, named `level-{seed}-{timestamp}.bin`.

use std::cmp::Reverse;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::world::Level;

/// A level file found on disk.
#[derive(Debug, Clone)]
pub struct LevelFile {
    pub path: PathBuf,
    pub seed: u64,
    pub timestamp: u64,
    pub file_size: u64,
}

impl LevelFile {
    fn name_for(seed: u64, timestamp: u64) -> String {
        format!("level-{}-{}.bin", seed, timestamp)
    }

    /// Recognize a saved level from its path. Hidden files, directories and
    /// foreign names are not levels.
    fn from_path(path: &Path) -> Option<LevelFile> {
        let name = path.file_name()?.to_str()?;
        let (seed, timestamp) = name
            .strip_prefix("level-")?
            .strip_suffix(".bin")?
            .split_once('-')?;
        let seed = seed.parse().ok()?;
        let timestamp = timestamp.parse().ok()?;

        let metadata = fs::metadata(path).ok()?;
        metadata.is_file().then(|| LevelFile {
            path: path.to_path_buf(),
            seed,
            timestamp,
            file_size: metadata.len(),
        })
    }
}

#[derive(Debug)]
pub enum SnapshotError {
    Io(io::Error),
    Codec(bincode::Error),
    /// Decoded, but the terrain does not match its own grid size.
    Corrupt(PathBuf),
    /// No readable level in the directory.
    Empty(PathBuf),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Io(e) => write!(f, "I/O error: {}", e),
            SnapshotError::Codec(e) => write!(f, "Level encoding error: {}", e),
            SnapshotError::Corrupt(path) => {
                write!(f, "Corrupt level file: {}", path.display())
            }
            SnapshotError::Empty(dir) => write!(
                f,
                "No saved levels in {}. Generate one with: hideandseek generate",
                dir.display()
            ),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotError::Io(e) => Some(e),
            SnapshotError::Codec(e) => Some(&**e),
            _ => None,
        }
    }
}

impl From<io::Error> for SnapshotError {
    fn from(e: io::Error) -> Self {
        SnapshotError::Io(e)
    }
}

impl From<bincode::Error> for SnapshotError {
    fn from(e: bincode::Error) -> Self {
        SnapshotError::Codec(e)
    }
}

/// Write `bytes` next to `target` under a hidden name, then rename over it.
/// On failure the hidden file is removed and `target` is untouched.
fn write_atomic(target: &Path, bytes: &[u8]) -> io::Result<()> {
    let name = target
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "target has no file name"))?;
    let tmp = target.with_file_name(format!(".{}.tmp", name.to_string_lossy()));

    let result = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, target));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

/// Save a level into `dir`, creating it if needed. Returns the new file's path.
pub fn save_level(level: &Level, dir: &Path) -> Result<PathBuf, SnapshotError> {
    fs::create_dir_all(dir)?;
    let encoded = bincode::serialize(level)?;

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let target = dir.join(LevelFile::name_for(level.params.seed, timestamp));
    write_atomic(&target, &encoded)?;

    debug!(path = %target.display(), bytes = encoded.len(), "Level saved");
    Ok(target)
}

/// Load a level, rejecting files whose terrain does not match its grid size.
pub fn load_level(path: &Path) -> Result<Level, SnapshotError> {
    let level: Level = bincode::deserialize(&fs::read(path)?)?;
    if !level.terrain.is_consistent() || level.terrain.columns == 0 {
        return Err(SnapshotError::Corrupt(path.to_path_buf()));
    }
    Ok(level)
}

/// Saved levels in `dir`, newest first. A missing directory lists as empty.
pub fn list_levels(dir: &Path) -> Result<Vec<LevelFile>, SnapshotError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut levels = Vec::new();
    for entry in fs::read_dir(dir)? {
        if let Some(level) = LevelFile::from_path(&entry?.path()) {
            levels.push(level);
        }
    }
    levels.sort_by_key(|l| Reverse((l.timestamp, l.seed)));
    Ok(levels)
}

/// Load the newest readable level in `dir`, skipping corrupt files.
pub fn load_latest_level(dir: &Path) -> Result<Level, SnapshotError> {
    for file in list_levels(dir)? {
        match load_level(&file.path) {
            Ok(level) => return Ok(level),
            Err(e) => {
                warn!(path = %file.path.display(), error = %e, "Skipping unreadable level");
            }
        }
    }
    Err(SnapshotError::Empty(dir.to_path_buf()))
}
