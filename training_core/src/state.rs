//! Player state persistence.
//!
//! The whole player state lives in one JSON document. Reads take a shared
//! lock; writes go through a locked temp file that is renamed over the
//! original so a crash never leaves a half-written document behind.

use crate::{Error, PlayerState, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Receives the full player state after every accepted command
pub trait StateSink {
    fn save(&mut self, state: &PlayerState) -> Result<()>;
}

/// State sink backed by a JSON file
#[derive(Clone, Debug)]
pub struct JsonStateFile {
    path: PathBuf,
}

impl JsonStateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored state, falling back to defaults
    pub fn load(&self) -> Result<PlayerState> {
        PlayerState::load(&self.path)
    }
}

impl StateSink for JsonStateFile {
    fn save(&mut self, state: &PlayerState) -> Result<()> {
        state.save(&self.path)
    }
}

/// In-memory sink that records what was saved
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    pub saves: usize,
    pub last: Option<PlayerState>,
}

impl StateSink for MemorySink {
    fn save(&mut self, state: &PlayerState) -> Result<()> {
        self.saves += 1;
        self.last = Some(state.clone());
        Ok(())
    }
}

fn read_locked(path: &Path) -> std::io::Result<String> {
    let file = File::open(path)?;
    file.lock_shared()?;

    let mut contents = String::new();
    let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
    let unlocked = file.unlock();
    read?;
    unlocked?;
    Ok(contents)
}

impl PlayerState {
    /// Load player state from a file
    ///
    /// A missing file yields a fresh state. An unreadable or corrupted
    /// file is logged and also yields a fresh state.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No state file at {:?}, starting fresh", path);
            return Ok(Self::default());
        }

        let contents = match read_locked(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!("Unable to read state file {:?}: {}. Starting fresh.", path, e);
                return Ok(Self::default());
            }
        };

        match serde_json::from_str::<PlayerState>(&contents) {
            Ok(state) => {
                tracing::debug!("Loaded player state from {:?}", path);
                Ok(state)
            }
            Err(e) => {
                tracing::warn!("Corrupt state file {:?}: {}. Starting fresh.", path, e);
                Ok(Self::default())
            }
        }
    }

    /// Atomically write player state to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved player state to {:?}", path);
        Ok(())
    }

    /// Load, modify and save state in one step
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut PlayerState) -> Result<()>,
    {
        let mut state = Self::load(path)?;
        f(&mut state)?;
        state.save(path)?;
        Ok(state)
    }
}
