//! Persistence layer.
//!
//! Two durable pieces, both plain JSON files:
//! - the rig list, written by the external setup flow and re-read on
//!   every tick so configuration changes are picked up without a
//!   restart;
//! - the per-chat transaction cursors, written by this daemon after
//!   every successful wallet advance. The cursor file is what prevents
//!   a replay storm after a restart, so it is flushed eagerly rather
//!   than kept in memory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

use crate::types::{Rig, StoreError};

/// Store contract consumed by the monitor: the current rig list plus
/// cursor load/save per chat.
pub trait Store: Send + Sync {
    fn rigs(&self) -> Result<Vec<Rig>, StoreError>;
    fn cursor(&self, chat_id: i64) -> Result<Option<String>, StoreError>;
    fn set_cursor(&self, chat_id: i64, hash: &str) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

pub struct FileStore {
    rigs_path: PathBuf,
    cursors_path: PathBuf,
    cursors: Mutex<HashMap<i64, String>>,
}

impl FileStore {
    /// Open the store, loading any persisted cursors. A missing cursor
    /// file means a fresh start; a missing rig file just means no rigs
    /// are configured yet.
    pub fn open(rigs_path: impl Into<PathBuf>, cursors_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let rigs_path = rigs_path.into();
        let cursors_path = cursors_path.into();

        let cursors = if cursors_path.exists() {
            let raw = read_file(&cursors_path)?;
            let map: HashMap<i64, String> = parse_json(&cursors_path, &raw)?;
            info!(
                path = %cursors_path.display(),
                chats = map.len(),
                "cursors loaded from disk"
            );
            map
        } else {
            info!(path = %cursors_path.display(), "no cursor file found, starting fresh");
            HashMap::new()
        };

        Ok(Self {
            rigs_path,
            cursors_path,
            cursors: Mutex::new(cursors),
        })
    }

    fn flush(&self, cursors: &HashMap<i64, String>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(cursors).map_err(|e| StoreError::Parse {
            path: self.cursors_path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(&self.cursors_path, json).map_err(|source| StoreError::Io {
            path: self.cursors_path.display().to_string(),
            source,
        })?;
        debug!(path = %self.cursors_path.display(), "cursors saved");
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<i64, String>> {
        match self.cursors.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Store for FileStore {
    fn rigs(&self) -> Result<Vec<Rig>, StoreError> {
        if !self.rigs_path.exists() {
            debug!(path = %self.rigs_path.display(), "rig file missing, nothing to monitor");
            return Ok(Vec::new());
        }
        let raw = read_file(&self.rigs_path)?;
        parse_json(&self.rigs_path, &raw)
    }

    fn cursor(&self, chat_id: i64) -> Result<Option<String>, StoreError> {
        Ok(self.lock().get(&chat_id).cloned())
    }

    fn set_cursor(&self, chat_id: i64, hash: &str) -> Result<(), StoreError> {
        let mut cursors = self.lock();
        let previous = cursors.insert(chat_id, hash.to_string());
        if let Err(e) = self.flush(&cursors) {
            // Keep memory and disk in agreement: a cursor that failed
            // to persist is treated as never advanced, so the entries
            // are re-replayed rather than silently lost.
            match previous {
                Some(p) => cursors.insert(chat_id, p),
                None => cursors.remove(&chat_id),
            };
            return Err(e);
        }
        Ok(())
    }
}

fn read_file(path: &Path) -> Result<String, StoreError> {
    std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn parse_json<T: serde::de::DeserializeOwned>(path: &Path, raw: &str) -> Result<T, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
