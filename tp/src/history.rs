//! History log - one JSON line per generated itinerary
//!
//! Entries are only ever appended. Writers take an exclusive advisory lock on
//! the file for the duration of a single line write, so concurrent
//! submissions serialize instead of clobbering each other. Readers take a
//! shared lock.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::planner::PlanRecord;

/// File name of the log inside the history directory
pub const HISTORY_FILE: &str = "history.jsonl";

/// Errors reading or writing the history log
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("History I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("History serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One past request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Time-ordered id (UUID v7)
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub city: String,
    /// Interests as typed, not split
    pub interests: String,
    pub itinerary: String,
}

impl HistoryEntry {
    pub fn new(city: impl Into<String>, interests: impl Into<String>, itinerary: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            created_at: Utc::now(),
            city: city.into(),
            interests: interests.into(),
            itinerary: itinerary.into(),
        }
    }

    pub fn from_record(record: &PlanRecord) -> Self {
        Self::new(record.city(), record.interests_raw(), record.itinerary())
    }
}

/// Releases the advisory lock when dropped
struct LockGuard<'a>(&'a File);

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(self.0) {
            warn!(error = %e, "LockGuard: failed to unlock history file");
        }
    }
}

/// Append-only history log
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    /// Open (creating the directory if needed) the log in `dir`
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(HISTORY_FILE);
        debug!(?path, "HistoryLog::open: called");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry as a single JSON line
    pub fn append(&self, entry: &HistoryEntry) -> Result<(), HistoryError> {
        debug!(id = %entry.id, city = %entry.city, "HistoryLog::append: called");
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        FileExt::lock_exclusive(&file)?;
        let _guard = LockGuard(&file);

        let mut writer = &file;
        writer.write_all(line.as_bytes())?;
        writer.flush()?;

        info!(id = %entry.id, "Recorded history entry");
        Ok(())
    }

    /// Load every entry in submission order
    ///
    /// A missing file is an empty history. Lines that fail to parse are
    /// skipped with a warning.
    pub fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        debug!(path = ?self.path, "HistoryLog::load: called");
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        FileExt::lock_shared(&file)?;
        let _guard = LockGuard(&file);

        let mut entries = Vec::new();
        for (number, line) in BufReader::new(&file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<HistoryEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!(line = number + 1, error = %e, "HistoryLog::load: skipping malformed line");
                }
            }
        }

        debug!(count = entries.len(), "HistoryLog::load: loaded entries");
        Ok(entries)
    }

    /// Entry by 1-based position
    pub fn get(&self, index: usize) -> Result<Option<HistoryEntry>, HistoryError> {
        if index == 0 {
            return Ok(None);
        }
        Ok(self.load()?.into_iter().nth(index - 1))
    }

    /// Most recent `limit` entries, oldest first
    pub fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, HistoryError> {
        let entries = self.load()?;
        let skip = entries.len().saturating_sub(limit);
        Ok(entries.into_iter().skip(skip).collect())
    }
}

/// Render entries as one JSON array of `{city, interests, itinerary, ...}` objects
pub fn to_json_array(entries: &[HistoryEntry]) -> Result<String, HistoryError> {
    Ok(serde_json::to_string_pretty(entries)?)
}
