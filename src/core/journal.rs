//! Append-only processing journal.
//!
//! One JSON line per processed recording: where it got to, which note it
//! touched and why it failed. Appends take an exclusive file lock so a
//! watcher and a batch run can share the journal.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::domain::Stage;

/// Errors that can occur with the journal
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// How a recording's processing ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Completed,
    Failed,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A single journal line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// When processing ended
    pub timestamp: DateTime<Utc>,

    /// Recording path
    pub recording: PathBuf,

    /// Content hash of the recording (12 hex chars)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_hash: Option<String>,

    /// Daily note touched (or that would have been)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_path: Option<PathBuf>,

    pub outcome: Outcome,

    /// Last stage reached
    pub stage: Stage,

    /// Error kind (`note_not_found`, `invalid_task_format`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default)]
    pub summary_inserted: bool,

    #[serde(default)]
    pub tasks_inserted: usize,
}

/// JSONL processing journal
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry under an exclusive lock
    pub fn append(&self, entry: &JournalEntry) -> Result<(), JournalError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;

        file.lock_exclusive()?;
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)?;
        file.flush()?;

        // Lock is released when file is dropped
        Ok(())
    }

    /// Read every entry, oldest first. Unparseable lines are skipped.
    pub async fn replay(&self) -> Result<Vec<JournalEntry>, JournalError> {
        let mut entries = Vec::new();

        if !self.path.exists() {
            return Ok(entries);
        }

        let file = File::open(&self.path).await?;
        let mut lines = BufReader::new(file).lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<JournalEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!("Skipping malformed journal line: {}", e),
            }
        }

        Ok(entries)
    }

    /// Most recent entries, newest first
    pub async fn recent(&self, limit: usize) -> Result<Vec<JournalEntry>, JournalError> {
        let mut entries = self.replay().await?;
        entries.reverse();
        entries.truncate(limit);
        Ok(entries)
    }

    /// Hashes of recordings that completed at least once
    pub async fn completed_hashes(&self) -> Result<HashSet<String>, JournalError> {
        Ok(self
            .replay()
            .await?
            .into_iter()
            .filter(|entry| entry.outcome == Outcome::Completed)
            .filter_map(|entry| entry.recording_hash)
            .collect())
    }
}

/// Compute SHA256 hash of file content (first 12 hex chars)
pub async fn compute_file_hash(path: &Path) -> Result<String, std::io::Error> {
    let content = tokio::fs::read(path).await?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    let result = hasher.finalize();

    Ok(hex::encode(&result[..6]))
}
