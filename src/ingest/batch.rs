//! Batch discovery of a day's recordings.
//!
//! Obsidian names recordings `Recording YYYYMMDDHHMMSS.<ext>` and drops them
//! in the vault root, so a day's batch is a single glob.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use glob::Pattern;

/// Glob pattern matching recordings made on `date`
pub fn recordings_pattern(dir: &Path, date: NaiveDate, extension: &str) -> String {
    let dir = Pattern::escape(&dir.to_string_lossy());
    format!("{}/Recording {}*.{}", dir, date.format("%Y%m%d"), extension)
}

/// Recordings in `dir` made on `date`, sorted by name (i.e. by time)
pub fn recordings_for_date(dir: &Path, date: NaiveDate, extension: &str) -> Result<Vec<PathBuf>> {
    let pattern = recordings_pattern(dir, date, extension);

    let mut paths = Vec::new();
    for entry in glob::glob(&pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))? {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!("Skipping unreadable path: {}", e),
        }
    }

    paths.sort();
    Ok(paths)
}
