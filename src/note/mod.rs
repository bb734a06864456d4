//! Daily note patching.
//!
//! Locates a day's note, finds an anchor line in it and splices generated
//! content in without disturbing anything else:
//!
//! 1. **path**: `<root>/Daily Notes/<YYYY>/<MM>-<Month>/<date>-<Weekday>.md`
//! 2. **store**: load/save as lines with terminators preserved
//! 3. **scanner**: task-section and audio-embed anchors
//! 4. **inserter**: order-preserving splice, or a fresh task section
//! 5. **task**: task line syntax, checked before any write
//! 6. **summary**: callout rendering for summaries

pub mod inserter;
pub mod path;
pub mod scanner;
pub mod store;
pub mod summary;
pub mod task;

use std::path::{Path, PathBuf};

use thiserror::Error;

// Re-export key types
pub use inserter::{insert_lines, insert_summary, insert_tasks, TaskPlacement};
pub use path::{daily_note_path, todays_note_path};
pub use scanner::{embed_marker, find_audio_embed, find_task_section, InsertionPoint, ScanState};
pub use summary::render_summary;
pub use task::{is_task_line, validate_tasks};

/// Default task section header
pub const DEFAULT_TASK_HEADER: &str = "### Tasks";

/// Errors that can occur while patching a note
#[derive(Debug, Error)]
pub enum NoteError {
    #[error("Daily note not found: {0}")]
    NoteNotFound(PathBuf),

    #[error("Invalid task format: {0}")]
    InvalidTaskFormat(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A daily note held in memory as lines
#[derive(Debug, Clone)]
pub struct DailyNote {
    path: PathBuf,
    lines: Vec<String>,
}

impl DailyNote {
    /// Wrap already-loaded lines
    pub fn new(path: PathBuf, lines: Vec<String>) -> Self {
        Self { path, lines }
    }

    /// Read the note at `path`; fails with `NoteNotFound` if it doesn't exist
    pub async fn load(path: &Path) -> Result<Self, NoteError> {
        let lines = store::load_lines(path).await?;
        Ok(Self::new(path.to_path_buf(), lines))
    }

    /// Write the note back, replacing the file
    pub async fn save(&self) -> Result<(), NoteError> {
        store::save_lines(&self.path, &self.lines).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut Vec<String> {
        &mut self.lines
    }

    /// Full note text
    pub fn content(&self) -> String {
        self.lines.concat()
    }

    /// Scan for the embed of `audio_file_name` and insert `summary_lines`
    /// after it. Returns `false` (note untouched) when there is no embed.
    pub fn attach_summary<S: AsRef<str>>(&mut self, audio_file_name: &str, summary_lines: &[S]) -> bool {
        let anchor = find_audio_embed(&self.lines, audio_file_name);
        insert_summary(&mut self.lines, anchor, summary_lines)
    }

    /// Validate `tasks`, then add them to the section under `header`
    /// (created at the end of the note if missing).
    pub fn add_tasks<S: AsRef<str>>(&mut self, header: &str, tasks: &[S]) -> Result<TaskPlacement, NoteError> {
        validate_tasks(tasks)?;
        let section = find_task_section(&self.lines, header);
        Ok(insert_tasks(&mut self.lines, section, header, tasks))
    }
}
