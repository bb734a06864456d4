//! Daily note location.
//!
//! Notes are partitioned as
//! `<root>/Daily Notes/<YYYY>/<MM>-<MonthName>/<YYYY-MM-DD>-<WeekdayName>.md`.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, NaiveDate};

/// Folder under the note root holding all daily notes
pub const DAILY_NOTES_DIR: &str = "Daily Notes";

/// Path of the daily note for `date`
pub fn daily_note_path(root: &Path, date: NaiveDate) -> PathBuf {
    root.join(DAILY_NOTES_DIR)
        .join(date.year().to_string())
        .join(date.format("%m-%B").to_string())
        .join(format!("{}.md", date.format("%Y-%m-%d-%A")))
}

/// Path of today's daily note, using the local clock
pub fn todays_note_path(root: &Path) -> PathBuf {
    daily_note_path(root, Local::now().date_naive())
}
