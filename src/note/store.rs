//! Reading and writing daily notes.
//!
//! Whole-file replace: the note is read into lines (terminators kept) and
//! written back verbatim, so untouched content round-trips byte for byte.

use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;

use super::NoteError;

/// Split note content into lines, keeping each line's terminator
pub fn split_lines(content: &str) -> Vec<String> {
    content.split_inclusive('\n').map(str::to_owned).collect()
}

/// Load a note's lines. A missing file is `NoteNotFound`, never created.
pub async fn load_lines(path: &Path) -> Result<Vec<String>, NoteError> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(split_lines(&content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(NoteError::NoteNotFound(path.to_path_buf())),
        Err(e) => Err(NoteError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Truncate the note and write `lines` back verbatim
pub async fn save_lines<S: AsRef<str>>(path: &Path, lines: &[S]) -> Result<(), NoteError> {
    let content: String = lines.iter().map(|line| line.as_ref()).collect();

    fs::write(path, content).await.map_err(|e| NoteError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
