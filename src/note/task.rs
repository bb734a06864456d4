//! Task line syntax.

use std::sync::LazyLock;

use regex::Regex;

use super::NoteError;

/// `- [ ]`, `- [x]` or `- [X]`, a space, then non-blank task text
static TASK_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^- \[[ xX]\] +\S").expect("task line pattern is valid"));

/// Check a single line (without its terminator) against the task syntax
pub fn is_task_line(text: &str) -> bool {
    let text = text.trim_end_matches(['\r', '\n']);
    !text.contains(['\r', '\n']) && TASK_LINE_RE.is_match(text)
}

/// Validate a batch of candidate tasks.
///
/// All-or-nothing: the first invalid entry rejects the whole batch.
pub fn validate_tasks<S: AsRef<str>>(tasks: &[S]) -> Result<(), NoteError> {
    for task in tasks {
        let task = task.as_ref();
        if !is_task_line(task) {
            return Err(NoteError::InvalidTaskFormat(task.to_string()));
        }
    }
    Ok(())
}
