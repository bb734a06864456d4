//! Splicing generated content into a note's lines.
//!
//! Lines carry their own terminators. New lines are given the note's line
//! ending; existing lines are never reordered or removed.

use super::scanner::InsertionPoint;

/// Where a batch of tasks ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPlacement {
    /// Added to the existing task section starting at this point
    AppendedToSection { at: InsertionPoint, count: usize },

    /// No section existed; a new one was appended at the end of the note
    CreatedSection { count: usize },

    /// Nothing to insert
    Skipped,
}

impl TaskPlacement {
    /// Number of task lines inserted
    pub fn count(&self) -> usize {
        match self {
            Self::AppendedToSection { count, .. } | Self::CreatedSection { count } => *count,
            Self::Skipped => 0,
        }
    }
}

/// Line ending used by the note (`\r\n` if its first terminated line has one)
pub fn line_ending<S: AsRef<str>>(lines: &[S]) -> &'static str {
    match lines.iter().map(|line| line.as_ref()).find(|line| line.ends_with('\n')) {
        Some(line) if line.ends_with("\r\n") => "\r\n",
        _ => "\n",
    }
}

/// Give the line before `index` a terminator if it lacks one, so content
/// inserted at `index` starts on its own line.
fn terminate_line_before(lines: &mut [String], index: usize, eol: &str) {
    if let Some(previous) = index.checked_sub(1).and_then(|i| lines.get_mut(i)) {
        if !previous.ends_with('\n') {
            previous.push_str(eol);
        }
    }
}

fn with_ending(text: &str, eol: &str) -> String {
    format!("{}{}", text.trim_end_matches(['\r', '\n']), eol)
}

/// Insert `new_lines` in order, the first one at `point`.
///
/// Returns the number of lines inserted.
pub fn insert_lines<S: AsRef<str>>(
    lines: &mut Vec<String>,
    point: InsertionPoint,
    new_lines: &[S],
) -> usize {
    if new_lines.is_empty() {
        return 0;
    }

    let eol = line_ending(lines.as_slice());
    let mut at = point.index().min(lines.len());
    terminate_line_before(lines, at, eol);

    for line in new_lines {
        lines.insert(at, with_ending(line.as_ref(), eol));
        at += 1;
    }

    new_lines.len()
}

/// Append a blank separator, `header`, then `tasks` at the end of the note
pub fn append_task_section<S: AsRef<str>>(lines: &mut Vec<String>, header: &str, tasks: &[S]) {
    let eol = line_ending(lines.as_slice());
    let len = lines.len();
    terminate_line_before(lines, len, eol);

    lines.push(eol.to_string());
    lines.push(with_ending(header, eol));
    lines.extend(tasks.iter().map(|task| with_ending(task.as_ref(), eol)));
}

/// Insert validated task lines into the task section found by the scanner,
/// or create a new section when there is none.
pub fn insert_tasks<S: AsRef<str>>(
    lines: &mut Vec<String>,
    section: Option<InsertionPoint>,
    header: &str,
    tasks: &[S],
) -> TaskPlacement {
    if tasks.is_empty() {
        return TaskPlacement::Skipped;
    }

    match section {
        Some(at) => {
            let count = insert_lines(lines, at, tasks);
            TaskPlacement::AppendedToSection { at, count }
        }
        None => {
            append_task_section(lines, header, tasks);
            TaskPlacement::CreatedSection { count: tasks.len() }
        }
    }
}

/// Insert a rendered summary right after its audio embed.
///
/// Without an anchor this is a no-op: the summary has nothing to attach to.
/// Returns whether anything was inserted.
pub fn insert_summary<S: AsRef<str>>(
    lines: &mut Vec<String>,
    anchor: Option<InsertionPoint>,
    summary_lines: &[S],
) -> bool {
    match anchor {
        Some(at) => insert_lines(lines, at, summary_lines) > 0,
        None => false,
    }
}
