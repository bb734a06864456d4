//! Anchor lookup in a daily note.
//!
//! Two anchors are supported:
//! - the task section, a header line followed by a contiguous run of task lines
//! - an audio embed line, `![[<recording file name>]]`
//!
//! Both return an [`InsertionPoint`]: the index new lines are inserted before.

use super::task::is_task_line;

/// Line index new content is inserted before
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct InsertionPoint(usize);

impl InsertionPoint {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// State of the task-section scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Header not seen yet
    BeforeSection,

    /// Inside the section; `insert_at` is just past the last task seen
    InSection { insert_at: usize },

    /// First non-task line after the header reached
    SectionEnded { insert_at: usize },
}

impl ScanState {
    /// Feed the line at `index` to the scan
    pub fn step(self, index: usize, line: &str, header: &str) -> Self {
        match self {
            Self::BeforeSection if line.trim() == header => Self::InSection {
                insert_at: index + 1,
            },
            Self::BeforeSection => Self::BeforeSection,
            Self::InSection { insert_at } => {
                if line.trim() == header || is_task_line(line) {
                    Self::InSection {
                        insert_at: index + 1,
                    }
                } else {
                    Self::SectionEnded { insert_at }
                }
            }
            ended @ Self::SectionEnded { .. } => ended,
        }
    }

    /// Insertion point, if the header was found
    pub fn insertion_point(&self) -> Option<InsertionPoint> {
        match self {
            Self::BeforeSection => None,
            Self::InSection { insert_at } | Self::SectionEnded { insert_at } => {
                Some(InsertionPoint(*insert_at))
            }
        }
    }
}

/// Find where new tasks go: just past the last task line following the
/// first `header` line, or `None` if the note has no task section.
pub fn find_task_section<S: AsRef<str>>(lines: &[S], header: &str) -> Option<InsertionPoint> {
    let mut state = ScanState::BeforeSection;

    for (index, line) in lines.iter().enumerate() {
        state = state.step(index, line.as_ref(), header);
        if matches!(state, ScanState::SectionEnded { .. }) {
            break;
        }
    }

    state.insertion_point()
}

/// Embed line Obsidian writes for an attached recording
pub fn embed_marker(audio_file_name: &str) -> String {
    format!("![[{}]]", audio_file_name)
}

/// Find the line right after the first embed of `audio_file_name`
pub fn find_audio_embed<S: AsRef<str>>(lines: &[S], audio_file_name: &str) -> Option<InsertionPoint> {
    let marker = embed_marker(audio_file_name);

    lines
        .iter()
        .position(|line| line.as_ref().trim() == marker)
        .map(|index| InsertionPoint(index + 1))
}
