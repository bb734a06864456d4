//! Structured results requested from the language model.
//!
//! The model is always forced to call exactly one tool. Which tool is
//! selected by [`ToolRequest`]; its decoded arguments come back as a
//! [`ToolResponse`] so the note-patching code only ever sees plain structs.

use serde::{Deserialize, Serialize};

/// Summary of a single voice note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSummary {
    /// Foldout body: a short but detailed first-person summary
    pub summary: String,

    /// Foldout title: a few words capturing the note
    pub short_summary: String,
}

/// Action items extracted from a voice note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    /// Candidate task lines, e.g. `- [ ] Call the bank`
    #[serde(default)]
    pub tasks: Vec<String>,
}

/// Which tool the model is asked to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolRequest {
    /// `write_summary { summary, short_summary }`
    Summary,

    /// `write_new_task { tasks: [string] }`
    Tasks,
}

impl ToolRequest {
    /// Function name exposed to the model
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::Summary => "write_summary",
            Self::Tasks => "write_new_task",
        }
    }
}

impl std::fmt::Display for ToolRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tool_name())
    }
}

/// Decoded tool arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolResponse {
    Summary(NoteSummary),
    Tasks(TaskList),
}

impl ToolResponse {
    /// The request this response answers
    pub fn request(&self) -> ToolRequest {
        match self {
            Self::Summary(_) => ToolRequest::Summary,
            Self::Tasks(_) => ToolRequest::Tasks,
        }
    }

    /// Fold the response for a later prompt chunk into this one.
    ///
    /// Summaries are joined by a blank line and titles by `; `; task lists
    /// are concatenated. Returns `Err(other)` when the variants differ.
    pub fn merge(self, other: ToolResponse) -> Result<ToolResponse, ToolResponse> {
        match (self, other) {
            (Self::Summary(mut acc), Self::Summary(next)) => {
                acc.summary = join_non_empty(&acc.summary, &next.summary, "\n\n");
                acc.short_summary = join_non_empty(&acc.short_summary, &next.short_summary, "; ");
                Ok(Self::Summary(acc))
            }
            (Self::Tasks(mut acc), Self::Tasks(next)) => {
                acc.tasks.extend(next.tasks);
                Ok(Self::Tasks(acc))
            }
            (_, other) => Err(other),
        }
    }
}

fn join_non_empty(first: &str, second: &str, separator: &str) -> String {
    match (first.is_empty(), second.is_empty()) {
        (true, _) => second.to_string(),
        (_, true) => first.to_string(),
        _ => format!("{}{}{}", first, separator, second),
    }
}
