//! Lifecycle of a single recording through the pipeline.

use serde::{Deserialize, Serialize};

/// Stage reached while processing one recording.
///
/// The note-patching part follows `Resolved → Loaded → Scanned → Inserted →
/// Saved`; `Failed` is reachable from every stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Recording picked up, nothing done yet
    Started,

    /// Transcript received
    Transcribed,

    /// Summary and tasks received from the language model
    Extracted,

    /// Daily note path computed
    Resolved,

    /// Daily note read into memory
    Loaded,

    /// Anchor lookup done
    Scanned,

    /// New lines spliced into the in-memory note
    Inserted,

    /// Note written back to disk
    Saved,

    /// Processing aborted
    Failed,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Started => "started",
            Self::Transcribed => "transcribed",
            Self::Extracted => "extracted",
            Self::Resolved => "resolved",
            Self::Loaded => "loaded",
            Self::Scanned => "scanned",
            Self::Inserted => "inserted",
            Self::Saved => "saved",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
