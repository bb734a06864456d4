//! Domain types for voicejot.
//!
//! - Extraction: what the language model hands back (summary, tasks)
//! - Stage: where a recording is in its processing lifecycle

pub mod extraction;
pub mod stage;

// Re-export commonly used types
pub use extraction::{NoteSummary, TaskList, ToolRequest, ToolResponse};
pub use stage::Stage;
