//! Core processing logic.
//!
//! This module contains:
//! - Extractor: chunked summary/task requests to the language model
//! - Journal: append-only record of each recording's outcome
//! - Orchestrator: per-recording pipeline, batch and watch runs

pub mod extractor;
pub mod journal;
pub mod orchestrator;

// Re-export commonly used types
pub use extractor::Extractor;
pub use journal::{compute_file_hash, Journal, JournalEntry, JournalError, Outcome};
pub use orchestrator::{BatchReport, Failure, NoteUpdate, Orchestrator, ProcessError};
