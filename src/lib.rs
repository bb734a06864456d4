//! voicejot - Voice memos into your daily note
//!
//! Transcribes voice recordings, asks a language model for a summary and a
//! task list, and patches both into the day's Markdown note: the summary as
//! a callout under the recording's embed, the tasks at the end of the task
//! section.
//!
//! # Architecture
//!
//! Each recording goes through one pipeline, fully, before the next:
//! - transcribe → summarize + extract tasks (chunked when the prompt is long)
//! - validate tasks → load note → insert summary → insert tasks → save once
//! - outcome appended to a JSONL journal
//!
//! # Modules
//!
//! - `adapters`: External services (OpenAI transcription and tool calls, token counting)
//! - `core`: Orchestration (Extractor, Journal, Orchestrator)
//! - `domain`: Data structures (tool requests/responses, stages)
//! - `note`: Daily note path, scanning and insertion
//! - `ingest`: Recording discovery (watcher, batch)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Process today's recordings
//! voicejot batch
//!
//! # Watch the vault for new recordings
//! voicejot watch
//!
//! # See what happened
//! voicejot history
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod ingest;
pub mod note;

// Re-export main types at crate root for convenience
pub use config::Config;
pub use core::{BatchReport, Journal, NoteUpdate, Orchestrator, ProcessError};
pub use domain::{NoteSummary, Stage, TaskList, ToolRequest, ToolResponse};
pub use note::{DailyNote, NoteError};
