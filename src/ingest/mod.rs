//! Recording ingestion.
//!
//! Two ways a recording reaches the pipeline:
//!
//! 1. **Watcher**: file-created events in the vault, stability-checked
//! 2. **Batch**: every recording of a given day, found by name
//!
//! # Architecture
//!
//! ```text
//! Vault (Recording *.webm) → Watcher ─┐
//!                                      ├→ Orchestrator → Daily note
//! Vault (Recording YYYYMMDD*) → Batch ─┘
//! ```

pub mod batch;
pub mod watcher;

// Re-export key types
pub use batch::recordings_for_date;
pub use watcher::{RecordingEvent, RecordingWatcher, WatchHandle, WatcherConfig, WatcherError};
