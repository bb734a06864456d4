//! Per-recording pipeline.
//!
//! Takes one recording from audio to a patched daily note, advancing through
//! [`Stage`]s. A failure at any stage is reported with the stage it happened
//! in; batch and watch runs record it and carry on with the next recording.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::adapters::{counter_for_model, LanguageModel, OpenAiClient, TokenCounter, Transcriber};
use crate::config::Config;
use crate::domain::Stage;
use crate::ingest::{recordings_for_date, RecordingWatcher};
use crate::note::{
    daily_note_path, find_audio_embed, find_task_section, insert_summary, insert_tasks, render_summary,
    validate_tasks, DailyNote, NoteError, TaskPlacement,
};

use super::extractor::Extractor;
use super::journal::{compute_file_hash, Journal, JournalEntry, Outcome};

/// Errors that can stop a recording from reaching its note
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Daily note not found: {path}")]
    NoteNotFound { path: PathBuf },

    #[error("Invalid task format: {task}")]
    InvalidTaskFormat { task: String },

    #[error("Transcription failed: {0:#}")]
    Transcription(anyhow::Error),

    #[error("AI service failed: {0:#}")]
    AiService(anyhow::Error),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProcessError {
    /// Stable name of the error kind, as written to the journal
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoteNotFound { .. } => "note_not_found",
            Self::InvalidTaskFormat { .. } => "invalid_task_format",
            Self::Transcription(_) => "transcription",
            Self::AiService(_) => "ai_service",
            Self::Io { .. } => "io",
        }
    }
}

impl From<NoteError> for ProcessError {
    fn from(error: NoteError) -> Self {
        match error {
            NoteError::NoteNotFound(path) => Self::NoteNotFound { path },
            NoteError::InvalidTaskFormat(task) => Self::InvalidTaskFormat { task },
            NoteError::Io { path, source } => Self::Io { path, source },
        }
    }
}

/// A [`ProcessError`] with the stage it happened in
#[derive(Debug, Error)]
#[error("{error} (stage: {stage})")]
pub struct Failure {
    /// Last stage reached before the failure
    pub stage: Stage,

    /// Note that was being patched, once resolved
    pub note_path: Option<PathBuf>,

    #[source]
    pub error: ProcessError,
}

impl Failure {
    fn new(stage: Stage, note_path: Option<&Path>, error: impl Into<ProcessError>) -> Self {
        Self {
            stage,
            note_path: note_path.map(Path::to_path_buf),
            error: error.into(),
        }
    }
}

/// What processing a recording did to its note
#[derive(Debug, Clone)]
pub struct NoteUpdate {
    pub recording: PathBuf,
    pub note_path: PathBuf,
    pub summary_inserted: bool,
    pub tasks: TaskPlacement,
    /// Set when the task batch was discarded; holds the offending line
    pub rejected_task: Option<String>,
}

/// Totals for a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub found: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub tasks_rejected: usize,
}

/// Drives recordings through transcription, extraction and note patching
pub struct Orchestrator {
    config: Config,
    transcriber: Arc<dyn Transcriber>,
    extractor: Extractor,
    journal: Option<Journal>,
}

impl Orchestrator {
    /// Create an orchestrator from its collaborators; no journal is kept
    pub fn new(
        config: Config,
        transcriber: Arc<dyn Transcriber>,
        model: Arc<dyn LanguageModel>,
        counter: Arc<dyn TokenCounter>,
    ) -> Self {
        let extractor = Extractor::new(model, counter, config.chunking);
        Self {
            config,
            transcriber,
            extractor,
            journal: None,
        }
    }

    /// Record every outcome to `journal`
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// OpenAI-backed orchestrator journaling to the configured path
    pub fn from_config(config: Config) -> Result<Self> {
        let client = Arc::new(OpenAiClient::new(
            config.require_api_key()?.to_string(),
            config.api_base_url.clone(),
            config.model.clone(),
        ));
        let counter = counter_for_model(&config.model);
        let journal = Journal::new(config.journal_path.clone());

        Ok(Self::new(config, client.clone(), client, counter).with_journal(journal))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Process and record a recording against today's note
    pub async fn process_recording(&self, recording: &Path) -> Result<NoteUpdate, Failure> {
        self.process_and_record(recording, Local::now().naive_local()).await
    }

    /// Process a recording as if it were `now`: the date picks the note and
    /// the time stamps the summary.
    #[instrument(skip(self, recording), fields(recording = %recording.display()))]
    pub async fn process_recording_at(&self, recording: &Path, now: NaiveDateTime) -> Result<NoteUpdate, Failure> {
        let mut stage = Stage::Started;
        let file_name = recording
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let audio = tokio::fs::read(recording).await.map_err(|source| {
            Failure::new(
                stage,
                None,
                ProcessError::Io {
                    path: recording.to_path_buf(),
                    source,
                },
            )
        })?;

        info!(bytes = audio.len(), "Transcribing recording");
        let transcript = self
            .transcriber
            .transcribe(audio, &file_name, &self.config.language)
            .await
            .map_err(|e| Failure::new(stage, None, ProcessError::Transcription(e)))?;
        stage = advance(stage, Stage::Transcribed);

        let prompt = format!("Voice note transcription:\n{}", transcript);
        let summary = self
            .extractor
            .summarize(&prompt)
            .await
            .map_err(|e| Failure::new(stage, None, ProcessError::AiService(e)))?;
        let tasks = self
            .extractor
            .extract_tasks(&prompt)
            .await
            .map_err(|e| Failure::new(stage, None, ProcessError::AiService(e)))?;
        stage = advance(stage, Stage::Extracted);

        // Tasks are checked before the note is touched; a bad batch is
        // dropped but the summary still goes in
        let (tasks, rejected_task) = match validate_tasks(&tasks.tasks) {
            Ok(()) => (tasks.tasks, None),
            Err(NoteError::InvalidTaskFormat(task)) => {
                warn!(task = %task, "Discarding task batch with invalid line");
                (Vec::new(), Some(task))
            }
            Err(other) => return Err(Failure::new(stage, None, other)),
        };

        let note_path = daily_note_path(&self.config.note_root, now.date());
        stage = advance(stage, Stage::Resolved);

        let mut note = DailyNote::load(&note_path)
            .await
            .map_err(|e| Failure::new(stage, Some(&note_path), e))?;
        stage = advance(stage, Stage::Loaded);

        // Summary pass
        let anchor = find_audio_embed(note.lines(), &file_name);
        stage = advance(stage, Stage::Scanned);
        let summary_inserted = insert_summary(note.lines_mut(), anchor, &render_summary(&summary, now.time()));
        if !summary_inserted {
            info!("No embed for {} in {}, summary not attached", file_name, note_path.display());
        }
        stage = advance(stage, Stage::Inserted);

        // Task pass, over the same lines so it sees the summary
        let placement = if tasks.is_empty() {
            TaskPlacement::Skipped
        } else {
            let section = find_task_section(note.lines(), &self.config.task_header);
            stage = advance(stage, Stage::Scanned);
            let placement = insert_tasks(note.lines_mut(), section, &self.config.task_header, &tasks);
            stage = advance(stage, Stage::Inserted);
            placement
        };

        note.save().await.map_err(|e| Failure::new(stage, Some(&note_path), e))?;
        advance(stage, Stage::Saved);

        info!(
            note = %note_path.display(),
            summary_inserted,
            tasks = placement.count(),
            "Daily note updated"
        );

        Ok(NoteUpdate {
            recording: recording.to_path_buf(),
            note_path,
            summary_inserted,
            tasks: placement,
            rejected_task,
        })
    }

    /// Process a recording, log the outcome and append it to the journal.
    /// Failures are returned for reporting but have already been handled.
    pub async fn process_and_record(&self, recording: &Path, now: NaiveDateTime) -> Result<NoteUpdate, Failure> {
        let result = self.process_recording_at(recording, now).await;

        match &result {
            Ok(update) => {
                if let Some(task) = &update.rejected_task {
                    warn!(
                        recording = %recording.display(),
                        note = %update.note_path.display(),
                        task = %task,
                        "Tasks rejected, summary kept"
                    );
                }
            }
            Err(failure) => {
                advance(failure.stage, Stage::Failed);
                error!(
                    recording = %recording.display(),
                    note = ?failure.note_path,
                    stage = %failure.stage,
                    kind = failure.error.kind(),
                    "Processing failed: {}",
                    failure.error
                );
            }
        }

        if let Some(journal) = &self.journal {
            let entry = journal_entry(recording, &result).await;
            if let Err(e) = journal.append(&entry) {
                warn!("Failed to write journal entry: {}", e);
            }
        }

        result
    }

    /// Process every recording made on `date`, one after another
    pub async fn run_batch(&self, date: NaiveDate, skip_processed: bool) -> Result<BatchReport> {
        let watch = &self.config.watch;
        let recordings = recordings_for_date(&watch.watch_path, date, &watch.extension)?;
        info!(count = recordings.len(), %date, "Starting batch");

        let completed = match (&self.journal, skip_processed) {
            (Some(journal), true) => journal
                .completed_hashes()
                .await
                .context("Failed to read processing journal")?,
            _ => Default::default(),
        };

        let mut report = BatchReport {
            found: recordings.len(),
            ..Default::default()
        };

        for recording in recordings {
            if already_processed(&recording, &completed).await {
                info!("Already processed, skipping: {}", recording.display());
                report.skipped += 1;
                continue;
            }

            let now = date.and_time(Local::now().time());
            match self.process_and_record(&recording, now).await {
                Ok(update) => {
                    report.succeeded += 1;
                    if update.rejected_task.is_some() {
                        report.tasks_rejected += 1;
                    }
                }
                Err(_) => report.failed += 1,
            }
        }

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            "Batch finished"
        );
        Ok(report)
    }

    /// Watch for new recordings until Ctrl+C
    pub async fn run_watch(&self) -> Result<()> {
        let watcher = RecordingWatcher::with_config(self.config.watch.clone());
        let (mut events, handle) = watcher.watch()?;

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        warn!("Watcher closed");
                        break;
                    };
                    debug!(size = event.size, "Recording event");
                    // Errors are logged and journaled inside
                    let _ = self.process_recording(&event.path).await;
                }
                _ = &mut ctrl_c => {
                    info!("Interrupted, stopping watcher");
                    break;
                }
            }
        }

        handle.stop().await
    }
}

fn advance(from: Stage, to: Stage) -> Stage {
    debug!(from = %from, to = %to, "Stage");
    to
}

/// Whether the journal shows this recording's content as completed. A
/// recording that cannot be hashed is treated as new.
async fn already_processed(recording: &Path, completed: &HashSet<String>) -> bool {
    if completed.is_empty() {
        return false;
    }
    match compute_file_hash(recording).await {
        Ok(hash) => completed.contains(&hash),
        Err(e) => {
            warn!("Failed to hash {}, processing anyway: {}", recording.display(), e);
            false
        }
    }
}

async fn journal_entry(recording: &Path, result: &Result<NoteUpdate, Failure>) -> JournalEntry {
    let recording_hash = compute_file_hash(recording).await.ok();

    match result {
        Ok(update) => JournalEntry {
            timestamp: Utc::now(),
            recording: recording.to_path_buf(),
            recording_hash,
            note_path: Some(update.note_path.clone()),
            outcome: Outcome::Completed,
            stage: Stage::Saved,
            error_kind: update.rejected_task.as_ref().map(|_| "invalid_task_format".to_string()),
            error: update.rejected_task.as_ref().map(|task| format!("Invalid task format: {}", task)),
            summary_inserted: update.summary_inserted,
            tasks_inserted: update.tasks.count(),
        },
        Err(failure) => JournalEntry {
            timestamp: Utc::now(),
            recording: recording.to_path_buf(),
            recording_hash,
            note_path: failure.note_path.clone(),
            outcome: Outcome::Failed,
            stage: failure.stage,
            error_kind: Some(failure.error.kind().to_string()),
            error: Some(failure.error.to_string()),
            summary_inserted: false,
            tasks_inserted: 0,
        },
    }
}
