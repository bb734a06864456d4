//! Orchestrator Integration Tests
//!
//! Full recording → daily note runs against fake transcription and
//! language-model services in a scratch vault.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;
use voicejot::adapters::{HeuristicTokenCounter, LanguageModel, Transcriber};
use voicejot::core::{Journal, Orchestrator, Outcome, ProcessError};
use voicejot::domain::{NoteSummary, Stage, TaskList, ToolRequest, ToolResponse};
use voicejot::Config;

const RECORDING: &str = "Recording 20240101103000.webm";
const NOTE: &str = "Daily Notes/2024/01-January/2024-01-01-Monday.md";

/// Returns a fixed transcript, failing for file names containing `fail_on`
struct FakeTranscriber {
    fail_on: Option<String>,
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    fn name(&self) -> &str {
        "fake"
    }

    async fn transcribe(&self, _audio: Vec<u8>, file_name: &str, _language: &str) -> Result<String> {
        if let Some(pattern) = &self.fail_on {
            if file_name.contains(pattern.as_str()) {
                anyhow::bail!("service unavailable");
            }
        }
        Ok("Met the team, need to book the venue.".to_string())
    }
}

/// Answers every tool call with canned results
struct FakeModel {
    tasks: Vec<String>,
}

#[async_trait]
impl LanguageModel for FakeModel {
    fn name(&self) -> &str {
        "fake"
    }

    async fn call_tool(&self, _prompt: &str, request: ToolRequest) -> Result<ToolResponse> {
        Ok(match request {
            ToolRequest::Summary => ToolResponse::Summary(NoteSummary {
                summary: "Met the team.".to_string(),
                short_summary: "Team sync".to_string(),
            }),
            ToolRequest::Tasks => ToolResponse::Tasks(TaskList {
                tasks: self.tasks.clone(),
            }),
        })
    }
}

struct Vault {
    dir: TempDir,
}

impl Vault {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn note_path(&self) -> PathBuf {
        self.root().join(NOTE)
    }

    fn write_note(&self, content: &str) {
        let path = self.note_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn read_note(&self) -> String {
        std::fs::read_to_string(self.note_path()).unwrap()
    }

    fn add_recording(&self, name: &str) -> PathBuf {
        let path = self.root().join(name);
        std::fs::write(&path, name.as_bytes()).unwrap();
        path
    }

    fn journal(&self) -> Journal {
        Journal::new(self.root().join(".voicejot").join("journal.jsonl"))
    }

    fn orchestrator(&self, tasks: &[&str], fail_on: Option<&str>) -> Orchestrator {
        let config = Config::new(self.root().to_path_buf(), &self.root().join(".voicejot"));
        Orchestrator::new(
            config,
            Arc::new(FakeTranscriber {
                fail_on: fail_on.map(str::to_string),
            }),
            Arc::new(FakeModel {
                tasks: tasks.iter().map(|t| t.to_string()).collect(),
            }),
            Arc::new(HeuristicTokenCounter),
        )
        .with_journal(self.journal())
    }
}

fn morning() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap()
}

#[tokio::test]
async fn test_summary_and_tasks_patched_into_note() {
    let vault = Vault::new();
    vault.write_note("# Monday\n![[Recording 20240101103000.webm]]\n\n### Tasks\n- [ ] X\n\nNotes\n");
    let recording = vault.add_recording(RECORDING);

    let update = vault
        .orchestrator(&["- [ ] A", "- [ ] B"], None)
        .process_recording_at(&recording, morning())
        .await
        .unwrap();

    assert!(update.summary_inserted);
    assert_eq!(update.tasks.count(), 2);
    assert_eq!(update.note_path, vault.note_path());
    assert_eq!(
        vault.read_note(),
        "# Monday\n\
         ![[Recording 20240101103000.webm]]\n\
         >[!Tip]- 10:30: Team sync\n\
         > \"Met the team.\"\n\
         \n\
         ### Tasks\n\
         - [ ] X\n\
         - [ ] A\n\
         - [ ] B\n\
         \n\
         Notes\n"
    );
}

#[tokio::test]
async fn test_missing_note_is_not_created() {
    let vault = Vault::new();
    let recording = vault.add_recording(RECORDING);

    let failure = vault
        .orchestrator(&["- [ ] A"], None)
        .process_recording_at(&recording, morning())
        .await
        .unwrap_err();

    assert!(matches!(failure.error, ProcessError::NoteNotFound { .. }));
    assert_eq!(failure.stage, Stage::Resolved);
    assert_eq!(failure.note_path, Some(vault.note_path()));
    assert!(!vault.note_path().exists());
}

#[tokio::test]
async fn test_invalid_tasks_keep_summary() {
    let vault = Vault::new();
    vault.write_note("![[Recording 20240101103000.webm]]\n### Tasks\n- [ ] X\n");
    let recording = vault.add_recording(RECORDING);

    let update = vault
        .orchestrator(&["- [ ] ok", "buy milk"], None)
        .process_recording_at(&recording, morning())
        .await
        .unwrap();

    assert!(update.summary_inserted);
    assert_eq!(update.rejected_task.as_deref(), Some("buy milk"));
    assert_eq!(update.tasks.count(), 0);
    assert_eq!(
        vault.read_note(),
        "![[Recording 20240101103000.webm]]\n>[!Tip]- 10:30: Team sync\n> \"Met the team.\"\n### Tasks\n- [ ] X\n"
    );
}

#[tokio::test]
async fn test_no_embed_still_adds_tasks_in_new_section() {
    let vault = Vault::new();
    vault.write_note("# Monday\nNothing recorded here");
    let recording = vault.add_recording(RECORDING);

    let update = vault
        .orchestrator(&["- [ ] A"], None)
        .process_recording_at(&recording, morning())
        .await
        .unwrap();

    assert!(!update.summary_inserted);
    assert_eq!(vault.read_note(), "# Monday\nNothing recorded here\n\n### Tasks\n- [ ] A\n");
}

#[tokio::test]
async fn test_no_tasks_leaves_note_without_section() {
    let vault = Vault::new();
    vault.write_note("# Monday\n");
    let recording = vault.add_recording(RECORDING);

    vault
        .orchestrator(&[], None)
        .process_recording_at(&recording, morning())
        .await
        .unwrap();

    assert_eq!(vault.read_note(), "# Monday\n");
}

#[tokio::test]
async fn test_transcription_failure_leaves_note_alone() {
    let vault = Vault::new();
    vault.write_note("![[Recording 20240101103000.webm]]\n");
    let recording = vault.add_recording(RECORDING);

    let failure = vault
        .orchestrator(&["- [ ] A"], Some("Recording"))
        .process_recording_at(&recording, morning())
        .await
        .unwrap_err();

    assert_eq!(failure.error.kind(), "transcription");
    assert_eq!(failure.stage, Stage::Started);
    assert_eq!(vault.read_note(), "![[Recording 20240101103000.webm]]\n");
}

#[tokio::test]
async fn test_outcome_is_journaled() {
    let vault = Vault::new();
    let recording = vault.add_recording(RECORDING);
    let orchestrator = vault.orchestrator(&[], None);

    // No note yet
    assert!(orchestrator.process_and_record(&recording, morning()).await.is_err());

    vault.write_note("![[Recording 20240101103000.webm]]\n");
    assert!(orchestrator.process_and_record(&recording, morning()).await.is_ok());

    let entries = vault.journal().replay().await.unwrap();
    assert_eq!(entries.len(), 2);

    assert_eq!(entries[0].outcome, Outcome::Failed);
    assert_eq!(entries[0].error_kind.as_deref(), Some("note_not_found"));
    assert_eq!(entries[0].stage, Stage::Resolved);

    assert_eq!(entries[1].outcome, Outcome::Completed);
    assert!(entries[1].summary_inserted);
    assert_eq!(entries[1].recording_hash, entries[0].recording_hash);
}

#[tokio::test]
async fn test_batch_continues_after_failure() {
    let vault = Vault::new();
    vault.write_note("![[Recording 20240101080000.webm]]\n![[Recording 20240101103000.webm]]\n");
    vault.add_recording("Recording 20240101080000.webm");
    vault.add_recording(RECORDING);
    vault.add_recording("Recording 20240102090000.webm");

    let orchestrator = vault.orchestrator(&["- [ ] A"], Some("080000"));
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let report = orchestrator.run_batch(date, false).await.unwrap();

    assert_eq!(report.found, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);

    let note = vault.read_note();
    assert!(note.starts_with("![[Recording 20240101080000.webm]]\n![[Recording 20240101103000.webm]]\n>[!Tip]- "));
    assert!(note.ends_with("\n### Tasks\n- [ ] A\n"));
}

#[tokio::test]
async fn test_batch_can_skip_processed_recordings() {
    let vault = Vault::new();
    vault.write_note("![[Recording 20240101103000.webm]]\n");
    vault.add_recording(RECORDING);

    let orchestrator = vault.orchestrator(&[], None);
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let first = orchestrator.run_batch(date, true).await.unwrap();
    assert_eq!(first.succeeded, 1);

    let second = orchestrator.run_batch(date, true).await.unwrap();
    assert_eq!(second.skipped, 1);
    assert_eq!(second.succeeded, 0);

    assert_eq!(vault.read_note().matches("Team sync").count(), 1);
}

#[tokio::test]
async fn test_reprocessing_duplicates_summary() {
    let vault = Vault::new();
    vault.write_note("![[Recording 20240101103000.webm]]\n");
    vault.add_recording(RECORDING);

    let orchestrator = vault.orchestrator(&[], None);
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    orchestrator.run_batch(date, false).await.unwrap();
    orchestrator.run_batch(date, false).await.unwrap();

    assert_eq!(vault.read_note().matches("Team sync").count(), 2);
}
