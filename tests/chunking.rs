//! Chunking Integration Tests
//!
//! Prompts over the token threshold are sent in ordered parts and the
//! per-part answers merged back together.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use voicejot::adapters::{counter_for_model, ChunkSettings, HeuristicTokenCounter, LanguageModel, TokenCounter};
use voicejot::core::Extractor;
use voicejot::domain::{NoteSummary, TaskList, ToolRequest, ToolResponse};

/// Counts one token per character
struct CharCounter;

impl TokenCounter for CharCounter {
    fn count(&self, text: &str) -> usize {
        text.chars().count()
    }
}

/// Echoes each prompt part back and remembers what it was sent
#[derive(Default)]
struct RecordingModel {
    prompts: Mutex<Vec<String>>,
}

impl RecordingModel {
    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for RecordingModel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn call_tool(&self, prompt: &str, request: ToolRequest) -> Result<ToolResponse> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        Ok(match request {
            ToolRequest::Summary => ToolResponse::Summary(NoteSummary {
                summary: prompt.to_string(),
                short_summary: prompt.len().to_string(),
            }),
            ToolRequest::Tasks => ToolResponse::Tasks(TaskList {
                tasks: vec![format!("- [ ] {}", prompt)],
            }),
        })
    }
}

/// Always answers with a summary, whatever was asked
struct ConfusedModel;

#[async_trait]
impl LanguageModel for ConfusedModel {
    fn name(&self) -> &str {
        "confused"
    }

    async fn call_tool(&self, _prompt: &str, _request: ToolRequest) -> Result<ToolResponse> {
        Ok(ToolResponse::Summary(NoteSummary {
            summary: "wrong".to_string(),
            short_summary: "wrong".to_string(),
        }))
    }
}

fn small_limits() -> ChunkSettings {
    ChunkSettings {
        token_threshold: 10,
        chunk_chars: 4,
    }
}

#[tokio::test]
async fn test_prompt_at_threshold_is_one_request() {
    let model = Arc::new(RecordingModel::default());
    let extractor = Extractor::new(model.clone(), Arc::new(CharCounter), small_limits());

    let summary = extractor.summarize("abcdefghij").await.unwrap();

    assert_eq!(model.prompts(), vec!["abcdefghij"]);
    assert_eq!(summary.summary, "abcdefghij");
}

#[tokio::test]
async fn test_prompt_over_threshold_is_split_in_order() {
    let model = Arc::new(RecordingModel::default());
    let extractor = Extractor::new(model.clone(), Arc::new(CharCounter), small_limits());

    let summary = extractor.summarize("abcdefghijk").await.unwrap();

    assert_eq!(model.prompts(), vec!["abcd", "efgh", "ijk"]);
    assert_eq!(summary.summary, "abcd\n\nefgh\n\nijk");
    assert_eq!(summary.short_summary, "4; 4; 3");
}

#[tokio::test]
async fn test_task_parts_are_concatenated() {
    let model = Arc::new(RecordingModel::default());
    let extractor = Extractor::new(model.clone(), Arc::new(CharCounter), small_limits());

    let tasks = extractor.extract_tasks("abcdefghijk").await.unwrap();

    assert_eq!(tasks.tasks, vec!["- [ ] abcd", "- [ ] efgh", "- [ ] ijk"]);
}

#[tokio::test]
async fn test_short_transcript_with_default_limits() {
    let model = Arc::new(RecordingModel::default());
    let extractor = Extractor::new(model.clone(), Arc::new(HeuristicTokenCounter), ChunkSettings::default());

    let prompt = "Voice note transcription:\nBuy milk and call the plumber.";
    extractor.extract_tasks(prompt).await.unwrap();

    assert_eq!(model.prompts(), vec![prompt]);
}

#[tokio::test]
async fn test_long_cjk_transcript_is_split_with_model_counter() {
    let model = Arc::new(RecordingModel::default());
    let extractor = Extractor::new(model.clone(), counter_for_model("gpt-4-1106-preview"), ChunkSettings::default());

    let prompt = "今天我去了商店买东西".repeat(4000);
    extractor.summarize(&prompt).await.unwrap();

    let prompts = model.prompts();
    assert!(prompts.len() > 1, "sent as {} request(s)", prompts.len());
    assert_eq!(prompts.concat(), prompt);
}

#[tokio::test]
async fn test_wrong_tool_answer_is_an_error() {
    let extractor = Extractor::new(Arc::new(ConfusedModel), Arc::new(CharCounter), small_limits());

    assert!(extractor.extract_tasks("abc").await.is_err());
}
