//! Adapter interfaces for external services.
//!
//! The pipeline only talks to the outside world through these traits:
//! speech-to-text, the language model and a token counter. The OpenAI
//! adapter implements the first two over HTTP.

pub mod openai;
pub mod tokens;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{ToolRequest, ToolResponse};

// Re-export the concrete adapters
pub use openai::OpenAiClient;
pub use tokens::{counter_for_model, split_prompt, BpeTokenCounter, ChunkSettings, HeuristicTokenCounter};

/// Speech-to-text service
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    /// Transcribe `audio` (the contents of `file_name`) in `language`
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str, language: &str) -> Result<String>;
}

/// Language model forced to answer with a single tool call
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    /// Send `prompt` and decode the arguments of the requested tool
    async fn call_tool(&self, prompt: &str, request: ToolRequest) -> Result<ToolResponse>;
}

/// Token counter used to decide whether a prompt needs chunking
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}
