//! Summary and task extraction with prompt chunking.
//!
//! Oversized prompts are split and every part is sent as its own request;
//! the per-part results are merged in input order.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::adapters::{split_prompt, ChunkSettings, LanguageModel, TokenCounter};
use crate::domain::{NoteSummary, TaskList, ToolRequest, ToolResponse};

/// Drives the language model for one transcript
pub struct Extractor {
    model: Arc<dyn LanguageModel>,
    counter: Arc<dyn TokenCounter>,
    chunking: ChunkSettings,
}

impl Extractor {
    pub fn new(model: Arc<dyn LanguageModel>, counter: Arc<dyn TokenCounter>, chunking: ChunkSettings) -> Self {
        Self {
            model,
            counter,
            chunking,
        }
    }

    /// Call `request`'s tool for `prompt`, chunking if it is too long
    pub async fn request(&self, prompt: &str, request: ToolRequest) -> Result<ToolResponse> {
        let parts = split_prompt(prompt, self.counter.as_ref(), &self.chunking);
        let total = parts.len();
        info!(tool = %request, parts = total, model = self.model.name(), "Passing prompt to AI");

        let mut merged: Option<ToolResponse> = None;
        for (index, part) in parts.into_iter().enumerate() {
            let response = self
                .model
                .call_tool(part, request)
                .await
                .with_context(|| format!("Tool '{}' failed on part {}/{}", request, index + 1, total))?;

            if response.request() != request {
                anyhow::bail!(
                    "Model answered '{}' when '{}' was requested",
                    response.request(),
                    request
                );
            }

            merged = Some(match merged {
                None => response,
                Some(acc) => acc
                    .merge(response)
                    .map_err(|other| anyhow::anyhow!("Cannot merge '{}' response", other.request()))?,
            });
        }

        merged.context("Prompt produced no parts")
    }

    /// Summary of the transcript
    pub async fn summarize(&self, prompt: &str) -> Result<NoteSummary> {
        match self.request(prompt, ToolRequest::Summary).await? {
            ToolResponse::Summary(summary) => Ok(summary),
            other => anyhow::bail!("Expected a summary, got '{}'", other.request()),
        }
    }

    /// Tasks mentioned in the transcript
    pub async fn extract_tasks(&self, prompt: &str) -> Result<TaskList> {
        match self.request(prompt, ToolRequest::Tasks).await? {
            ToolResponse::Tasks(tasks) => Ok(tasks),
            other => anyhow::bail!("Expected tasks, got '{}'", other.request()),
        }
    }
}
