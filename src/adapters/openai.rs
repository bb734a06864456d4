//! OpenAI HTTP adapter.
//!
//! - `POST {base}/audio/transcriptions`: multipart upload, Whisper model
//! - `POST {base}/chat/completions`: single forced tool call
//!
//! Auth: Bearer API key

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{LanguageModel, Transcriber};
use crate::domain::{NoteSummary, TaskList, ToolRequest, ToolResponse};

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Speech-to-text model
pub const TRANSCRIPTION_MODEL: &str = "whisper-1";

const SUMMARY_SYSTEM_PROMPT: &str = "\
You are a voice note summariser.
Do not mention tasks in your summary.
Write the summary in the first person E.G. 'I did this, I did that'.
The tool you have access to will write the summary to the daily note as a foldout. \
The short_summary parameter will be used as the foldout title and should encapsulate the summary in a few words.
The summary parameter will be used as the foldout content and should provide a short but detailed summary, \
maintaining clarity and conciseness and keeping details relevant to the voice log.
Do not include 'Short_summary:' or 'Summary:' in your response.";

const TASKS_SYSTEM_PROMPT: &str = "\
You are a task extractor.
Extract tasks from the voice logs provided to you.
You have access to a tool that can write new tasks to the daily note if the message mentions any, \
but only if they are in valid markdown format.
The response must include a list of tasks in valid markdown format E.G. '[`- [ ] Task 1`, `- [ ] Task 2`]'.
If the voice log mentions no tasks, call the tool with an empty list.";

/// OpenAI client for transcription and tool calls
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

/// Response from `/audio/transcriptions`
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Response from `/chat/completions`
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    arguments: String,
}

impl OpenAiClient {
    /// Create a new client
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            client: reqwest::Client::new(),
        }
    }

    /// Build API URL
    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// Chat completion request body forcing `request`'s tool
    fn chat_payload(&self, prompt: &str, request: ToolRequest) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt(request)},
                {"role": "user", "content": prompt},
            ],
            "tools": [tool_schema(request)],
            "tool_choice": {
                "type": "function",
                "function": {"name": request.tool_name()},
            },
        })
    }
}

#[async_trait]
impl Transcriber for OpenAiClient {
    fn name(&self) -> &str {
        "openai-whisper"
    }

    async fn transcribe(&self, audio: Vec<u8>, file_name: &str, language: &str) -> Result<String> {
        let file_part = Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str(audio_mime_type(file_name))?;

        let form = Form::new()
            .text("model", TRANSCRIPTION_MODEL)
            .text("language", language.to_string())
            .part("file", file_part);

        let response = self
            .client
            .post(self.api_url("audio/transcriptions"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .context("Failed to send transcription request")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Transcription API error ({}): {}", status, text.trim());
        }

        let result: TranscriptionResponse = response
            .json()
            .await
            .context("Failed to parse transcription response")?;

        Ok(result.text.trim().to_string())
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    fn name(&self) -> &str {
        "openai-chat"
    }

    async fn call_tool(&self, prompt: &str, request: ToolRequest) -> Result<ToolResponse> {
        let response = self
            .client
            .post(self.api_url("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&self.chat_payload(prompt, request))
            .send()
            .await
            .with_context(|| format!("Failed to send chat request for tool '{}'", request))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Chat API error ({}): {}", status, text.trim());
        }

        let chat: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat response")?;

        let call = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.tool_calls.into_iter().next())
            .with_context(|| format!("Model returned no call to tool '{}'", request))?;

        if call.function.name != request.tool_name() {
            anyhow::bail!(
                "Model called tool '{}' instead of '{}'",
                call.function.name,
                request
            );
        }

        decode_tool_arguments(request, &call.function.arguments)
    }
}

/// Decode a tool call's JSON argument string
pub fn decode_tool_arguments(request: ToolRequest, arguments: &str) -> Result<ToolResponse> {
    let response = match request {
        ToolRequest::Summary => ToolResponse::Summary(
            serde_json::from_str::<NoteSummary>(arguments)
                .context("Invalid write_summary arguments")?,
        ),
        ToolRequest::Tasks => ToolResponse::Tasks(
            serde_json::from_str::<TaskList>(arguments).context("Invalid write_new_task arguments")?,
        ),
    };
    Ok(response)
}

fn system_prompt(request: ToolRequest) -> &'static str {
    match request {
        ToolRequest::Summary => SUMMARY_SYSTEM_PROMPT,
        ToolRequest::Tasks => TASKS_SYSTEM_PROMPT,
    }
}

/// Function-calling schema for `request`
pub fn tool_schema(request: ToolRequest) -> Value {
    let (description, parameters) = match request {
        ToolRequest::Summary => (
            "Writes a summary of the audio log to the daily note.",
            json!({
                "type": "object",
                "properties": {
                    "summary": {"type": "string"},
                    "short_summary": {"type": "string"},
                },
                "required": ["summary", "short_summary"],
            }),
        ),
        ToolRequest::Tasks => (
            "Write new tasks to the daily note.",
            json!({
                "type": "object",
                "properties": {
                    "tasks": {"type": "array", "items": {"type": "string"}},
                },
                "required": ["tasks"],
            }),
        ),
    };

    json!({
        "type": "function",
        "function": {
            "name": request.tool_name(),
            "description": description,
            "parameters": parameters,
        },
    })
}

/// MIME type for an uploaded recording, by extension
fn audio_mime_type(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("webm") => "audio/webm",
        Some("m4a") | Some("mp4") => "audio/mp4",
        Some("mp3") | Some("mpga") | Some("mpeg") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        _ => "application/octet-stream",
    }
}
