//! Token estimation and prompt chunking.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tiktoken_rs::{get_bpe_from_model, CoreBPE};

use super::TokenCounter;

/// Prompts above this many tokens are split
pub const DEFAULT_TOKEN_THRESHOLD: usize = 8192;

/// Characters per chunk when a prompt is split
pub const DEFAULT_CHUNK_CHARS: usize = 8000;

/// Chunking limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSettings {
    /// Token count above which a prompt is split
    pub token_threshold: usize,

    /// Maximum characters per chunk
    pub chunk_chars: usize,
}

impl Default for ChunkSettings {
    fn default() -> Self {
        Self {
            token_threshold: DEFAULT_TOKEN_THRESHOLD,
            chunk_chars: DEFAULT_CHUNK_CHARS,
        }
    }
}

/// Counts tokens with the model's own BPE encoding
pub struct BpeTokenCounter {
    bpe: CoreBPE,
}

impl BpeTokenCounter {
    /// Encoding used by `model`; fails for models tiktoken doesn't know
    pub fn for_model(model: &str) -> Result<Self> {
        let bpe = get_bpe_from_model(model).with_context(|| format!("No BPE encoding known for model '{}'", model))?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for BpeTokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}

/// Estimates BPE-style token counts without a vocabulary.
///
/// ASCII alphanumeric runs count one token per started group of four
/// characters. Every other non-whitespace character (punctuation, CJK and
/// other non-Latin script) counts as one token.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTokenCounter;

impl TokenCounter for HeuristicTokenCounter {
    fn count(&self, text: &str) -> usize {
        let mut tokens = 0;
        let mut run = 0usize;

        for c in text.chars() {
            if c.is_ascii_alphanumeric() {
                run += 1;
                continue;
            }
            tokens += run.div_ceil(4);
            run = 0;
            if !c.is_whitespace() {
                tokens += 1;
            }
        }

        tokens + run.div_ceil(4)
    }
}

/// Token counter for `model`: its BPE encoding when known, the heuristic
/// estimate otherwise.
pub fn counter_for_model(model: &str) -> Arc<dyn TokenCounter> {
    match BpeTokenCounter::for_model(model) {
        Ok(counter) => Arc::new(counter),
        Err(e) => {
            tracing::warn!("{:#}, estimating token counts instead", e);
            Arc::new(HeuristicTokenCounter)
        }
    }
}

/// Split `prompt` into parts no longer than `chunk_chars` characters when its
/// token count exceeds the threshold. Parts are returned in input order and
/// always cut on char boundaries.
pub fn split_prompt<'a>(
    prompt: &'a str,
    counter: &dyn TokenCounter,
    settings: &ChunkSettings,
) -> Vec<&'a str> {
    let tokens = counter.count(prompt);
    if tokens <= settings.token_threshold {
        return vec![prompt];
    }

    tracing::warn!(
        tokens,
        threshold = settings.token_threshold,
        "Token count exceeds limit, splitting prompt"
    );

    let chunk_chars = settings.chunk_chars.max(1);
    let mut parts = Vec::new();
    let mut start = 0;
    let mut chars_in_part = 0;

    for (offset, _) in prompt.char_indices() {
        if chars_in_part == chunk_chars {
            parts.push(&prompt[start..offset]);
            start = offset;
            chars_in_part = 0;
        }
        chars_in_part += 1;
    }
    if start < prompt.len() {
        parts.push(&prompt[start..]);
    }

    parts
}
