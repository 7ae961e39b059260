//! Model-backed gateway over an `LlmProvider`.
//!
//! Failures stay structured (`Result<_, LlmError>`) inside this module and
//! are only flattened into sentinels at the `Gateway` trait boundary.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::gateway::{DRAFT_ERROR_SENTINEL, ERROR_SENTINEL, Gateway};
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};

/// Default per-call timeout.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Categories are one or two words; keep the budget tight.
const CATEGORIZE_MAX_TOKENS: u32 = 64;
const EXTRACT_MAX_TOKENS: u32 = 512;
const REPLY_MAX_TOKENS: u32 = 1024;
const CHAT_MAX_TOKENS: u32 = 1024;

/// Low temperature for classification and extraction.
const TRIAGE_TEMPERATURE: f32 = 0.1;
const REPLY_TEMPERATURE: f32 = 0.4;

/// Gateway that sends rendered prompts to a real model.
pub struct LlmGateway {
    llm: Arc<dyn LlmProvider>,
    call_timeout: Duration,
}

impl LlmGateway {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// One bounded completion; returns the trimmed text.
    async fn complete_text(
        &self,
        prompt: String,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let request = CompletionRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(temperature)
            .with_max_tokens(max_tokens);

        let response = tokio::time::timeout(self.call_timeout, self.llm.complete(request))
            .await
            .map_err(|_| LlmError::Timeout {
                provider: self.llm.model_name().to_string(),
                timeout: self.call_timeout,
            })??;

        debug!(
            model = self.llm.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "LLM call complete"
        );

        Ok(response.content.trim().to_string())
    }
}

fn with_text(prompt: &str, text: &str) -> String {
    format!("{prompt}\n\n{text}")
}

#[async_trait]
impl Gateway for LlmGateway {
    async fn categorize(&self, text: &str, prompt: &str) -> String {
        match self
            .complete_text(with_text(prompt, text), TRIAGE_TEMPERATURE, CATEGORIZE_MAX_TOKENS)
            .await
        {
            Ok(category) => category,
            Err(e) => {
                warn!(error = %e, "Categorization failed");
                format!("{ERROR_SENTINEL} {e}")
            }
        }
    }

    async fn extract_action_items(&self, text: &str, prompt: &str) -> Vec<String> {
        match self
            .complete_text(with_text(prompt, text), TRIAGE_TEMPERATURE, EXTRACT_MAX_TOKENS)
            .await
        {
            Ok(raw) => parse_action_items(&raw),
            Err(e) => {
                warn!(error = %e, "Action item extraction failed");
                Vec::new()
            }
        }
    }

    async fn generate_reply(&self, text: &str, prompt: &str) -> String {
        match self
            .complete_text(with_text(prompt, text), REPLY_TEMPERATURE, REPLY_MAX_TOKENS)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Reply generation failed");
                format!("{DRAFT_ERROR_SENTINEL} {e}")
            }
        }
    }

    async fn chat(&self, context: &str, query: &str) -> String {
        let prompt = format!("Context: {context}\n\nUser Question: {query}\n\nAnswer:");
        match self
            .complete_text(prompt, REPLY_TEMPERATURE, CHAT_MAX_TOKENS)
            .await
        {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "Chat failed");
                format!("{ERROR_SENTINEL} {e}")
            }
        }
    }
}

// ── Response parsing ────────────────────────────────────────────────

/// Parse a `{"tasks": [...]}` reply into action items.
///
/// Tolerates markdown fences and surrounding chatter. Anything that is not
/// an object with a `tasks` array yields an empty list; non-string and
/// blank entries are dropped.
pub fn parse_action_items(raw: &str) -> Vec<String> {
    let json_str = extract_json_object(raw);

    let value: serde_json::Value = match serde_json::from_str(&json_str) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, response = raw, "Action item response is not JSON");
            return Vec::new();
        }
    };

    value
        .get("tasks")
        .and_then(|t| t.as_array())
        .map(|tasks| {
            tasks
                .iter()
                .filter_map(|t| t.as_str())
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Extract a JSON object from LLM output (handles markdown wrapping).
pub fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    // Already a JSON object
    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    // Wrapped in markdown code block
    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        let inner = after.find("```").map_or(after, |end| &after[..end]);
        return inner.trim().to_string();
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('{') {
                return inner.to_string();
            }
        }
    }

    // Try to find object bounds
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}
