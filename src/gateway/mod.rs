//! Language-model gateway — the capability boundary between the agent and
//! a text-generation backend.
//!
//! Every operation degrades instead of failing: text operations return a
//! sentinel string, extraction returns an empty list. Nothing in here
//! returns an error to the caller, so one bad email never aborts a batch.

pub mod llm_gateway;
pub mod stub;

pub use llm_gateway::{LlmGateway, extract_json_object, parse_action_items};
pub use stub::{GatewayCall, GatewayOp, StubGateway};

use async_trait::async_trait;

/// Prefix of the sentinel returned by `categorize` and `chat` on failure.
pub const ERROR_SENTINEL: &str = "Error:";

/// Prefix of the sentinel returned by `generate_reply` on failure.
pub const DRAFT_ERROR_SENTINEL: &str = "Error generating draft:";

/// Is this gateway output a failure sentinel?
pub fn is_sentinel(text: &str) -> bool {
    text.starts_with(ERROR_SENTINEL) || text.starts_with(DRAFT_ERROR_SENTINEL)
}

/// Text-generation capabilities used by the agent.
///
/// `text` is the literal email text block; `prompt` is a fully rendered
/// template. Implementations must not panic on model failures.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Category label (trimmed), or an `Error:` sentinel.
    async fn categorize(&self, text: &str, prompt: &str) -> String;

    /// Action items from a `{"tasks": [...]}` reply; empty on any failure.
    async fn extract_action_items(&self, text: &str, prompt: &str) -> Vec<String>;

    /// Reply draft (trimmed), or an `Error generating draft:` sentinel.
    async fn generate_reply(&self, text: &str, prompt: &str) -> String;

    /// Answer `query` over `context`, or an `Error:` sentinel.
    async fn chat(&self, context: &str, query: &str) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_detection() {
        assert!(is_sentinel("Error: timed out"));
        assert!(is_sentinel("Error generating draft: 429"));
        assert!(!is_sentinel("Thanks, see you Tuesday."));
    }
}
