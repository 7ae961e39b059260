//! Deterministic gateway for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::gateway::Gateway;

/// Oldest calls are dropped past this many.
pub const MAX_RECORDED_CALLS: usize = 256;

/// Which gateway operation was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayOp {
    Categorize,
    ExtractActionItems,
    GenerateReply,
    Chat,
}

/// A recorded gateway invocation.
#[derive(Debug, Clone)]
pub struct GatewayCall {
    pub op: GatewayOp,
    /// Email text block, or the chat context.
    pub text: String,
    /// Rendered prompt, or the chat query.
    pub prompt: String,
}

/// Scripted gateway.
///
/// Category responses are picked by the first rule whose needle occurs in
/// the email text; everything else returns fixed values. Every call is
/// recorded for inspection, up to `MAX_RECORDED_CALLS`.
pub struct StubGateway {
    category_rules: Vec<(String, String)>,
    default_category: String,
    tasks: Vec<String>,
    reply: String,
    answer: String,
    calls: Mutex<VecDeque<GatewayCall>>,
}

impl Default for StubGateway {
    fn default() -> Self {
        Self {
            category_rules: Vec::new(),
            default_category: "General".to_string(),
            tasks: Vec::new(),
            reply: "Thanks for your email. I'll get back to you shortly.".to_string(),
            answer: "No model is configured; this is a canned answer.".to_string(),
            calls: Mutex::new(VecDeque::new()),
        }
    }
}

impl StubGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond with `category` when the email text contains `needle`.
    pub fn with_category(mut self, needle: impl Into<String>, category: impl Into<String>) -> Self {
        self.category_rules.push((needle.into(), category.into()));
        self
    }

    pub fn with_default_category(mut self, category: impl Into<String>) -> Self {
        self.default_category = category.into();
        self
    }

    pub fn with_tasks<I, S>(mut self, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tasks = tasks.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.reply = reply.into();
        self
    }

    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = answer.into();
        self
    }

    /// Recorded calls, oldest first.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls
            .lock()
            .map(|c| c.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn calls_for(&self, op: GatewayOp) -> Vec<GatewayCall> {
        self.calls().into_iter().filter(|c| c.op == op).collect()
    }

    fn record(&self, op: GatewayOp, text: &str, prompt: &str) {
        if let Ok(mut calls) = self.calls.lock() {
            if calls.len() >= MAX_RECORDED_CALLS {
                calls.pop_front();
            }
            calls.push_back(GatewayCall {
                op,
                text: text.to_string(),
                prompt: prompt.to_string(),
            });
        }
    }
}

#[async_trait]
impl Gateway for StubGateway {
    async fn categorize(&self, text: &str, prompt: &str) -> String {
        self.record(GatewayOp::Categorize, text, prompt);
        self.category_rules
            .iter()
            .find(|(needle, _)| text.contains(needle.as_str()))
            .map(|(_, category)| category.clone())
            .unwrap_or_else(|| self.default_category.clone())
    }

    async fn extract_action_items(&self, text: &str, prompt: &str) -> Vec<String> {
        self.record(GatewayOp::ExtractActionItems, text, prompt);
        self.tasks.clone()
    }

    async fn generate_reply(&self, text: &str, prompt: &str) -> String {
        self.record(GatewayOp::GenerateReply, text, prompt);
        self.reply.clone()
    }

    async fn chat(&self, context: &str, query: &str) -> String {
        self.record(GatewayOp::Chat, context, query);
        self.answer.clone()
    }
}
