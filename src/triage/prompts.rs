//! Prompt templates and per-email placeholder substitution.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::model::Email;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(subject|body|sender)\}").expect("valid placeholder regex"));

/// The three user-editable prompt templates.
///
/// Persisted as a JSON object with exactly these three string fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplates {
    pub categorization: String,
    pub action_extraction: String,
    pub auto_reply: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            categorization: "Categorize this email as one of: Important, To-Do, Newsletter, Spam. \
                             Respond with the category name only."
                .to_string(),
            action_extraction: "Extract the tasks this email asks of me. Respond with JSON: \
                                {\"tasks\": [\"...\"]}. Use an empty list if there are none."
                .to_string(),
            auto_reply: "Draft a short, polite reply to this email from {sender}.".to_string(),
        }
    }
}

/// Which template to address by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Categorization,
    ActionExtraction,
    AutoReply,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 3] = [
        TemplateKind::Categorization,
        TemplateKind::ActionExtraction,
        TemplateKind::AutoReply,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Categorization => "categorization",
            Self::ActionExtraction => "action_extraction",
            Self::AutoReply => "auto_reply",
        }
    }

    /// Accepts the persisted field name or a short alias.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "categorization" | "category" | "cat" => Some(Self::Categorization),
            "action_extraction" | "actions" | "tasks" => Some(Self::ActionExtraction),
            "auto_reply" | "reply" | "draft" => Some(Self::AutoReply),
            _ => None,
        }
    }
}

impl PromptTemplates {
    pub fn get(&self, kind: TemplateKind) -> &str {
        match kind {
            TemplateKind::Categorization => &self.categorization,
            TemplateKind::ActionExtraction => &self.action_extraction,
            TemplateKind::AutoReply => &self.auto_reply,
        }
    }

    pub fn set(&mut self, kind: TemplateKind, text: impl Into<String>) {
        let text = text.into();
        match kind {
            TemplateKind::Categorization => self.categorization = text,
            TemplateKind::ActionExtraction => self.action_extraction = text,
            TemplateKind::AutoReply => self.auto_reply = text,
        }
    }

    /// Render one template for `email`.
    pub fn render(&self, kind: TemplateKind, email: &Email) -> String {
        render(self.get(kind), email)
    }
}

/// Substitute `{subject}`, `{body}` and `{sender}` with the email's values.
///
/// Single pass: placeholder-looking text inside the substituted values is
/// left alone.
pub fn render(template: &str, email: &Email) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match &caps[1] {
            "subject" => email.subject.clone(),
            "body" => email.body.clone(),
            _ => email.sender.clone(),
        })
        .into_owned()
}
