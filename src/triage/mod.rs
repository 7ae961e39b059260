//! Triage core: email records, prompt templates, sanitization, and the
//! agent that drives the gateway.
//!
//! Flow for one email:
//! 1. Render the categorization template → `Gateway::categorize`
//! 2. Sanitize the category (failure signatures → uncategorized)
//! 3. Render the extraction template → `Gateway::extract_action_items`

pub mod agent;
pub mod context;
pub mod model;
pub mod prompts;
pub mod sanitize;

pub use agent::{BatchReport, EmailAgent};
pub use context::InboxContextLimits;
pub use model::{Draft, Email};
pub use prompts::{PromptTemplates, TemplateKind};
