//! File-backed persistence: prompt configuration and the email snapshot.

pub mod emails;
pub mod json_file;
pub mod prompts;

pub use emails::EmailStore;
pub use prompts::PromptStore;

/// File name of the persisted prompt configuration.
pub const PROMPTS_FILE: &str = "default_prompts.json";

/// File name of the enriched email snapshot.
pub const INBOX_FILE: &str = "processed_inbox.json";
