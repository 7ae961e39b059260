//! Mail collaborator — where raw emails come from.
//!
//! The triage core never talks to a mail provider itself; it receives
//! `Email` records from a `MailSource`.

pub mod mock;

pub use mock::JsonInboxSource;

use async_trait::async_trait;

use crate::error::MailError;
use crate::triage::model::Email;

/// Bodies are cut to this many characters before reaching the core.
pub const MAX_BODY_CHARS: usize = 2000;

/// File name of the mock inbox inside the data directory.
pub const MOCK_INBOX_FILE: &str = "mock_inbox.json";

/// A source of emails.
#[async_trait]
pub trait MailSource: Send + Sync {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Fetch up to `max_results` emails, newest first as the source orders them.
    async fn fetch(&self, max_results: usize) -> Result<Vec<Email>, MailError>;
}

/// Cut `body` to at most `max_chars` characters.
pub fn truncate_body(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => body[..idx].to_string(),
        None => body.to_string(),
    }
}
