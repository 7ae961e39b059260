//! Mock inbox loaded from a JSON file.
//!
//! Stands in for a real provider during development and demos. Records may
//! omit anything except `id`; missing fields get the same fallbacks a
//! provider integration would use.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::error::MailError;
use crate::mail::{MAX_BODY_CHARS, MailSource, truncate_body};
use crate::triage::model::{Email, dedupe_by_id};

/// A raw record as found in the mock inbox file.
#[derive(Debug, Deserialize)]
struct RawMessage {
    id: String,
    #[serde(default)]
    sender: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    action_items: Option<Vec<String>>,
}

impl RawMessage {
    fn into_email(self, fetched_at: &str) -> Email {
        let mut email = Email::new(
            self.id,
            self.sender.unwrap_or_else(|| "Unknown Sender".to_string()),
            self.subject.unwrap_or_else(|| "No Subject".to_string()),
            truncate_body(self.body.as_deref().unwrap_or_default(), MAX_BODY_CHARS),
            self.timestamp
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| fetched_at.to_string()),
        );
        email.category = self.category;
        email.action_items = self.action_items.unwrap_or_default();
        email
    }
}

/// Reads emails from a JSON array on disk.
pub struct JsonInboxSource {
    path: PathBuf,
}

impl JsonInboxSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MailSource for JsonInboxSource {
    fn name(&self) -> &str {
        "mock-inbox"
    }

    async fn fetch(&self, max_results: usize) -> Result<Vec<Email>, MailError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| MailError::Unavailable {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        let raw: Vec<RawMessage> =
            serde_json::from_str(&content).map_err(|e| MailError::Malformed(e.to_string()))?;

        let fetched_at = Utc::now().to_rfc3339();
        let emails: Vec<Email> = dedupe_by_id(
            raw.into_iter()
                .map(|m| m.into_email(&fetched_at))
                .collect(),
        )
        .into_iter()
        .take(max_results)
        .collect();

        info!(count = emails.len(), path = %self.path.display(), "Fetched mock inbox");
        Ok(emails)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_inbox(dir: &TempDir, content: &str) -> JsonInboxSource {
        let path = dir.path().join("mock_inbox.json");
        std::fs::write(&path, content).unwrap();
        JsonInboxSource::new(path)
    }

    #[tokio::test]
    async fn fetch_applies_fallbacks_and_limit() {
        let dir = TempDir::new().unwrap();
        let source = write_inbox(
            &dir,
            r#"[
                {"id": "1", "sender": "a@x.com", "subject": "Hi", "body": "Hello", "timestamp": "2024-01-01"},
                {"id": "2"},
                {"id": "3", "subject": "ignored by limit"}
            ]"#,
        );

        let emails = source.fetch(2).await.unwrap();
        assert_eq!(emails.len(), 2);
        assert_eq!(emails[0].timestamp, "2024-01-01");
        assert_eq!(emails[1].sender, "Unknown Sender");
        assert_eq!(emails[1].subject, "No Subject");
        assert!(!emails[1].timestamp.is_empty());
        assert!(emails[1].category.is_none());
    }

    #[tokio::test]
    async fn long_bodies_are_truncated() {
        let dir = TempDir::new().unwrap();
        let body = "y".repeat(MAX_BODY_CHARS * 2);
        let source = write_inbox(&dir, &format!(r#"[{{"id": "1", "body": "{body}"}}]"#));

        let emails = source.fetch(10).await.unwrap();
        assert_eq!(emails[0].body.len(), MAX_BODY_CHARS);
    }

    #[tokio::test]
    async fn duplicate_ids_are_dropped() {
        let dir = TempDir::new().unwrap();
        let source = write_inbox(
            &dir,
            r#"[
                {"id": "1", "subject": "first"},
                {"id": "1", "subject": "again"},
                {"id": "2", "subject": "other"}
            ]"#,
        );

        let emails = source.fetch(2).await.unwrap();
        let ids: Vec<&str> = emails.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["1", "2"]);
        assert_eq!(emails[0].subject, "first");
    }

    #[tokio::test]
    async fn missing_file_is_unavailable() {
        let source = JsonInboxSource::new("/definitely/not/here.json");
        assert!(matches!(
            source.fetch(5).await,
            Err(MailError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn malformed_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let source = write_inbox(&dir, "{\"id\": 1}");
        assert!(matches!(source.fetch(5).await, Err(MailError::Malformed(_))));
    }
}
