//! Email and draft records.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;
use uuid::Uuid;

/// An email as seen by the triage core.
///
/// Created by a mail source or loaded from the snapshot store. The agent
/// only ever writes `category` and `action_items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    /// Provider message id, unique within a collection.
    pub id: String,
    pub sender: String,
    pub subject: String,
    /// Plain-text body, possibly truncated by the mail source.
    pub body: String,
    /// Provider date string; never parsed.
    pub timestamp: String,
    /// `None` means unprocessed or uncategorized.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub action_items: Vec<String>,
    #[serde(default)]
    pub read: bool,
}

impl Email {
    pub fn new(
        id: impl Into<String>,
        sender: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            sender: sender.into(),
            subject: subject.into(),
            body: body.into(),
            timestamp: timestamp.into(),
            category: None,
            action_items: Vec::new(),
            read: false,
        }
    }

    /// Text block sent alongside categorization and extraction prompts.
    pub fn triage_text(&self) -> String {
        format!("Subject: {}\nBody: {}", self.subject, self.body)
    }

    /// Text block sent alongside the auto-reply prompt.
    pub fn reply_text(&self) -> String {
        format!(
            "Sender: {}\nSubject: {}\nBody: {}",
            self.sender, self.subject, self.body
        )
    }

    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or("Uncategorized")
    }
}

/// Keep the first email for each id; later duplicates are dropped.
pub fn dedupe_by_id(emails: Vec<Email>) -> Vec<Email> {
    let mut seen = HashSet::new();
    emails
        .into_iter()
        .filter(|email| {
            let fresh = seen.insert(email.id.clone());
            if !fresh {
                warn!(id = %email.id, "Dropping email with duplicate id");
            }
            fresh
        })
        .collect()
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A generated reply bound to one email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    pub id: Uuid,
    pub email_id: String,
    pub subject: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Draft {
    /// Draft a reply to `email`; the subject gains a single `Re:` prefix.
    pub fn for_email(email: &Email, body: impl Into<String>) -> Self {
        let subject = if email.subject.to_lowercase().starts_with("re:") {
            email.subject.clone()
        } else {
            format!("Re: {}", email.subject)
        };

        Self {
            id: Uuid::new_v4(),
            email_id: email.id.clone(),
            subject,
            body: body.into(),
            notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let emails = vec![
            Email::new("1", "a@x.com", "first", "", "t"),
            Email::new("2", "b@x.com", "other", "", "t"),
            Email::new("1", "c@x.com", "second", "", "t"),
        ];
        let unique = dedupe_by_id(emails);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].subject, "first");
        assert_eq!(unique[1].id, "2");
    }

    fn sample() -> Email {
        Email::new(
            "m1",
            "bob@example.com",
            "Invoice",
            "Please pay",
            "2024-05-01T09:00:00Z",
        )
    }

    #[test]
    fn text_blocks() {
        let email = sample();
        assert_eq!(email.triage_text(), "Subject: Invoice\nBody: Please pay");
        assert!(email.reply_text().starts_with("Sender: bob@example.com\n"));
    }

    #[test]
    fn deserialize_with_missing_optional_fields() {
        let raw = r#"{"id":"1","sender":"a","subject":"s","body":"b","timestamp":"t"}"#;
        let email: Email = serde_json::from_str(raw).unwrap();
        assert!(email.category.is_none());
        assert!(email.action_items.is_empty());
        assert!(!email.read);
    }

    #[test]
    fn null_action_items_load_as_empty() {
        let raw = r#"{"id":"1","sender":"a","subject":"s","body":"b","timestamp":"t",
                      "category":null,"action_items":null,"read":true}"#;
        let email: Email = serde_json::from_str(raw).unwrap();
        assert!(email.action_items.is_empty());
        assert!(email.read);
    }

    #[test]
    fn absent_category_serializes_as_null() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json["category"].is_null());
        assert_eq!(json["action_items"], serde_json::json!([]));
    }

    #[test]
    fn draft_subject_prefix() {
        let mut email = sample();
        assert_eq!(Draft::for_email(&email, "ok").subject, "Re: Invoice");

        email.subject = "RE: Invoice".into();
        let draft = Draft::for_email(&email, "ok").with_notes("sent later");
        assert_eq!(draft.subject, "RE: Invoice");
        assert_eq!(draft.notes.as_deref(), Some("sent later"));
        assert_eq!(draft.email_id, "m1");
    }
}
