//! Context blocks for chat.

use super::model::Email;

/// Marker appended to a body cut short in the inbox context.
pub const TRUNCATION_MARKER: &str = " ...[truncated]";

/// Bounds on the whole-inbox chat context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboxContextLimits {
    /// Maximum number of emails included, from the front of the inbox.
    pub max_emails: usize,
    /// Maximum characters of each body before truncation.
    pub max_body_chars: usize,
}

impl Default for InboxContextLimits {
    fn default() -> Self {
        Self {
            max_emails: 20,
            max_body_chars: 800,
        }
    }
}

fn action_items_label(email: &Email) -> String {
    if email.action_items.is_empty() {
        "None".to_string()
    } else {
        email.action_items.join("; ")
    }
}

/// Context block for chatting about a single email.
pub fn email_context(email: &Email) -> String {
    format!(
        "Sender: {}\nSubject: {}\nBody: {}\nCategory: {}\nAction Items: {}",
        email.sender,
        email.subject,
        email.body,
        email.category_label(),
        action_items_label(email),
    )
}

/// Summarize the inbox for chat, bounded by `limits`.
pub fn inbox_context(emails: &[Email], limits: InboxContextLimits) -> String {
    if emails.is_empty() {
        return "Inbox is empty.".to_string();
    }

    emails
        .iter()
        .take(limits.max_emails)
        .enumerate()
        .map(|(i, e)| {
            let sender = non_empty_or(&e.sender, "<unknown sender>");
            let subject = non_empty_or(&e.subject, "<no subject>");
            format!(
                "Email {} | From: {} | Subject: {} | Category: {} | Action Items: {} | Body: {}",
                i + 1,
                sender,
                subject,
                e.category_label(),
                action_items_label(e),
                flatten_body(&e.body, limits.max_body_chars),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}

fn flatten_body(body: &str, max_chars: usize) -> String {
    let flat = body.replace('\n', " ");
    let flat = flat.trim();
    if flat.chars().count() > max_chars {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{cut}{TRUNCATION_MARKER}")
    } else {
        flat.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(id: &str, body: &str) -> Email {
        Email::new(id, "dan@example.com", format!("Subject {id}"), body, "t")
    }

    #[test]
    fn single_email_context_lists_enrichment() {
        let mut e = email("1", "Can you send the deck?");
        e.category = Some("To-Do".into());
        e.action_items = vec!["Send deck".into(), "Book call".into()];

        let ctx = email_context(&e);
        assert!(ctx.contains("Sender: dan@example.com"));
        assert!(ctx.contains("Category: To-Do"));
        assert!(ctx.contains("Action Items: Send deck; Book call"));
    }

    #[test]
    fn unprocessed_email_context_uses_placeholders() {
        let ctx = email_context(&email("1", "hi"));
        assert!(ctx.contains("Category: Uncategorized"));
        assert!(ctx.contains("Action Items: None"));
    }

    #[test]
    fn empty_inbox() {
        assert_eq!(inbox_context(&[], InboxContextLimits::default()), "Inbox is empty.");
    }

    #[test]
    fn inbox_is_bounded_by_count() {
        let emails: Vec<Email> = (1..=5).map(|i| email(&i.to_string(), "x")).collect();
        let limits = InboxContextLimits {
            max_emails: 3,
            max_body_chars: 100,
        };
        let ctx = inbox_context(&emails, limits);
        assert!(ctx.contains("Email 3 |"));
        assert!(!ctx.contains("Email 4 |"));
        assert_eq!(ctx.split("\n\n").count(), 3);
    }

    #[test]
    fn long_bodies_are_truncated_with_marker() {
        let emails = vec![email("1", &"a".repeat(50)), email("2", "short\nbody")];
        let limits = InboxContextLimits {
            max_emails: 10,
            max_body_chars: 10,
        };
        let ctx = inbox_context(&emails, limits);
        assert!(ctx.contains(&format!("Body: {}{}", "a".repeat(10), TRUNCATION_MARKER)));
        assert!(ctx.contains("Body: short body"));
    }

    #[test]
    fn blank_header_fields_use_fallbacks() {
        let mut e = email("1", "body");
        e.sender = String::new();
        e.subject = "  ".into();
        let ctx = inbox_context(&[e], InboxContextLimits::default());
        assert!(ctx.contains("From: <unknown sender>"));
        assert!(ctx.contains("Subject: <no subject>"));
    }
}
