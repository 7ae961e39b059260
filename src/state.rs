//! Application state — the session the CLI drives.
//!
//! Owns the working inbox, the prompt templates, drafts and chat history,
//! and wires the agent to the mail source and the snapshot stores.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::gateway::{Gateway, is_sentinel};
use crate::mail::MailSource;
use crate::store::{EmailStore, PromptStore};
use crate::triage::context::inbox_context;
use crate::triage::{BatchReport, Draft, Email, EmailAgent, InboxContextLimits, PromptTemplates, TemplateKind};

/// What a chat question is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatScope {
    /// A single email, by id.
    Email(String),
    /// The whole working inbox.
    Inbox,
}

/// One question and its answer.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub scope: ChatScope,
    pub question: String,
    pub answer: String,
    pub asked_at: DateTime<Utc>,
}

/// Result of processing the whole inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Nothing to process; fetch first.
    EmptyInbox,
    Processed(BatchReport),
}

/// Collaborators and limits for an `AppState`.
pub struct AppDeps {
    pub gateway: Arc<dyn Gateway>,
    pub source: Arc<dyn MailSource>,
    pub emails: EmailStore,
    pub prompts: PromptStore,
    pub fetch_limit: usize,
    pub inbox_limits: InboxContextLimits,
}

pub struct AppState {
    agent: EmailAgent,
    source: Arc<dyn MailSource>,
    email_store: EmailStore,
    prompt_store: PromptStore,
    fetch_limit: usize,
    inbox_limits: InboxContextLimits,

    emails: Vec<Email>,
    templates: Option<PromptTemplates>,
    pending_draft: Option<Draft>,
    drafts: Vec<Draft>,
    history: Vec<ChatTurn>,
}

impl AppState {
    pub fn new(deps: AppDeps) -> Self {
        Self {
            agent: EmailAgent::new(deps.gateway),
            source: deps.source,
            email_store: deps.emails,
            prompt_store: deps.prompts,
            fetch_limit: deps.fetch_limit,
            inbox_limits: deps.inbox_limits,
            emails: Vec::new(),
            templates: None,
            pending_draft: None,
            drafts: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Load the last processed snapshot. Returns how many emails were restored.
    pub async fn restore(&mut self) -> usize {
        self.emails = self.email_store.load().await;
        self.emails.len()
    }

    /// Replace the working inbox with a fresh fetch.
    pub async fn fetch(&mut self) -> Result<usize> {
        let fetched = self.source.fetch(self.fetch_limit).await?;
        info!(source = self.source.name(), count = fetched.len(), "Inbox fetched");
        self.emails = fetched;
        Ok(self.emails.len())
    }

    pub fn emails(&self) -> &[Email] {
        &self.emails
    }

    pub fn email(&self, id: &str) -> Result<&Email> {
        self.emails
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::EmailNotFound { id: id.to_string() })
    }

    /// Look up an email and flag it as read. The snapshot is saved when
    /// the flag changes.
    pub async fn open(&mut self, id: &str) -> Result<&Email> {
        let idx = self.position(id)?;
        if !self.emails[idx].read {
            self.emails[idx].read = true;
            self.email_store.save(&self.emails).await?;
        }
        Ok(&self.emails[idx])
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.emails
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| Error::EmailNotFound { id: id.to_string() })
    }

    /// Current templates, loading them from the prompt store on first use.
    pub async fn templates(&mut self) -> &PromptTemplates {
        if self.templates.is_none() {
            self.templates = Some(self.prompt_store.load().await);
        }
        self.templates.get_or_insert_with(PromptTemplates::default)
    }

    async fn templates_snapshot(&mut self) -> PromptTemplates {
        self.templates().await.clone()
    }

    /// Replace all templates and persist them immediately.
    pub async fn update_templates(&mut self, templates: PromptTemplates) -> Result<()> {
        self.prompt_store.save(&templates).await?;
        self.templates = Some(templates);
        Ok(())
    }

    /// Replace one template and persist the set.
    pub async fn set_template(&mut self, kind: TemplateKind, text: &str) -> Result<()> {
        let mut templates = self.templates_snapshot().await;
        templates.set(kind, text);
        self.update_templates(templates).await
    }

    /// Categorize and extract for every email, then save the snapshot.
    pub async fn process_inbox(&mut self) -> Result<ProcessOutcome> {
        if self.emails.is_empty() {
            info!("Process requested on an empty inbox");
            return Ok(ProcessOutcome::EmptyInbox);
        }

        let templates = self.templates_snapshot().await;
        let report = self.agent.process_batch(&mut self.emails, &templates).await;
        self.email_store.save(&self.emails).await?;
        Ok(ProcessOutcome::Processed(report))
    }

    /// Process one email by id, then save the snapshot.
    /// Returns whether a category was kept.
    pub async fn process_email(&mut self, id: &str) -> Result<bool> {
        let idx = self.position(id)?;
        let templates = self.templates_snapshot().await;
        let accepted = self.agent.process_one(&mut self.emails[idx], &templates).await;
        self.email_store.save(&self.emails).await?;
        Ok(accepted)
    }

    /// Draft a reply to an email. The draft is held until saved or replaced.
    pub async fn draft_reply(&mut self, id: &str, instructions: &str) -> Result<Draft> {
        let templates = self.templates_snapshot().await;
        let email = self.email(id)?;
        let body = self.agent.generate_draft(email, &templates, instructions).await;

        if is_sentinel(&body) {
            warn!(id, "Draft generation failed");
        }

        let mut draft = Draft::for_email(email, body);
        if !instructions.trim().is_empty() {
            draft = draft.with_notes(instructions.trim());
        }
        self.pending_draft = Some(draft.clone());
        Ok(draft)
    }

    /// Keep the pending draft. Failed generations are not kept.
    pub fn save_draft(&mut self) -> Option<&Draft> {
        let draft = self.pending_draft.take()?;
        if is_sentinel(&draft.body) {
            warn!(email_id = %draft.email_id, "Refusing to save a failed draft");
            return None;
        }
        info!(email_id = %draft.email_id, draft_id = %draft.id, "Draft saved");
        self.drafts.push(draft);
        self.drafts.last()
    }

    pub fn pending_draft(&self) -> Option<&Draft> {
        self.pending_draft.as_ref()
    }

    pub fn drafts(&self) -> &[Draft] {
        &self.drafts
    }

    /// Ask a question about one email or the whole inbox.
    pub async fn chat(&mut self, scope: ChatScope, query: &str) -> Result<String> {
        let answer = match &scope {
            ChatScope::Email(id) => {
                let email = self.email(id)?;
                self.agent.chat_about_email(email, query).await
            }
            ChatScope::Inbox => {
                let context = inbox_context(&self.emails, self.inbox_limits);
                self.agent.chat_about_inbox(&context, query).await
            }
        };

        self.history.push(ChatTurn {
            scope,
            question: query.to_string(),
            answer: answer.clone(),
            asked_at: Utc::now(),
        });
        Ok(answer)
    }

    pub fn chat_history(&self) -> &[ChatTurn] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayOp, StubGateway};
    use crate::mail::JsonInboxSource;
    use tempfile::TempDir;

    const INBOX: &str = r#"[
        {"id": "m1", "sender": "boss@corp.com", "subject": "Q3 report", "body": "Please send the Q3 report by Friday."},
        {"id": "m2", "sender": "news@daily.com", "subject": "Daily digest", "body": "Top stories today."}
    ]"#;

    fn state(dir: &TempDir, stub: Arc<StubGateway>) -> AppState {
        let mock = dir.path().join("mock_inbox.json");
        std::fs::write(&mock, INBOX).unwrap();
        AppState::new(AppDeps {
            gateway: stub,
            source: Arc::new(JsonInboxSource::new(mock)),
            emails: EmailStore::new(dir.path().join("processed_inbox.json")),
            prompts: PromptStore::new(dir.path().join("default_prompts.json")),
            fetch_limit: 10,
            inbox_limits: InboxContextLimits::default(),
        })
    }

    #[tokio::test]
    async fn process_on_empty_inbox_is_advisory() {
        let dir = TempDir::new().unwrap();
        let stub = Arc::new(StubGateway::new());
        let mut app = state(&dir, stub.clone());

        assert_eq!(app.process_inbox().await.unwrap(), ProcessOutcome::EmptyInbox);
        assert!(stub.calls().is_empty());
        assert!(!dir.path().join("processed_inbox.json").exists());
    }

    #[tokio::test]
    async fn fetch_process_and_restore() {
        let dir = TempDir::new().unwrap();
        let stub = Arc::new(
            StubGateway::new()
                .with_category("Q3", "To-Do")
                .with_category("digest", "Newsletter")
                .with_tasks(["Send Q3 report"]),
        );
        let mut app = state(&dir, stub);

        assert_eq!(app.fetch().await.unwrap(), 2);
        let ProcessOutcome::Processed(report) = app.process_inbox().await.unwrap() else {
            panic!("expected a processed batch");
        };
        assert_eq!(report.categorized, 2);
        assert_eq!(app.email("m1").unwrap().category.as_deref(), Some("To-Do"));

        let mut restored = state(&dir, Arc::new(StubGateway::new()));
        assert_eq!(restored.restore().await, 2);
        assert_eq!(restored.emails(), app.emails());
    }

    #[tokio::test]
    async fn unknown_id_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut app = state(&dir, Arc::new(StubGateway::new()));
        app.fetch().await.unwrap();

        assert!(matches!(
            app.process_email("nope").await,
            Err(Error::EmailNotFound { .. })
        ));
        assert!(matches!(
            app.draft_reply("nope", "").await,
            Err(Error::EmailNotFound { .. })
        ));
        assert!(matches!(
            app.chat(ChatScope::Email("nope".into()), "?").await,
            Err(Error::EmailNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn opening_marks_read() {
        let dir = TempDir::new().unwrap();
        let mut app = state(&dir, Arc::new(StubGateway::new()));
        app.fetch().await.unwrap();

        assert!(!app.email("m1").unwrap().read);
        assert_eq!(app.open("m1").await.unwrap().subject, "Q3 report");
        assert!(app.email("m1").unwrap().read);
        assert!(matches!(app.open("nope").await, Err(Error::EmailNotFound { .. })));
    }

    #[tokio::test]
    async fn read_flag_survives_restart() {
        let dir = TempDir::new().unwrap();
        let mut app = state(&dir, Arc::new(StubGateway::new()));
        app.fetch().await.unwrap();
        app.process_inbox().await.unwrap();
        app.open("m1").await.unwrap();

        let mut restarted = state(&dir, Arc::new(StubGateway::new()));
        restarted.restore().await;
        assert!(restarted.email("m1").unwrap().read);
        assert!(!restarted.email("m2").unwrap().read);
    }

    #[tokio::test]
    async fn process_single_email() {
        let dir = TempDir::new().unwrap();
        let stub = Arc::new(StubGateway::new().with_default_category("Important"));
        let mut app = state(&dir, stub.clone());
        app.fetch().await.unwrap();

        assert!(app.process_email("m2").await.unwrap());
        assert_eq!(app.email("m2").unwrap().category.as_deref(), Some("Important"));
        assert!(app.email("m1").unwrap().category.is_none());
        assert_eq!(stub.calls_for(GatewayOp::Categorize).len(), 1);
    }

    #[tokio::test]
    async fn drafts_are_held_then_saved() {
        let dir = TempDir::new().unwrap();
        let stub = Arc::new(StubGateway::new().with_reply("Will do."));
        let mut app = state(&dir, stub);
        app.fetch().await.unwrap();

        let draft = app.draft_reply("m1", "keep it short").await.unwrap();
        assert_eq!(draft.subject, "Re: Q3 report");
        assert_eq!(draft.notes.as_deref(), Some("keep it short"));
        assert!(app.drafts().is_empty());

        assert!(app.save_draft().is_some());
        assert_eq!(app.drafts().len(), 1);
        assert!(app.pending_draft().is_none());
        assert!(app.save_draft().is_none());
    }

    #[tokio::test]
    async fn failed_draft_is_not_saved() {
        let dir = TempDir::new().unwrap();
        let stub = Arc::new(StubGateway::new().with_reply("Error generating draft: quota"));
        let mut app = state(&dir, stub);
        app.fetch().await.unwrap();

        app.draft_reply("m1", "").await.unwrap();
        assert!(app.save_draft().is_none());
        assert!(app.drafts().is_empty());
    }

    #[tokio::test]
    async fn chat_is_recorded() {
        let dir = TempDir::new().unwrap();
        let stub = Arc::new(StubGateway::new().with_answer("Nothing urgent."));
        let mut app = state(&dir, stub.clone());
        app.fetch().await.unwrap();

        let answer = app.chat(ChatScope::Inbox, "Anything urgent?").await.unwrap();
        assert_eq!(answer, "Nothing urgent.");
        app.chat(ChatScope::Email("m1".into()), "Deadline?").await.unwrap();

        let history = app.chat_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].scope, ChatScope::Inbox);
        assert_eq!(history[1].question, "Deadline?");

        let chats = stub.calls_for(GatewayOp::Chat);
        assert!(chats[0].text.starts_with("Email 1 | From: boss@corp.com"));
        assert!(chats[1].text.starts_with("Sender: boss@corp.com"));
    }

    #[tokio::test]
    async fn template_edits_persist_and_apply() {
        let dir = TempDir::new().unwrap();
        let stub = Arc::new(StubGateway::new());
        let mut app = state(&dir, stub.clone());
        app.fetch().await.unwrap();

        app.set_template(TemplateKind::Categorization, "Label {subject}")
            .await
            .unwrap();
        app.process_inbox().await.unwrap();
        assert_eq!(
            stub.calls_for(GatewayOp::Categorize)[0].prompt,
            "Label Q3 report"
        );

        let reloaded = PromptStore::new(dir.path().join("default_prompts.json"))
            .load()
            .await;
        assert_eq!(reloaded.categorization, "Label {subject}");
    }
}
