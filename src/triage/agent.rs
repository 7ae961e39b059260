//! Email agent — turns raw emails into enriched ones through the gateway.
//!
//! Each email gets its own categorize + extract pair, strictly in order.
//! Gateway failures surface as sentinels or empty lists and are absorbed
//! per email; a batch always runs to the end.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::gateway::Gateway;
use crate::triage::context::email_context;
use crate::triage::model::Email;
use crate::triage::prompts::{PromptTemplates, TemplateKind};
use crate::triage::sanitize::sanitize_category;

/// Summary of one `process_batch` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Emails processed.
    pub processed: usize,
    /// Emails left with a category.
    pub categorized: usize,
    /// Categorize responses dropped as failures or blanks.
    pub rejected_categories: usize,
    /// Total action items extracted.
    pub action_items: usize,
}

/// Orchestrates gateway calls for emails.
///
/// Holds no per-call state: emails and templates are borrowed for the
/// duration of each operation.
pub struct EmailAgent {
    gateway: Arc<dyn Gateway>,
}

impl EmailAgent {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    /// Categorize and extract action items for every email, in place.
    ///
    /// Both fields are overwritten unconditionally.
    pub async fn process_batch(
        &self,
        emails: &mut [Email],
        templates: &PromptTemplates,
    ) -> BatchReport {
        info!(count = emails.len(), "Processing email batch");

        let mut report = BatchReport::default();
        for email in emails.iter_mut() {
            let accepted = self.process_one(email, templates).await;

            report.processed += 1;
            if accepted {
                report.categorized += 1;
            } else {
                report.rejected_categories += 1;
            }
            report.action_items += email.action_items.len();
        }

        info!(
            processed = report.processed,
            categorized = report.categorized,
            rejected = report.rejected_categories,
            "Batch processing complete"
        );
        report
    }

    /// Process a single email. Returns whether a category was kept.
    pub async fn process_one(&self, email: &mut Email, templates: &PromptTemplates) -> bool {
        let text = email.triage_text();

        let category_prompt = templates.render(TemplateKind::Categorization, email);
        let raw_category = self.gateway.categorize(&text, &category_prompt).await;
        email.category = sanitize_category(&raw_category);

        if email.category.is_none() {
            warn!(
                id = %email.id,
                response = %raw_category,
                "Categorize response rejected; email left uncategorized"
            );
        }

        let actions_prompt = templates.render(TemplateKind::ActionExtraction, email);
        email.action_items = self
            .gateway
            .extract_action_items(&text, &actions_prompt)
            .await;

        debug!(
            id = %email.id,
            category = email.category_label(),
            action_items = email.action_items.len(),
            "Email processed"
        );

        email.category.is_some()
    }

    /// Draft a reply using the auto-reply template.
    ///
    /// `extra_instructions`, when not blank, is appended to the prompt.
    pub async fn generate_draft(
        &self,
        email: &Email,
        templates: &PromptTemplates,
        extra_instructions: &str,
    ) -> String {
        let mut prompt = templates.render(TemplateKind::AutoReply, email);
        let extra = extra_instructions.trim();
        if !extra.is_empty() {
            prompt.push_str("\n\nAdditional Instructions: ");
            prompt.push_str(extra);
        }

        debug!(id = %email.id, "Generating draft");
        self.gateway
            .generate_reply(&email.reply_text(), &prompt)
            .await
    }

    /// Answer a question about one email.
    pub async fn chat_about_email(&self, email: &Email, query: &str) -> String {
        self.gateway.chat(&email_context(email), query).await
    }

    /// Answer a question over a pre-built inbox summary.
    pub async fn chat_about_inbox(&self, inbox_context: &str, query: &str) -> String {
        self.gateway.chat(inbox_context, query).await
    }
}
