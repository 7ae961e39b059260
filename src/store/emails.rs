//! Email snapshot store.
//!
//! Every save writes the full collection; the last save is authoritative.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::store::json_file::{Snapshot, read_json, write_json_atomic};
use crate::triage::model::{Email, dedupe_by_id};

/// Full-snapshot store for enriched emails.
pub struct EmailStore {
    path: PathBuf,
}

impl EmailStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last snapshot; empty on first run or if unreadable.
    pub async fn load(&self) -> Vec<Email> {
        match read_json::<Vec<Email>>(&self.path).await {
            Ok(Snapshot::Loaded(emails)) => {
                let emails = dedupe_by_id(emails);
                debug!(count = emails.len(), "Loaded email snapshot");
                emails
            }
            Ok(Snapshot::Missing) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Email snapshot unreadable, starting empty");
                Vec::new()
            }
        }
    }

    /// Replace the snapshot with `emails`.
    pub async fn save(&self, emails: &[Email]) -> Result<(), StoreError> {
        write_json_atomic(&self.path, emails).await?;
        info!(count = emails.len(), path = %self.path.display(), "Email snapshot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn enriched() -> Vec<Email> {
        let mut first = Email::new("a1", "eve@x.com", "Contract", "Sign by Friday", "2024-06-01");
        first.category = Some("Important".into());
        first.action_items = vec!["Sign contract".into()];
        first.read = true;

        let second = Email::new("b2", "ops@x.com", "", "", "Tue, 4 Jun 2024 08:00:00 +0000");
        vec![first, second]
    }

    #[tokio::test]
    async fn first_run_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = EmailStore::new(dir.path().join("processed_inbox.json"));
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn snapshot_round_trip_is_lossless() {
        let dir = TempDir::new().unwrap();
        let store = EmailStore::new(dir.path().join("processed_inbox.json"));
        let emails = enriched();

        store.save(&emails).await.unwrap();
        let loaded = store.load().await;
        assert_eq!(loaded, emails);

        // Saving what was loaded changes nothing.
        store.save(&loaded).await.unwrap();
        assert_eq!(store.load().await, emails);
    }

    #[tokio::test]
    async fn last_save_wins() {
        let dir = TempDir::new().unwrap();
        let store = EmailStore::new(dir.path().join("processed_inbox.json"));
        let emails = enriched();

        store.save(&emails).await.unwrap();
        store.save(&emails[1..]).await.unwrap();

        let loaded = store.load().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "b2");
    }

    #[tokio::test]
    async fn duplicate_ids_in_snapshot_are_dropped() {
        let dir = TempDir::new().unwrap();
        let store = EmailStore::new(dir.path().join("processed_inbox.json"));
        let mut emails = enriched();
        let mut dup = emails[0].clone();
        dup.subject = "Shadow copy".into();
        emails.push(dup);

        store.save(&emails).await.unwrap();
        let loaded = store.load().await;
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].subject, "Contract");
        assert_eq!(loaded[1].id, "b2");
    }

    #[tokio::test]
    async fn corrupt_snapshot_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("processed_inbox.json");
        std::fs::write(&path, "[{\"id\": ").unwrap();
        assert!(EmailStore::new(path).load().await.is_empty());
    }
}
