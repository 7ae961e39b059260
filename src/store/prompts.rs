//! Prompt template store.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::StoreError;
use crate::store::json_file::{Snapshot, read_json, write_json_atomic};
use crate::triage::prompts::PromptTemplates;

/// Persists the three prompt templates as one JSON object.
pub struct PromptStore {
    path: PathBuf,
}

impl PromptStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load templates, falling back to the built-in defaults when the file
    /// is missing or unreadable.
    pub async fn load(&self) -> PromptTemplates {
        match read_json::<PromptTemplates>(&self.path).await {
            Ok(Snapshot::Loaded(templates)) => templates,
            Ok(Snapshot::Missing) => {
                info!(path = %self.path.display(), "No prompt configuration yet, using defaults");
                PromptTemplates::default()
            }
            Err(e) => {
                warn!(error = %e, "Prompt configuration unreadable, using defaults");
                PromptTemplates::default()
            }
        }
    }

    /// Overwrite the persisted templates atomically.
    pub async fn save(&self, templates: &PromptTemplates) -> Result<(), StoreError> {
        write_json_atomic(&self.path, templates).await?;
        info!(path = %self.path.display(), "Prompt configuration saved");
        Ok(())
    }
}
