//! Configuration types.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};
use crate::mail::MOCK_INBOX_FILE;
use crate::store::{INBOX_FILE, PROMPTS_FILE};
use crate::triage::InboxContextLimits;

/// Value of `TRIAGE_LLM_BACKEND` that runs without a model.
pub const STUB_BACKEND: &str = "stub";

/// Runtime configuration for the triage assistant.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// Directory holding prompts, the inbox snapshot, the mock inbox and logs.
    pub data_dir: PathBuf,
    /// Model configuration; `None` runs the deterministic stub gateway.
    pub llm: Option<LlmConfig>,
    /// Upper bound on a single gateway call.
    pub call_timeout: Duration,
    /// Maximum emails pulled per fetch.
    pub fetch_limit: usize,
    /// Bounds on the inbox chat context.
    pub inbox_limits: InboxContextLimits,
}

impl TriageConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = var("TRIAGE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let call_timeout = Duration::from_secs(parse_or(&var, "TRIAGE_LLM_TIMEOUT_SECS", 60u64)?);
        let fetch_limit = parse_nonzero(&var, "TRIAGE_FETCH_LIMIT", 10)?;
        let defaults = InboxContextLimits::default();
        let inbox_limits = InboxContextLimits {
            max_emails: parse_nonzero(&var, "TRIAGE_INBOX_MAX_EMAILS", defaults.max_emails)?,
            max_body_chars: parse_nonzero(
                &var,
                "TRIAGE_INBOX_MAX_BODY_CHARS",
                defaults.max_body_chars,
            )?,
        };

        let backend_name = var("TRIAGE_LLM_BACKEND").unwrap_or_else(|| "gemini".to_string());
        let llm = if backend_name.trim().eq_ignore_ascii_case(STUB_BACKEND) {
            None
        } else {
            let backend = LlmBackend::from_str(&backend_name)?;
            let key_var = backend.api_key_var();
            let api_key = var(key_var).ok_or_else(|| ConfigError::MissingEnvVar(key_var.to_string()))?;
            let model = var("TRIAGE_MODEL").unwrap_or_else(|| backend.default_model().to_string());
            Some(LlmConfig {
                backend,
                api_key: secrecy::SecretString::from(api_key),
                model,
                request_timeout: call_timeout,
            })
        };

        Ok(Self {
            data_dir,
            llm,
            call_timeout,
            fetch_limit,
            inbox_limits,
        })
    }

    pub fn prompts_path(&self) -> PathBuf {
        self.data_dir.join(PROMPTS_FILE)
    }

    pub fn inbox_path(&self) -> PathBuf {
        self.data_dir.join(INBOX_FILE)
    }

    pub fn mock_inbox_path(&self) -> PathBuf {
        self.data_dir.join(MOCK_INBOX_FILE)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{raw}': {e}"),
        }),
        None => Ok(default),
    }
}

/// Like `parse_or`, for limits where zero would disable the feature.
fn parse_nonzero<F>(var: &F, key: &str, default: usize) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_or(var, key, default)? {
        0 => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be at least 1".to_string(),
        }),
        n => Ok(n),
    }
}
