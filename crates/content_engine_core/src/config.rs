//! Environment-driven engine settings.
//!
//! # Responsibility
//! - Read persistence, store, logging and provider settings from env vars.
//! - Expose a lookup-based constructor so tests never touch process env.
//!
//! # Invariants
//! - Missing or blank variables fall back to documented defaults.
//! - Persistence is enabled only by the exact value `true`.

use crate::provider::openai::{OpenAiConfig, AUTH_ENV_VAR, DEFAULT_OPENAI_ENDPOINT, DEFAULT_OPENAI_MODEL};
use std::path::PathBuf;

pub const SAVE_RUNS_ENV_VAR: &str = "CONTENT_ENGINE_SAVE_RUNS";
pub const DB_PATH_ENV_VAR: &str = "CONTENT_ENGINE_DB";
pub const LOG_LEVEL_ENV_VAR: &str = "CONTENT_ENGINE_LOG_LEVEL";
pub const LOG_DIR_ENV_VAR: &str = "CONTENT_ENGINE_LOG_DIR";
pub const MODEL_ENV_VAR: &str = "OPENAI_MODEL";
pub const ENDPOINT_ENV_VAR: &str = "OPENAI_ENDPOINT";
pub const TIMEOUT_ENV_VAR: &str = "OPENAI_TIMEOUT_SECS";

pub const DEFAULT_DB_PATH: &str = "content_engine.sqlite3";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Process-level settings shared by the CLI and services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Whether generated runs are written to the store.
    pub save_runs: bool,
    pub db_path: PathBuf,
    /// Explicit log level; `None` uses the build-mode default.
    pub log_level: Option<String>,
    /// Absolute directory for rotating log files; `None` logs to stderr.
    pub log_dir: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_endpoint: String,
    pub openai_timeout_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            save_runs: false,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: None,
            log_dir: None,
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            openai_endpoint: DEFAULT_OPENAI_ENDPOINT.to_string(),
            openai_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl EngineSettings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        Self {
            save_runs: read(SAVE_RUNS_ENV_VAR).as_deref() == Some("true"),
            db_path: read(DB_PATH_ENV_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            log_level: read(LOG_LEVEL_ENV_VAR),
            log_dir: read(LOG_DIR_ENV_VAR),
            openai_api_key: read(AUTH_ENV_VAR),
            openai_model: read(MODEL_ENV_VAR).unwrap_or(defaults.openai_model),
            openai_endpoint: read(ENDPOINT_ENV_VAR).unwrap_or(defaults.openai_endpoint),
            openai_timeout_secs: read(TIMEOUT_ENV_VAR)
                .and_then(|value| value.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.openai_timeout_secs),
        }
    }

    /// Provider connection settings derived from these settings.
    pub fn openai_config(&self) -> OpenAiConfig {
        OpenAiConfig {
            api_key: self.openai_api_key.clone(),
            model: self.openai_model.clone(),
            endpoint: self.openai_endpoint.clone(),
            timeout_secs: self.openai_timeout_secs,
        }
    }
}
