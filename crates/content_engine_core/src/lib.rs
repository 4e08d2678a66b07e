//! Core of the content engine.
//!
//! Composes articles from three pluggable capabilities (a strategy for how to
//! write, a source for what material, a channel for how to present), resolves
//! loosely specified selections against what is registered, and aggregates
//! saved runs into monthly reports.

pub mod builtin;
pub mod config;
pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod provider;
pub mod registry;
pub mod repo;
pub mod report;
pub mod select;
pub mod service;
pub mod time;

pub use builtin::{builtin_registry, builtin_registry_with_provider, register_builtins, shared_registry};
pub use config::EngineSettings;
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use engine::{run_content_engine, run_content_engine_at, run_resolved, EngineError, RunOutput, RunOverrides};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use model::article::{ArticleIds, GenerateInput, GeneratedArticle, ProductRef, SourceContext, SourcePayload};
pub use model::run_record::RunRecord;
pub use provider::error::GenerationError;
pub use provider::openai::{OpenAiClient, OpenAiConfig, TextProvider, TextRequest};
pub use registry::capability::{Capability, CapabilityKind, Channel, Source, Strategy};
pub use registry::capability_registry::{CapabilityRegistry, EngineRegistry, RegistryError, RegistryOptions};
pub use registry::presets::{preset_by_id, EnginePreset, ENGINE_PRESETS};
pub use registry::resolve::{resolve_engine_config, ResolveEngineInput, ResolvedEngineConfig};
pub use repo::insight_repo::{InsightDocument, InsightRepository, SqliteInsightRepository};
pub use repo::run_repo::{RepoError, RepoResult, RunRepository, SqliteRunRepository};
pub use report::insight::{build_insight_draft, write_json_file, write_monthly_insight, InsightDraft, MonthlyInsight};
pub use report::monthly::{
    aggregate_runs, build_monthly_report, month_range, render_report_text, MonthRange, MonthlyReport, ReportError,
};
pub use select::hash_to_index;
pub use service::run_service::{
    needs_run_store, RunOutcome, RunRequest, RunService, SaveOutcome, ServiceError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
