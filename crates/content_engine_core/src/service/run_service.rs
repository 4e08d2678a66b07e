//! Run use-case service: resolve, seed, generate, save.
//!
//! # Responsibility
//! - Compose the resolver, rewrite-seed picker, pipeline and run store into
//!   one call used by outer surfaces.
//!
//! # Invariants
//! - The configuration is resolved exactly once per request.
//! - Seeds are looked up only when the resolved source is `rewrite`.
//! - With persistence disabled, saving is a silent `SaveOutcome::Skipped`.

use crate::builtin::sources::REWRITE_ID;
use crate::engine::run::{run_content_engine_at, EngineError, RunOutput, RunOverrides};
use crate::model::run_record::RunRecord;
use crate::registry::capability_registry::EngineRegistry;
use crate::registry::resolve::{resolve_engine_config, ResolveEngineInput, ResolvedEngineConfig};
use crate::repo::run_repo::{RepoError, RunRepository};
use crate::select::rewrite_seed_key;
use crate::service::seed::{pick_rewrite_seed, RewriteSeed, SeedMode, REWRITE_SEED_POOL_LIMIT};
use crate::time::{iso_timestamp, ymd_utc};
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure of a service-level use case.
#[derive(Debug)]
pub enum ServiceError {
    Engine(EngineError),
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Engine(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Engine(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<EngineError> for ServiceError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Raw selection plus optional caller overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRequest {
    pub selection: ResolveEngineInput,
    pub topic: Option<String>,
    pub draft: Option<String>,
}

/// Result of the save step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Skipped,
    Saved { run_key: String },
}

/// Everything one `generate` call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub output: RunOutput,
    /// Past run used as rewrite material, when one was picked.
    pub seed: Option<RewriteSeed>,
    pub save: SaveOutcome,
}

/// Use-case service wrapper around the engine and the run store.
pub struct RunService<'a> {
    registry: &'a EngineRegistry,
    repo: Option<&'a dyn RunRepository>,
    save_runs: bool,
}

impl<'a> RunService<'a> {
    /// Service without a store: no seeds, no saves.
    pub fn new(registry: &'a EngineRegistry) -> Self {
        Self {
            registry,
            repo: None,
            save_runs: false,
        }
    }

    /// Attaches a run store; `save_runs` controls whether results are written.
    pub fn with_repository(mut self, repo: &'a dyn RunRepository, save_runs: bool) -> Self {
        self.repo = Some(repo);
        self.save_runs = save_runs;
        self
    }

    /// Resolves, optionally seeds, runs and optionally saves one generation.
    ///
    /// # Contract
    /// - Caller `topic`/`draft` win over seed values.
    /// - `now` drives the source clock, the seed key and `saved_at`.
    pub fn generate(&self, request: &RunRequest, now: DateTime<Utc>) -> ServiceResult<RunOutcome> {
        let config = resolve_engine_config(self.registry, &request.selection);
        self.generate_resolved(config, request, now)
    }

    /// Same as `generate` for a configuration the caller already resolved.
    ///
    /// `request.selection` is ignored.
    pub fn generate_resolved(
        &self,
        config: ResolvedEngineConfig,
        request: &RunRequest,
        now: DateTime<Utc>,
    ) -> ServiceResult<RunOutcome> {
        let now_iso = iso_timestamp(now);

        let seed = self.pick_seed(&config, ymd_utc(&now_iso))?;
        let overrides = RunOverrides {
            topic: non_empty(request.topic.as_deref())
                .map(str::to_string)
                .or_else(|| seed.as_ref().map(|seed| seed.topic.clone())),
            draft: request
                .draft
                .clone()
                .or_else(|| seed.as_ref().and_then(|seed| seed.content.clone())),
        };

        let output = run_content_engine_at(self.registry, &config, &overrides, now)?;
        let save = self.save(&output, &now_iso)?;

        Ok(RunOutcome { output, seed, save })
    }

    fn pick_seed(&self, config: &ResolvedEngineConfig, ymd: &str) -> ServiceResult<Option<RewriteSeed>> {
        if config.source_id != REWRITE_ID {
            return Ok(None);
        }
        let Some(repo) = self.repo else {
            return Ok(None);
        };

        let mode = SeedMode::for_strategy(&config.strategy_id);
        let seed_key = rewrite_seed_key(ymd, &config.strategy_id, &config.channel_id, &config.source_id);
        let records = repo.list_recent_runs(REWRITE_SEED_POOL_LIMIT)?;
        let seed = pick_rewrite_seed(&records, mode, &seed_key);

        debug!(
            "event=seed_pick module=service status={} mode={} candidates={} picked_strategy={}",
            if seed.is_some() { "ok" } else { "skip" },
            mode.as_str(),
            records.len(),
            seed.as_ref()
                .and_then(|seed| seed.strategy_id.as_deref())
                .unwrap_or("-")
        );
        Ok(seed)
    }

    fn save(&self, output: &RunOutput, saved_at: &str) -> ServiceResult<SaveOutcome> {
        let repo = match self.repo {
            Some(repo) if self.save_runs => repo,
            _ => return Ok(SaveOutcome::Skipped),
        };

        let record = RunRecord::from_article(&output.article, saved_at);
        match repo.upsert_run(&record) {
            Ok(()) => {
                info!(
                    "event=run_save module=service status=ok strategy={} source={} channel={}",
                    output.config.strategy_id, output.config.source_id, output.config.channel_id
                );
                Ok(SaveOutcome::Saved {
                    run_key: record.run_key,
                })
            }
            Err(err) => {
                error!(
                    "event=run_save module=service status=error error_code=repo_write_failed error={}",
                    err
                );
                Err(err.into())
            }
        }
    }
}

/// Whether a run with `config` reads or writes the run store at all.
pub fn needs_run_store(config: &ResolvedEngineConfig, save_runs: bool) -> bool {
    save_runs || config.source_id == REWRITE_ID
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{needs_run_store, RunRequest, RunService, SaveOutcome};
    use crate::builtin::builtin_registry_with_provider;
    use crate::db::open_db_in_memory;
    use crate::model::run_record::RunRecord;
    use crate::provider::error::GenerationError;
    use crate::provider::openai::{TextProvider, TextRequest};
    use crate::registry::resolve::{resolve_engine_config, ResolveEngineInput};
    use crate::repo::run_repo::{RunRepository, SqliteRunRepository};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    struct OfflineProvider;

    impl TextProvider for OfflineProvider {
        fn submit(&self, _request: &TextRequest) -> Result<String, GenerationError> {
            Err(GenerationError::Transport("offline".to_string()))
        }
    }

    fn selection(preset: &str) -> ResolveEngineInput {
        ResolveEngineInput {
            preset_id: Some(preset.to_string()),
            ..ResolveEngineInput::default()
        }
    }

    #[test]
    fn without_store_nothing_is_saved() {
        let registry = builtin_registry_with_provider(Arc::new(OfflineProvider));
        let now = Utc.with_ymd_and_hms(2024, 2, 10, 9, 0, 0).unwrap();
        let outcome = RunService::new(&registry)
            .generate(&RunRequest::default(), now)
            .expect("default run should succeed");
        assert_eq!(outcome.save, SaveOutcome::Skipped);
        assert_eq!(outcome.seed, None);
        assert_eq!(outcome.output.article.ids.strategy_id, "quiet-spread");
    }

    #[test]
    fn saves_when_enabled_and_skips_when_disabled() {
        let registry = builtin_registry_with_provider(Arc::new(OfflineProvider));
        let conn = open_db_in_memory().expect("db should open");
        let repo = SqliteRunRepository::new(&conn);
        let now = Utc.with_ymd_and_hms(2024, 2, 10, 9, 0, 0).unwrap();

        let skipped = RunService::new(&registry)
            .with_repository(&repo, false)
            .generate(&RunRequest::default(), now)
            .expect("run should succeed");
        assert_eq!(skipped.save, SaveOutcome::Skipped);
        assert!(repo.list_recent_runs(10).expect("query").is_empty());

        let saved = RunService::new(&registry)
            .with_repository(&repo, true)
            .generate(&RunRequest::default(), now)
            .expect("run should succeed");
        let SaveOutcome::Saved { run_key } = saved.save else {
            panic!("expected a save");
        };
        let stored = repo
            .get_run(&run_key)
            .expect("read should succeed")
            .expect("row should exist");
        assert_eq!(stored.saved_at, "2024-02-10T09:00:00.000Z");
        assert_eq!(stored.strategy_id.as_deref(), Some("quiet-spread"));
    }

    #[test]
    fn rewrite_source_uses_quiet_seed() {
        let registry = builtin_registry_with_provider(Arc::new(OfflineProvider));
        let conn = open_db_in_memory().expect("db should open");
        let repo = SqliteRunRepository::new(&conn);
        repo.upsert_run(&RunRecord {
            run_key: "past-seo".to_string(),
            topic: Some("Loud topic".to_string()),
            content: Some("loud body".to_string()),
            strategy_id: Some("seo-basic".to_string()),
            saved_at: "2024-02-09T00:00:00.000Z".to_string(),
            ..RunRecord::default()
        })
        .expect("insert should succeed");
        repo.upsert_run(&RunRecord {
            run_key: "past-quiet".to_string(),
            topic: Some("Calm topic".to_string()),
            content: Some("calm body".to_string()),
            strategy_id: Some("quiet-spread".to_string()),
            saved_at: "2024-02-08T00:00:00.000Z".to_string(),
            ..RunRecord::default()
        })
        .expect("insert should succeed");

        let now = Utc.with_ymd_and_hms(2024, 2, 10, 9, 0, 0).unwrap();
        let outcome = RunService::new(&registry)
            .with_repository(&repo, false)
            .generate(&RunRequest {
                selection: selection("gentle-rewrite"),
                ..RunRequest::default()
            }, now)
            .expect("rewrite run should succeed");

        let seed = outcome.seed.expect("a seed should be picked");
        assert_eq!(seed.topic, "Calm topic");
        assert_eq!(seed.content.as_deref(), Some("calm body"));
        assert_eq!(outcome.output.article.topic, "Calm topic");
        assert_eq!(outcome.output.article.title, "Quiet rewrite: Calm topic");
    }

    #[test]
    fn caller_topic_beats_seed_topic() {
        let registry = builtin_registry_with_provider(Arc::new(OfflineProvider));
        let conn = open_db_in_memory().expect("db should open");
        let repo = SqliteRunRepository::new(&conn);
        repo.upsert_run(&RunRecord {
            run_key: "past".to_string(),
            topic: Some("Seed topic".to_string()),
            strategy_id: Some("quiet-spread".to_string()),
            saved_at: "2024-02-09T00:00:00.000Z".to_string(),
            ..RunRecord::default()
        })
        .expect("insert should succeed");

        let now = Utc.with_ymd_and_hms(2024, 2, 10, 9, 0, 0).unwrap();
        let outcome = RunService::new(&registry)
            .with_repository(&repo, false)
            .generate(&RunRequest {
                selection: selection("gentle-rewrite"),
                topic: Some("Mine".to_string()),
                draft: None,
            }, now)
            .expect("run should succeed");
        assert_eq!(outcome.output.article.topic, "Mine");
    }

    #[test]
    fn provider_failure_surfaces_as_engine_error() {
        let registry = builtin_registry_with_provider(Arc::new(OfflineProvider));
        let now = Utc.with_ymd_and_hms(2024, 2, 10, 9, 0, 0).unwrap();
        let err = RunService::new(&registry)
            .generate(&RunRequest {
                selection: selection("openai-default"),
                ..RunRequest::default()
            }, now)
            .expect_err("offline provider must fail");
        assert!(err.to_string().contains("offline"));
    }

    #[test]
    fn run_key_day_comes_from_request_clock() {
        let registry = builtin_registry_with_provider(Arc::new(OfflineProvider));
        let conn = open_db_in_memory().expect("db should open");
        let repo = SqliteRunRepository::new(&conn);
        let service = RunService::new(&registry).with_repository(&repo, true);
        let request = RunRequest {
            topic: Some("T".to_string()),
            ..RunRequest::default()
        };

        let first = service
            .generate(&request, Utc.with_ymd_and_hms(2024, 2, 3, 9, 0, 0).unwrap())
            .expect("run should succeed");
        let second = service
            .generate(&request, Utc.with_ymd_and_hms(2024, 2, 4, 9, 0, 0).unwrap())
            .expect("run should succeed");

        let SaveOutcome::Saved { run_key } = first.save else {
            panic!("expected a save");
        };
        assert_eq!(run_key, "2024-02-03__quiet-spread__keywords__discover__T");
        assert_eq!(first.output.article.created_at, "2024-02-03T09:00:00.000Z");
        assert_ne!(second.save, SaveOutcome::Saved { run_key });
        assert_eq!(repo.list_recent_runs(10).expect("query").len(), 2);
    }

    #[test]
    fn store_is_needed_only_for_saving_or_rewrite_seeds() {
        let registry = builtin_registry_with_provider(Arc::new(OfflineProvider));
        let plain = resolve_engine_config(&registry, &selection("default"));
        let rewrite = resolve_engine_config(&registry, &selection("gentle-rewrite"));

        assert!(!needs_run_store(&plain, false));
        assert!(needs_run_store(&plain, true));
        assert!(needs_run_store(&rewrite, false));
    }

    #[test]
    fn pre_resolved_config_ignores_selection() {
        let registry = builtin_registry_with_provider(Arc::new(OfflineProvider));
        let config = resolve_engine_config(&registry, &selection("seo-push"));
        let now = Utc.with_ymd_and_hms(2024, 2, 10, 9, 0, 0).unwrap();
        let outcome = RunService::new(&registry)
            .generate_resolved(config, &RunRequest {
                selection: selection("default"),
                ..RunRequest::default()
            }, now)
            .expect("run should succeed");
        assert_eq!(outcome.output.article.ids.channel_id, "seo");
        assert_eq!(outcome.save, SaveOutcome::Skipped);
    }
}
