//! Execution pipeline: source -> strategy -> channel.
//!
//! # Responsibility
//! - Run one generation for an already resolved configuration.
//! - Surface lookup and generation failures to the caller unmodified.
//!
//! # Invariants
//! - Steps run strictly in order; nothing is retried.
//! - The returned article's `ids` equal the config ids and its `topic` is the
//!   topic handed to the strategy, whatever the channel did.
//! - `created_at` is the run's `now`, so the run key's day matches the day the
//!   source picked for.
//! - A failed run returns no article.

use crate::model::article::{ArticleIds, GenerateInput, GeneratedArticle, SourceContext};
use crate::provider::error::GenerationError;
use crate::registry::capability_registry::{EngineRegistry, RegistryError};
use crate::registry::resolve::{resolve_engine_config, ResolveEngineInput, ResolvedEngineConfig};
use crate::time::iso_timestamp;
use chrono::{DateTime, Utc};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Pipeline failure, fatal to the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    Registry(RegistryError),
    Generation(GenerationError),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registry(err) => write!(f, "{err}"),
            Self::Generation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Registry(err) => Some(err),
            Self::Generation(err) => Some(err),
        }
    }
}

impl From<RegistryError> for EngineError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

impl From<GenerationError> for EngineError {
    fn from(value: GenerationError) -> Self {
        Self::Generation(value)
    }
}

impl EngineError {
    /// Stable short code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Registry(_) => "capability_not_found",
            Self::Generation(_) => "generation_failed",
        }
    }
}

/// Optional caller overrides for one run. Empty topics count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOverrides {
    pub topic: Option<String>,
    pub draft: Option<String>,
}

/// Article plus the configuration that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub config: ResolvedEngineConfig,
    pub article: GeneratedArticle,
}

/// Runs one generation with the current wall-clock time.
pub fn run_content_engine(
    registry: &EngineRegistry,
    config: &ResolvedEngineConfig,
    overrides: &RunOverrides,
) -> Result<RunOutput, EngineError> {
    run_content_engine_at(registry, config, overrides, Utc::now())
}

/// Runs one generation; `now` is the source clock and the article's `created_at`.
pub fn run_content_engine_at(
    registry: &EngineRegistry,
    config: &ResolvedEngineConfig,
    overrides: &RunOverrides,
    now: DateTime<Utc>,
) -> Result<RunOutput, EngineError> {
    let started_at = Instant::now();
    match run_steps(registry, config, overrides, now) {
        Ok(article) => {
            info!(
                "event=engine_run module=engine status=ok strategy={} source={} channel={} duration_ms={}",
                config.strategy_id,
                config.source_id,
                config.channel_id,
                started_at.elapsed().as_millis()
            );
            Ok(RunOutput {
                config: config.clone(),
                article,
            })
        }
        Err(err) => {
            error!(
                "event=engine_run module=engine status=error strategy={} source={} channel={} duration_ms={} error_code={}",
                config.strategy_id,
                config.source_id,
                config.channel_id,
                started_at.elapsed().as_millis(),
                err.code()
            );
            Err(err)
        }
    }
}

/// Resolves `input` against `registry`, then runs it.
pub fn run_resolved(
    registry: &EngineRegistry,
    input: &ResolveEngineInput,
    overrides: &RunOverrides,
) -> Result<RunOutput, EngineError> {
    let config = resolve_engine_config(registry, input);
    run_content_engine(registry, &config, overrides)
}

fn run_steps(
    registry: &EngineRegistry,
    config: &ResolvedEngineConfig,
    overrides: &RunOverrides,
    now: DateTime<Utc>,
) -> Result<GeneratedArticle, EngineError> {
    let strategy = registry.strategies.get(&config.strategy_id)?;
    let source = registry.sources.get(&config.source_id)?;
    let channel = registry.channels.get(&config.channel_id)?;

    let now_iso = iso_timestamp(now);
    let topic_override = overrides
        .topic
        .as_deref()
        .filter(|topic| !topic.is_empty());

    let (topic, source_draft, product) = match topic_override {
        Some(topic) => (topic.to_string(), None, None),
        None => {
            let payload = source.prepare(&SourceContext {
                strategy_id: config.strategy_id.clone(),
                channel_id: config.channel_id.clone(),
                now_iso: now_iso.clone(),
            });
            (payload.topic, payload.draft, payload.product)
        }
    };

    let input = GenerateInput {
        topic,
        source_id: config.source_id.clone(),
        channel_id: config.channel_id.clone(),
        draft: overrides.draft.clone().or(source_draft),
        product,
        now_iso: now_iso.clone(),
    };

    let raw = strategy.generate(&input)?;
    let topic = raw.topic.clone();

    let mut article = channel.optimize(raw);
    article.ids = ArticleIds {
        strategy_id: config.strategy_id.clone(),
        source_id: config.source_id.clone(),
        channel_id: config.channel_id.clone(),
    };
    article.topic = topic;
    article.created_at = now_iso;
    Ok(article)
}
