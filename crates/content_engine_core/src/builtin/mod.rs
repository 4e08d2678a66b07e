//! Built-in strategies, sources and channels plus the registry bootstrap.
//!
//! # Responsibility
//! - Provide the capability set the engine ships with.
//! - Register them in a fixed order so "first registered" fallbacks are stable.
//!
//! # Invariants
//! - `shared_registry` builds at most once per process; later calls return
//!   the same instance regardless of the settings passed.

pub mod channels;
pub mod openai_basic;
pub mod sources;
pub mod strategies;

use crate::config::EngineSettings;
use crate::provider::openai::{OpenAiClient, TextProvider};
use crate::registry::capability_registry::EngineRegistry;
use log::info;
use once_cell::sync::OnceCell;
use std::sync::Arc;

static SHARED_REGISTRY: OnceCell<Arc<EngineRegistry>> = OnceCell::new();

/// Registers every built-in capability into `registry`.
///
/// Strategy order: quiet-spread, seo-basic, rewrite-basic, quiet-rewrite,
/// openai-basic. Sources: keywords, product, rewrite. Channels: discover, seo.
pub fn register_builtins(registry: &mut EngineRegistry, provider: Arc<dyn TextProvider>) {
    registry.register_strategy(Arc::new(strategies::QuietSpreadStrategy));
    registry.register_strategy(Arc::new(strategies::SeoBasicStrategy));
    registry.register_strategy(Arc::new(strategies::RewriteBasicStrategy));
    registry.register_strategy(Arc::new(strategies::QuietRewriteStrategy));
    registry.register_strategy(Arc::new(openai_basic::OpenAiBasicStrategy::new(provider)));

    registry.register_source(Arc::new(sources::KeywordsSource));
    registry.register_source(Arc::new(sources::ProductSource));
    registry.register_source(Arc::new(sources::RewriteSource));

    registry.register_channel(Arc::new(channels::DiscoverChannel));
    registry.register_channel(Arc::new(channels::SeoChannel));
}

/// Builds a fresh registry with the built-ins and an OpenAI-backed provider.
pub fn builtin_registry(settings: &EngineSettings) -> EngineRegistry {
    let provider: Arc<dyn TextProvider> = Arc::new(OpenAiClient::new(settings.openai_config()));
    builtin_registry_with_provider(provider)
}

/// Builds a fresh registry with the built-ins and the given provider.
pub fn builtin_registry_with_provider(provider: Arc<dyn TextProvider>) -> EngineRegistry {
    let mut registry = EngineRegistry::new();
    register_builtins(&mut registry, provider);
    registry
}

/// Process-wide registry, initialized on first use.
pub fn shared_registry(settings: &EngineSettings) -> Arc<EngineRegistry> {
    SHARED_REGISTRY
        .get_or_init(|| {
            let registry = builtin_registry(settings);
            let options = registry.options();
            info!(
                "event=registry_init module=builtin status=ok strategies={} sources={} channels={}",
                options.strategies.len(),
                options.sources.len(),
                options.channels.len()
            );
            Arc::new(registry)
        })
        .clone()
}
