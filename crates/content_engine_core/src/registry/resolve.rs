//! Configuration resolver.
//!
//! # Responsibility
//! - Turn partial, untrusted selection input plus an optional preset into a
//!   runnable capability triple.
//! - Record every downgrade as a human-readable warning.
//!
//! # Invariants
//! - Resolution never fails; unknown ids degrade and warn.
//! - Per kind the priority is: explicit id > preset id > first registered id
//!   > the `default` preset's id.
//! - `preset_id` is echoed only when it matched a known preset.

use crate::model::article::CapabilityId;
use crate::registry::capability::CapabilityKind;
use crate::registry::capability_registry::EngineRegistry;
use crate::registry::presets::{default_preset, preset_by_id, EnginePreset};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Raw selection input. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveEngineInput {
    pub preset_id: Option<String>,
    pub strategy_id: Option<String>,
    pub source_id: Option<String>,
    pub channel_id: Option<String>,
}

/// Fully resolved configuration for one request. Built once, read-only after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEngineConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset_id: Option<String>,
    pub strategy_id: CapabilityId,
    pub source_id: CapabilityId,
    pub channel_id: CapabilityId,
    pub warnings: Vec<String>,
}

/// Resolves `input` against the ids currently registered in `registry`.
pub fn resolve_engine_config(
    registry: &EngineRegistry,
    input: &ResolveEngineInput,
) -> ResolvedEngineConfig {
    let mut warnings = Vec::new();
    let requested_preset = non_empty(&input.preset_id);
    let preset = requested_preset.and_then(preset_by_id);

    let strategy_id = resolve_kind(
        registry,
        CapabilityKind::Strategy,
        non_empty(&input.strategy_id),
        preset,
        &mut warnings,
    );
    let source_id = resolve_kind(
        registry,
        CapabilityKind::Source,
        non_empty(&input.source_id),
        preset,
        &mut warnings,
    );
    let channel_id = resolve_kind(
        registry,
        CapabilityKind::Channel,
        non_empty(&input.channel_id),
        preset,
        &mut warnings,
    );

    if let (Some(preset_id), None) = (requested_preset, preset) {
        warnings.push(format!("Unknown presetId: {preset_id}"));
    }

    if warnings.is_empty() {
        debug!(
            "event=config_resolve module=registry status=ok strategy={} source={} channel={}",
            strategy_id, source_id, channel_id
        );
    } else {
        warn!(
            "event=config_resolve module=registry status=degraded strategy={} source={} channel={} warnings={}",
            strategy_id,
            source_id,
            channel_id,
            warnings.len()
        );
    }

    ResolvedEngineConfig {
        preset_id: preset.map(|p| p.preset_id.to_string()),
        strategy_id,
        source_id,
        channel_id,
        warnings,
    }
}

fn resolve_kind(
    registry: &EngineRegistry,
    kind: CapabilityKind,
    explicit: Option<&str>,
    preset: Option<&EnginePreset>,
    warnings: &mut Vec<String>,
) -> CapabilityId {
    if let Some(id) = explicit {
        if registry.contains(kind, id) {
            return id.to_string();
        }
        warnings.push(format!("Unknown {}: {id}", kind.field_name()));
    }

    if let Some(id) = preset.map(|p| preset_id_for(p, kind)) {
        if registry.contains(kind, id) {
            return id.to_string();
        }
        warnings.push(format!("Unknown {}: {id}", kind.field_name()));
    }

    if let Some(first) = registry.first_id(kind) {
        return first.to_string();
    }

    let fallback = preset_id_for(default_preset(), kind);
    warnings.push(format!(
        "No {} registered; using default {fallback}",
        kind.as_str()
    ));
    fallback.to_string()
}

fn preset_id_for(preset: &EnginePreset, kind: CapabilityKind) -> &'static str {
    match kind {
        CapabilityKind::Strategy => preset.strategy_id,
        CapabilityKind::Source => preset.source_id,
        CapabilityKind::Channel => preset.channel_id,
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{resolve_engine_config, ResolveEngineInput};
    use crate::model::article::{
        ArticleIds, GenerateInput, GeneratedArticle, SourceContext, SourcePayload,
    };
    use crate::provider::error::GenerationError;
    use crate::registry::capability::{Capability, Channel, Source, Strategy};
    use crate::registry::capability_registry::EngineRegistry;
    use std::sync::Arc;

    struct Named(&'static str);

    impl Capability for Named {
        fn id(&self) -> &str {
            self.0
        }
    }

    impl Strategy for Named {
        fn generate(&self, input: &GenerateInput) -> Result<GeneratedArticle, GenerationError> {
            Ok(GeneratedArticle {
                topic: input.topic.clone(),
                title: input.topic.clone(),
                content: String::new(),
                ids: ArticleIds {
                    strategy_id: self.0.to_string(),
                    source_id: input.source_id.clone(),
                    channel_id: input.channel_id.clone(),
                },
                created_at: String::new(),
            })
        }
    }

    impl Source for Named {
        fn prepare(&self, _context: &SourceContext) -> SourcePayload {
            SourcePayload::topic(self.0)
        }
    }

    impl Channel for Named {
        fn optimize(&self, article: GeneratedArticle) -> GeneratedArticle {
            article
        }
    }

    fn registry(strategies: &[&'static str]) -> EngineRegistry {
        let mut registry = EngineRegistry::new();
        for id in strategies {
            registry.register_strategy(Arc::new(Named(id)));
        }
        for id in ["keywords", "rewrite"] {
            registry.register_source(Arc::new(Named(id)));
        }
        for id in ["discover", "seo"] {
            registry.register_channel(Arc::new(Named(id)));
        }
        registry
    }

    fn input(
        preset: Option<&str>,
        strategy: Option<&str>,
        source: Option<&str>,
        channel: Option<&str>,
    ) -> ResolveEngineInput {
        ResolveEngineInput {
            preset_id: preset.map(str::to_string),
            strategy_id: strategy.map(str::to_string),
            source_id: source.map(str::to_string),
            channel_id: channel.map(str::to_string),
        }
    }

    #[test]
    fn registered_explicit_ids_resolve_without_warnings() {
        let registry = registry(&["a", "b"]);
        let config = resolve_engine_config(
            &registry,
            &input(None, Some("b"), Some("rewrite"), Some("seo")),
        );
        assert_eq!(config.strategy_id, "b");
        assert_eq!(config.source_id, "rewrite");
        assert_eq!(config.channel_id, "seo");
        assert!(config.warnings.is_empty());
        assert_eq!(config.preset_id, None);
    }

    #[test]
    fn resolving_a_resolved_config_is_idempotent() {
        let registry = registry(&["a", "b"]);
        let first = resolve_engine_config(&registry, &input(None, Some("b"), None, Some("seo")));
        let second = resolve_engine_config(
            &registry,
            &input(
                None,
                Some(&first.strategy_id),
                Some(&first.source_id),
                Some(&first.channel_id),
            ),
        );
        assert_eq!(first, second);
        assert!(second.warnings.is_empty());
    }

    #[test]
    fn unknown_strategy_falls_back_to_first_registered_with_one_warning() {
        let registry = registry(&["a", "b"]);
        let config =
            resolve_engine_config(&registry, &input(None, Some("does-not-exist"), None, None));
        assert_eq!(config.strategy_id, "a");
        assert_eq!(config.warnings.len(), 1);
        assert!(config.warnings[0].contains("does-not-exist"));
        assert_eq!(config.warnings[0], "Unknown strategyId: does-not-exist");
    }

    #[test]
    fn explicit_id_wins_over_preset() {
        let registry = registry(&["quiet-spread", "seo-basic"]);
        let config = resolve_engine_config(
            &registry,
            &input(Some("default"), Some("seo-basic"), None, None),
        );
        assert_eq!(config.strategy_id, "seo-basic");
        assert_eq!(config.source_id, "keywords");
        assert_eq!(config.channel_id, "discover");
        assert_eq!(config.preset_id.as_deref(), Some("default"));
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn unknown_explicit_id_falls_back_to_preset_id() {
        let registry = registry(&["quiet-spread", "seo-basic"]);
        let config = resolve_engine_config(
            &registry,
            &input(Some("seo-push"), Some("nope"), None, None),
        );
        assert_eq!(config.strategy_id, "seo-basic");
        assert_eq!(config.channel_id, "seo");
        assert_eq!(config.warnings, vec!["Unknown strategyId: nope"]);
    }

    #[test]
    fn unregistered_preset_ids_warn_and_fall_back() {
        let registry = registry(&["a"]);
        let config = resolve_engine_config(&registry, &input(Some("gentle-rewrite"), None, None, None));
        assert_eq!(config.strategy_id, "a");
        assert_eq!(config.source_id, "rewrite");
        assert_eq!(config.channel_id, "discover");
        assert_eq!(config.warnings, vec!["Unknown strategyId: quiet-rewrite"]);
        assert_eq!(config.preset_id.as_deref(), Some("gentle-rewrite"));
    }

    #[test]
    fn unknown_preset_is_reported_and_not_echoed() {
        let registry = registry(&["a"]);
        let config = resolve_engine_config(&registry, &input(Some("mystery"), None, None, None));
        assert_eq!(config.preset_id, None);
        assert_eq!(config.warnings, vec!["Unknown presetId: mystery"]);
        assert_eq!(config.strategy_id, "a");
    }

    #[test]
    fn empty_strings_count_as_absent() {
        let registry = registry(&["a", "b"]);
        let config = resolve_engine_config(&registry, &input(Some(""), Some(""), Some(""), None));
        assert_eq!(config.strategy_id, "a");
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn empty_registry_uses_default_preset_ids_and_warns() {
        let registry = EngineRegistry::new();
        let config = resolve_engine_config(&registry, &ResolveEngineInput::default());
        assert_eq!(config.strategy_id, "quiet-spread");
        assert_eq!(config.source_id, "keywords");
        assert_eq!(config.channel_id, "discover");
        assert_eq!(config.warnings.len(), 3);
    }
}
