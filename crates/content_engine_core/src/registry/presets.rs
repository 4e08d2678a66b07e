//! Static preset table: named strategy + source + channel bundles.

/// Preset id used when the caller names none and as the resolver's floor.
pub const DEFAULT_PRESET_ID: &str = "default";

/// A named, immutable bundle of capability ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnginePreset {
    pub preset_id: &'static str,
    pub label: &'static str,
    pub description: Option<&'static str>,
    pub strategy_id: &'static str,
    pub source_id: &'static str,
    pub channel_id: &'static str,
}

pub const ENGINE_PRESETS: &[EnginePreset] = &[
    EnginePreset {
        preset_id: DEFAULT_PRESET_ID,
        label: "default",
        description: Some("When unsure, start here (quiet spread)."),
        strategy_id: "quiet-spread",
        source_id: "keywords",
        channel_id: "discover",
    },
    EnginePreset {
        preset_id: "gentle-rewrite",
        label: "gentle-rewrite",
        description: Some("Tidy an earlier draft (quiet rewrite)."),
        strategy_id: "quiet-rewrite",
        source_id: "rewrite",
        channel_id: "discover",
    },
    EnginePreset {
        preset_id: "seo-push",
        label: "seo-push",
        description: Some("Search-leaning output shaped by the seo channel."),
        strategy_id: "seo-basic",
        source_id: "keywords",
        channel_id: "seo",
    },
    EnginePreset {
        preset_id: "openai-default",
        label: "openai-default",
        description: Some("Generate topic, title and content with the text provider."),
        strategy_id: "openai-basic",
        source_id: "keywords",
        channel_id: "discover",
    },
];

/// Looks up one preset by exact id. Empty ids never match.
pub fn preset_by_id(preset_id: &str) -> Option<&'static EnginePreset> {
    if preset_id.is_empty() {
        return None;
    }
    ENGINE_PRESETS
        .iter()
        .find(|preset| preset.preset_id == preset_id)
}

/// Returns the `default` preset.
pub fn default_preset() -> &'static EnginePreset {
    // The table is a compile-time constant that always starts with `default`.
    &ENGINE_PRESETS[0]
}

#[cfg(test)]
mod tests {
    use super::{default_preset, preset_by_id, DEFAULT_PRESET_ID, ENGINE_PRESETS};
    use std::collections::BTreeSet;

    #[test]
    fn default_preset_is_first_and_named_default() {
        assert_eq!(default_preset().preset_id, DEFAULT_PRESET_ID);
        assert_eq!(default_preset().strategy_id, "quiet-spread");
    }

    #[test]
    fn preset_ids_are_unique() {
        let ids: BTreeSet<_> = ENGINE_PRESETS.iter().map(|p| p.preset_id).collect();
        assert_eq!(ids.len(), ENGINE_PRESETS.len());
    }

    #[test]
    fn lookup_is_exact_and_rejects_empty() {
        assert_eq!(
            preset_by_id("seo-push").map(|p| p.channel_id),
            Some("seo")
        );
        assert!(preset_by_id("SEO-PUSH").is_none());
        assert!(preset_by_id("").is_none());
    }
}
