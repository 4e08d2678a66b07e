//! Article model and the inputs passed between pipeline stages.
//!
//! # Responsibility
//! - Define what a source hands to a strategy and what a strategy returns.
//! - Keep wire field names stable (`camelCase`) for JSON consumers.
//!
//! # Invariants
//! - `ids` is never rewritten by a channel.
//! - `created_at` is an RFC 3339 UTC timestamp.

use serde::{Deserialize, Serialize};

/// Opaque, case-sensitive identifier of one strategy, source or channel.
pub type CapabilityId = String;

/// The three capability ids that produced one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleIds {
    pub strategy_id: CapabilityId,
    pub source_id: CapabilityId,
    pub channel_id: CapabilityId,
}

/// Auxiliary product material a source may attach.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    pub id: Option<String>,
    pub name: Option<String>,
    pub affiliate_url: Option<String>,
}

/// Context handed to `Source::prepare`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceContext {
    pub strategy_id: CapabilityId,
    pub channel_id: CapabilityId,
    /// Generation timestamp (RFC 3339, UTC).
    pub now_iso: String,
}

/// Material returned by a source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePayload {
    pub topic: String,
    pub draft: Option<String>,
    pub product: Option<ProductRef>,
}

impl SourcePayload {
    pub fn topic(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }
}

/// Input handed to `Strategy::generate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateInput {
    pub topic: String,
    pub source_id: CapabilityId,
    pub channel_id: CapabilityId,
    /// Existing text to rewrite, when the source or caller supplied one.
    pub draft: Option<String>,
    pub product: Option<ProductRef>,
    /// Generation time; strategies stamp `created_at` from it.
    pub now_iso: String,
}

impl GenerateInput {
    /// Returns the draft when it carries non-whitespace text.
    pub fn non_blank_draft(&self) -> Option<&str> {
        self.draft
            .as_deref()
            .filter(|draft| !draft.trim().is_empty())
    }
}

/// Generated artifact. Markdown `content`, plain `title`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedArticle {
    pub topic: String,
    pub title: String,
    pub content: String,
    pub ids: ArticleIds,
    pub created_at: String,
}

/// Returns the first `max_chars` characters of `value`.
///
/// Counts chars rather than bytes so multi-byte text is never split.
pub fn char_prefix(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &value[..byte_index],
        None => value,
    }
}
