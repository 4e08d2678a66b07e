//! Persisted run record model.
//!
//! # Responsibility
//! - Define the flat document saved once per generation run.
//! - Derive the idempotency key that makes repeated saves overwrite.
//!
//! # Invariants
//! - Same UTC day + ids + topic always yields the same `run_key`.
//! - Snapshot fields are optional: aggregation must tolerate partial records.

use crate::model::article::GeneratedArticle;
use crate::time::ymd_utc;
use serde::{Deserialize, Serialize};

const RUN_KEY_SEPARATOR: &str = "__";
const RUN_KEY_TOPIC_MAX_CHARS: usize = 120;

/// Flat persisted snapshot of one generated article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub run_key: String,
    pub topic: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub strategy_id: Option<String>,
    pub source_id: Option<String>,
    pub channel_id: Option<String>,
    pub created_at: Option<String>,
    /// Save timestamp (RFC 3339, UTC). Range queries filter on this field.
    pub saved_at: String,
    pub ymd: Option<String>,
}

impl RunRecord {
    /// Builds the persisted form of `article` saved at `saved_at`.
    pub fn from_article(article: &GeneratedArticle, saved_at: impl Into<String>) -> Self {
        let ymd = ymd_utc(&article.created_at).to_string();
        Self {
            run_key: run_key_for(article),
            topic: Some(article.topic.clone()),
            title: Some(article.title.clone()),
            content: Some(article.content.clone()),
            strategy_id: Some(article.ids.strategy_id.clone()),
            source_id: Some(article.ids.source_id.clone()),
            channel_id: Some(article.ids.channel_id.clone()),
            created_at: Some(article.created_at.clone()),
            saved_at: saved_at.into(),
            ymd: Some(ymd),
        }
    }
}

/// Derives `ymd__strategy__source__channel__topic` for one article.
pub fn run_key_for(article: &GeneratedArticle) -> String {
    [
        ymd_utc(&article.created_at),
        article.ids.strategy_id.as_str(),
        article.ids.source_id.as_str(),
        article.ids.channel_id.as_str(),
        normalize_key_part(&article.topic).as_str(),
    ]
    .join(RUN_KEY_SEPARATOR)
}

/// Percent-encodes `value` with URI-component rules and caps the length.
///
/// The output is pure ASCII, so the cap counts bytes and chars alike.
pub fn normalize_key_part(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        if is_uri_component_unreserved(byte) {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded.truncate(RUN_KEY_TOPIC_MAX_CHARS);
    encoded
}

fn is_uri_component_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')'
        )
}
