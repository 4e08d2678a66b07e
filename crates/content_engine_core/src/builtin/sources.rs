//! Built-in material sources.

use crate::model::article::{ProductRef, SourceContext, SourcePayload};
use crate::registry::capability::{Capability, Source};
use crate::select::{hash_to_index, topic_seed};
use crate::time::ymd_utc;

pub const KEYWORDS_ID: &str = "keywords";
pub const PRODUCT_ID: &str = "product";
pub const REWRITE_ID: &str = "rewrite";

/// Rotating topic pool for the `keywords` source.
pub const KEYWORD_TOPICS: [&str; 6] = [
    "Choosing a power bank without wearing yourself out",
    "Tidying your gadgets so carrying them feels lighter",
    "Starting a Type-C life with less charging stress",
    "Thinking about backup power so you are never stuck outside",
    "The viewing order that keeps comparisons from tiring you",
    "Checks that prevent regret when picking a power bank",
];

const PRODUCT_TOPIC: &str = "Choosing a light, easy-to-carry power bank";
const PRODUCT_NAME: &str = "Demo item: lightweight power bank";
const PRODUCT_AFFILIATE_URL: &str = "https://example.com";

const REWRITE_TOPIC: &str = "The viewing order that keeps comparisons from tiring you";
const REWRITE_DRAFT: [&str; 4] = [
    "Power banks come with so much information that it gets tiring.",
    "So it matters to decide one priority first.",
    "Weight? Speed? Or price?",
    "Once the order is set, comparing gets much easier.",
];

/// Picks one of `KEYWORD_TOPICS`, stable for a UTC day, strategy and channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordsSource;

impl Capability for KeywordsSource {
    fn id(&self) -> &str {
        KEYWORDS_ID
    }
}

impl Source for KeywordsSource {
    fn prepare(&self, context: &SourceContext) -> SourcePayload {
        let seed = topic_seed(
            ymd_utc(&context.now_iso),
            &context.strategy_id,
            &context.channel_id,
        );
        let index = hash_to_index(&seed, KEYWORD_TOPICS.len());
        SourcePayload::topic(KEYWORD_TOPICS[index])
    }
}

/// Fixed topic plus a placeholder product dated by the run day.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProductSource;

impl Capability for ProductSource {
    fn id(&self) -> &str {
        PRODUCT_ID
    }
}

impl Source for ProductSource {
    fn prepare(&self, context: &SourceContext) -> SourcePayload {
        SourcePayload {
            topic: PRODUCT_TOPIC.to_string(),
            draft: None,
            product: Some(ProductRef {
                id: Some(format!("demo-{}", ymd_utc(&context.now_iso))),
                name: Some(PRODUCT_NAME.to_string()),
                affiliate_url: Some(PRODUCT_AFFILIATE_URL.to_string()),
            }),
        }
    }
}

/// Fixed topic and draft; callers usually override both with a past run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RewriteSource;

impl Capability for RewriteSource {
    fn id(&self) -> &str {
        REWRITE_ID
    }
}

impl Source for RewriteSource {
    fn prepare(&self, _context: &SourceContext) -> SourcePayload {
        SourcePayload {
            topic: REWRITE_TOPIC.to_string(),
            draft: Some(REWRITE_DRAFT.join("\n")),
            product: None,
        }
    }
}
