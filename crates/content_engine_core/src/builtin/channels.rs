//! Built-in presentation channels and their text helpers.

use crate::model::article::{char_prefix, GeneratedArticle};
use crate::registry::capability::{Capability, Channel};
use once_cell::sync::Lazy;
use regex::Regex;

pub const DISCOVER_ID: &str = "discover";
pub const SEO_ID: &str = "seo";

const DISCOVER_MAX_SECTIONS: usize = 2;
const SEO_TITLE_MAX_CHARS: usize = 32;
const H2_SPLIT: &str = "\n## ";
const ELLIPSIS: char = '…';

static CONCLUSION_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[Conclusion\]\s*").expect("valid conclusion prefix regex"));

/// Keeps the lead plus the first `DISCOVER_MAX_SECTIONS` `## ` sections.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscoverChannel;

impl Capability for DiscoverChannel {
    fn id(&self) -> &str {
        DISCOVER_ID
    }
}

impl Channel for DiscoverChannel {
    fn optimize(&self, article: GeneratedArticle) -> GeneratedArticle {
        let content = limit_h2_sections(&article.content, DISCOVER_MAX_SECTIONS);
        GeneratedArticle { content, ..article }
    }
}

/// Normalizes the title for search listings.
#[derive(Debug, Default, Clone, Copy)]
pub struct SeoChannel;

impl Capability for SeoChannel {
    fn id(&self) -> &str {
        SEO_ID
    }
}

impl Channel for SeoChannel {
    fn optimize(&self, article: GeneratedArticle) -> GeneratedArticle {
        let title = clamp_title(strip_seo_prefix(&article.title), SEO_TITLE_MAX_CHARS);
        GeneratedArticle { title, ..article }
    }
}

/// Splits on `"\n## "` and keeps the head plus `max_sections` sections.
///
/// Markdown without any H2 is returned unchanged.
pub fn limit_h2_sections(markdown: &str, max_sections: usize) -> String {
    let mut parts = markdown.split(H2_SPLIT);
    let head = parts.next().unwrap_or_default();
    let sections: Vec<&str> = parts.collect();
    if sections.is_empty() {
        return markdown.to_string();
    }

    let mut kept = vec![head.to_string()];
    kept.extend(
        sections
            .into_iter()
            .take(max_sections)
            .map(|section| format!("## {section}")),
    );
    kept.join("\n")
}

/// Removes a leading `[Conclusion]` marker and the whitespace after it.
pub fn strip_seo_prefix(title: &str) -> &str {
    match CONCLUSION_PREFIX_RE.find(title) {
        Some(found) => &title[found.end()..],
        None => title,
    }
}

/// Clamps `title` to `max_chars`, ending with `…` when shortened.
pub fn clamp_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() <= max_chars {
        return title.to_string();
    }
    let mut clamped = char_prefix(title, max_chars.saturating_sub(1)).to_string();
    clamped.push(ELLIPSIS);
    clamped
}
