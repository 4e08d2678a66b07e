//! Template-based writing strategies.
//!
//! Each strategy is a pure function of its input.

use crate::model::article::{char_prefix, ArticleIds, GenerateInput, GeneratedArticle};
use crate::provider::error::GenerationError;
use crate::registry::capability::{Capability, Strategy};

pub const QUIET_SPREAD_ID: &str = "quiet-spread";
pub const QUIET_REWRITE_ID: &str = "quiet-rewrite";
pub const SEO_BASIC_ID: &str = "seo-basic";
pub const REWRITE_BASIC_ID: &str = "rewrite-basic";

/// Title prefix emitted by search-leaning strategies; the `seo` channel strips it.
pub const CONCLUSION_PREFIX: &str = "[Conclusion]";

const QUIET_REWRITE_EXCERPT_CHARS: usize = 500;
const SEO_BASIC_EXCERPT_CHARS: usize = 600;
const REWRITE_BASIC_EXCERPT_CHARS: usize = 700;

fn article(strategy_id: &str, input: &GenerateInput, title: String, content: String) -> GeneratedArticle {
    GeneratedArticle {
        topic: input.topic.clone(),
        title,
        content,
        ids: ArticleIds {
            strategy_id: strategy_id.to_string(),
            source_id: input.source_id.clone(),
            channel_id: input.channel_id.clone(),
        },
        created_at: input.now_iso.clone(),
    }
}

fn conclusion_title(topic: &str) -> String {
    format!("{CONCLUSION_PREFIX} {topic}")
}

/// Calm, fragment-style article with three short sections.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuietSpreadStrategy;

impl Capability for QuietSpreadStrategy {
    fn id(&self) -> &str {
        QUIET_SPREAD_ID
    }
}

impl Strategy for QuietSpreadStrategy {
    fn generate(&self, input: &GenerateInput) -> Result<GeneratedArticle, GenerationError> {
        let title = format!("Quiet spread: {}", input.topic);
        let content = [
            format!("# {title}"),
            String::new(),
            "## Start with a little empathy".to_string(),
            "When you are tired, doing the research is often the hardest part.".to_string(),
            String::new(),
            "## Take it in fragments".to_string(),
            "- \"You don't have to understand all of it.\"".to_string(),
            "- \"Stopping here for today is fine.\"".to_string(),
            "- \"Keep it in a form you can come back to.\"".to_string(),
            String::new(),
            "## Leave some space".to_string(),
            "No rush for an answer; just set the viewpoint down gently.".to_string(),
            "So you can come back here whenever you need it.".to_string(),
        ]
        .join("\n");
        Ok(article(QUIET_SPREAD_ID, input, title, content))
    }
}

/// Gentle rewrite that keeps an excerpt of the draft.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuietRewriteStrategy;

impl Capability for QuietRewriteStrategy {
    fn id(&self) -> &str {
        QUIET_REWRITE_ID
    }
}

impl Strategy for QuietRewriteStrategy {
    fn generate(&self, input: &GenerateInput) -> Result<GeneratedArticle, GenerationError> {
        let title = format!("Quiet rewrite: {}", input.topic);
        let excerpt = input
            .non_blank_draft()
            .map(|draft| char_prefix(draft, QUIET_REWRITE_EXCERPT_CHARS))
            .unwrap_or("(no draft available)");
        let content = [
            format!("# {title}"),
            String::new(),
            "## Catch your breath".to_string(),
            "You don't need to take in everything. One viewpoint is enough for today.".to_string(),
            String::new(),
            "## One viewpoint to keep".to_string(),
            "Decide what matters most first, and comparing gets a little easier.".to_string(),
            String::new(),
            "---".to_string(),
            "## Original draft (excerpt)".to_string(),
            excerpt.to_string(),
            "---".to_string(),
            String::new(),
            "## Margin".to_string(),
            "So you can come back here when you need it again.".to_string(),
        ]
        .join("\n");
        Ok(article(QUIET_REWRITE_ID, input, title, content))
    }
}

/// Conclusion-first article; rewrites the draft when one is present.
#[derive(Debug, Default, Clone, Copy)]
pub struct SeoBasicStrategy;

impl Capability for SeoBasicStrategy {
    fn id(&self) -> &str {
        SEO_BASIC_ID
    }
}

impl Strategy for SeoBasicStrategy {
    fn generate(&self, input: &GenerateInput) -> Result<GeneratedArticle, GenerationError> {
        let title = conclusion_title(&input.topic);
        let content = match input.non_blank_draft() {
            None => format!(
                "# {title}\n\n(First) When unsure, just check three things: capacity, output and weight.\n"
            ),
            Some(draft) => [
                format!("# {title}"),
                String::new(),
                "## Rewrite (tidied from the draft)".to_string(),
                "The key points of the draft are kept and made easier to read.".to_string(),
                String::new(),
                "---".to_string(),
                "## Original draft (excerpt)".to_string(),
                char_prefix(draft, SEO_BASIC_EXCERPT_CHARS).to_string(),
                "---".to_string(),
                String::new(),
                "## Put another way".to_string(),
                "Pick the one thing that matters most before comparing; it is the least tiring way."
                    .to_string(),
                "(Capacity, output or weight: choose just one first.)".to_string(),
            ]
            .join("\n"),
        };
        Ok(article(SEO_BASIC_ID, input, title, content))
    }
}

/// Compresses a draft to its decision points, or writes a short new piece.
#[derive(Debug, Default, Clone, Copy)]
pub struct RewriteBasicStrategy;

impl Capability for RewriteBasicStrategy {
    fn id(&self) -> &str {
        REWRITE_BASIC_ID
    }
}

impl Strategy for RewriteBasicStrategy {
    fn generate(&self, input: &GenerateInput) -> Result<GeneratedArticle, GenerationError> {
        let prefixed_title = conclusion_title(&input.topic);
        let (title, content) = match input.non_blank_draft() {
            Some(draft) => {
                let content = [
                    format!("# {prefixed_title}"),
                    String::new(),
                    "## Rewrite (compressed to the essentials)".to_string(),
                    "Only three decision axes are kept so readers don't get lost.".to_string(),
                    String::new(),
                    "### Decide these first (just three)".to_string(),
                    "- Capacity (how much do you need?)".to_string(),
                    "- Output (do you want fast charging?)".to_string(),
                    "- Weight (is portability the priority?)".to_string(),
                    String::new(),
                    "---".to_string(),
                    "## Original draft (excerpt)".to_string(),
                    char_prefix(draft, REWRITE_BASIC_EXCERPT_CHARS).to_string(),
                    "---".to_string(),
                    String::new(),
                    "## Summary".to_string(),
                    "Settle one of capacity, output or weight first and comparing stays calm."
                        .to_string(),
                ]
                .join("\n");
                (input.topic.clone(), content)
            }
            None => {
                let content = [
                    format!("# {prefixed_title}"),
                    String::new(),
                    "## The conclusion first".to_string(),
                    "When unsure, looking at capacity, output and weight is enough.".to_string(),
                    String::new(),
                    "## An order that avoids regret".to_string(),
                    "1) Decide the one thing you care about most".to_string(),
                    "2) Narrow candidates by that condition".to_string(),
                    "3) Read reviews last".to_string(),
                ]
                .join("\n");
                (prefixed_title, content)
            }
        };
        Ok(article(REWRITE_BASIC_ID, input, title, content))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        QuietRewriteStrategy, QuietSpreadStrategy, RewriteBasicStrategy, SeoBasicStrategy,
        CONCLUSION_PREFIX,
    };
    use crate::model::article::GenerateInput;
    use crate::registry::capability::Strategy;

    fn input(draft: Option<&str>) -> GenerateInput {
        GenerateInput {
            topic: "Choosing a power bank".to_string(),
            source_id: "keywords".to_string(),
            channel_id: "discover".to_string(),
            draft: draft.map(str::to_string),
            product: None,
            now_iso: "2024-02-10T08:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn quiet_spread_titles_and_echoes_ids() {
        let article = QuietSpreadStrategy
            .generate(&input(None))
            .expect("template strategy never fails");
        assert_eq!(article.title, "Quiet spread: Choosing a power bank");
        assert!(article.content.starts_with("# Quiet spread: Choosing a power bank"));
        assert_eq!(article.content.matches("\n## ").count(), 3);
        assert_eq!(article.ids.strategy_id, "quiet-spread");
        assert_eq!(article.ids.source_id, "keywords");
        assert_eq!(article.created_at, "2024-02-10T08:00:00.000Z");
    }

    #[test]
    fn quiet_rewrite_caps_draft_excerpt() {
        let draft = "x".repeat(900);
        let article = QuietRewriteStrategy
            .generate(&input(Some(&draft)))
            .expect("template strategy never fails");
        assert!(article.content.contains(&"x".repeat(500)));
        assert!(!article.content.contains(&"x".repeat(501)));

        let without = QuietRewriteStrategy
            .generate(&input(None))
            .expect("template strategy never fails");
        assert!(without.content.contains("(no draft available)"));
    }

    #[test]
    fn seo_basic_prefixes_title_and_switches_on_draft() {
        let short = SeoBasicStrategy
            .generate(&input(None))
            .expect("template strategy never fails");
        assert_eq!(short.title, format!("{CONCLUSION_PREFIX} Choosing a power bank"));
        assert!(!short.content.contains("Original draft"));

        let long = SeoBasicStrategy
            .generate(&input(Some("my notes")))
            .expect("template strategy never fails");
        assert!(long.content.contains("my notes"));
    }

    #[test]
    fn rewrite_basic_drops_prefix_only_with_draft() {
        let with_draft = RewriteBasicStrategy
            .generate(&input(Some("draft body")))
            .expect("template strategy never fails");
        assert_eq!(with_draft.title, "Choosing a power bank");
        assert!(with_draft.content.contains("draft body"));

        let blank_draft = RewriteBasicStrategy
            .generate(&input(Some("  ")))
            .expect("template strategy never fails");
        assert!(blank_draft.title.starts_with(CONCLUSION_PREFIX));
    }
}
