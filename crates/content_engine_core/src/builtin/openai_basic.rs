//! Provider-backed strategy: asks the text provider for a JSON article.
//!
//! # Invariants
//! - The provider is called exactly once per `generate`; no retries.
//! - A blank `topic` in the model output falls back to the input topic.
//! - Blank `title`/`content` are rejected as `InvalidOutput`.

use crate::model::article::{ArticleIds, GenerateInput, GeneratedArticle};
use crate::provider::error::GenerationError;
use crate::provider::openai::{generate_json, TextProvider, TextRequest};
use crate::registry::capability::{Capability, Strategy};
use serde::Deserialize;
use std::sync::Arc;

pub const OPENAI_BASIC_ID: &str = "openai-basic";

const INSTRUCTIONS: &str = "You are a helpful writing assistant.";

#[derive(Debug, Deserialize)]
struct ModelOutput {
    #[serde(default)]
    topic: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

/// Strategy that delegates writing to a `TextProvider`.
#[derive(Clone)]
pub struct OpenAiBasicStrategy {
    provider: Arc<dyn TextProvider>,
}

impl OpenAiBasicStrategy {
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self { provider }
    }
}

impl std::fmt::Debug for OpenAiBasicStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBasicStrategy").finish_non_exhaustive()
    }
}

impl Capability for OpenAiBasicStrategy {
    fn id(&self) -> &str {
        OPENAI_BASIC_ID
    }
}

impl Strategy for OpenAiBasicStrategy {
    fn generate(&self, input: &GenerateInput) -> Result<GeneratedArticle, GenerationError> {
        let request = TextRequest {
            instructions: INSTRUCTIONS.to_string(),
            input: build_prompt(input),
        };
        let output: ModelOutput = generate_json(self.provider.as_ref(), &request)?;

        if output.title.trim().is_empty() {
            return Err(GenerationError::InvalidOutput(
                "model output has no title".to_string(),
            ));
        }
        if output.content.trim().is_empty() {
            return Err(GenerationError::InvalidOutput(
                "model output has no content".to_string(),
            ));
        }

        let topic = if output.topic.trim().is_empty() {
            input.topic.clone()
        } else {
            output.topic
        };

        Ok(GeneratedArticle {
            topic,
            title: output.title,
            content: output.content,
            ids: ArticleIds {
                strategy_id: OPENAI_BASIC_ID.to_string(),
                source_id: input.source_id.clone(),
                channel_id: input.channel_id.clone(),
            },
            created_at: input.now_iso.clone(),
        })
    }
}

/// Prompt body sent as the request `input`.
pub fn build_prompt(input: &GenerateInput) -> String {
    let draft = input.non_blank_draft().unwrap_or("(none)");
    format!(
        "You write articles. Return JSON only, following these rules.\n\
         \n\
         # Required JSON shape\n\
         {{\n  \"topic\": \"string\",\n  \"title\": \"string\",\n  \"content\": \"string (Markdown)\"\n}}\n\
         \n\
         # Rules\n\
         - content is Markdown with readable headings\n\
         - avoid exaggeration and hard assertions; favour concrete, kind wording\n\
         - when a draft is given, build on it without quoting too much\n\
         - output must be valid JSON with no extra text\n\
         \n\
         # Input\n\
         topic: {topic}\n\
         draft: {draft}\n\
         channelId: {channel}\n\
         sourceId: {source}",
        topic = input.topic,
        channel = input.channel_id,
        source = input.source_id,
    )
}
