//! Capability contracts: strategy (how to write), source (what material),
//! channel (how to present).

use crate::model::article::{GenerateInput, GeneratedArticle, SourceContext, SourcePayload};
use crate::provider::error::GenerationError;

/// Kind tag used in diagnostics and warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    Strategy,
    Source,
    Channel,
}

impl CapabilityKind {
    /// Stable lowercase name, e.g. `strategy`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strategy => "strategy",
            Self::Source => "source",
            Self::Channel => "channel",
        }
    }

    /// Resolver input field name, e.g. `strategyId`.
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Strategy => "strategyId",
            Self::Source => "sourceId",
            Self::Channel => "channelId",
        }
    }
}

/// Anything registered under a stable id.
pub trait Capability {
    fn id(&self) -> &str;
}

/// Owns "how to write". The only capability allowed to block on I/O.
pub trait Strategy: Capability + Send + Sync {
    fn generate(&self, input: &GenerateInput) -> Result<GeneratedArticle, GenerationError>;
}

/// Owns "what material". Called only when the caller supplied no topic.
pub trait Source: Capability + Send + Sync {
    fn prepare(&self, context: &SourceContext) -> SourcePayload;
}

/// Owns "how to present". Pure transform applied after generation.
///
/// Implementations reshape `title`/`content` only; the pipeline re-asserts
/// `ids` and `topic` afterwards.
pub trait Channel: Capability + Send + Sync {
    fn optimize(&self, article: GeneratedArticle) -> GeneratedArticle;
}
