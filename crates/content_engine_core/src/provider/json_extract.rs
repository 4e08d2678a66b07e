//! Best-effort JSON extraction from free-form model text.
//!
//! # Responsibility
//! - Strip markdown code fences around model output.
//! - Cut the first JSON object/array out of surrounding prose.
//!
//! # Invariants
//! - Extraction never fails; parse failures surface in `parse_json_from_text`.
//! - Input without any `{`/`[` is returned trimmed and unchanged otherwise.

use crate::provider::error::GenerationError;
use serde::de::DeserializeOwned;

const FENCE: &str = "```";

/// Removes a wrapping ```` ```lang ... ``` ```` fence when one closes the text.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with(FENCE) {
        return trimmed;
    }

    let lines: Vec<&str> = trimmed.split('\n').collect();
    if lines.len() < 2 {
        return trimmed;
    }

    let last = lines[lines.len() - 1].trim();
    if last != FENCE {
        return trimmed;
    }

    // Fence lines are the first and last lines; slice the body out in place.
    let body_start = lines[0].len() + 1;
    let body_end = trimmed.len() - lines[lines.len() - 1].len();
    if body_end <= body_start {
        return "";
    }
    trimmed[body_start..body_end].trim()
}

/// Returns the span from the first `{`/`[` to the last `}`/`]`.
pub fn extract_first_json(text: &str) -> &str {
    let unfenced = strip_code_fence(text);

    let start = match (unfenced.find('{'), unfenced.find('[')) {
        (Some(brace), Some(bracket)) => brace.min(bracket),
        (Some(brace), None) => brace,
        (None, Some(bracket)) => bracket,
        (None, None) => return unfenced,
    };

    let end = match (unfenced.rfind('}'), unfenced.rfind(']')) {
        (Some(brace), Some(bracket)) => brace.max(bracket),
        (Some(brace), None) => brace,
        (None, Some(bracket)) => bracket,
        (None, None) => return unfenced,
    };

    if end <= start {
        return unfenced;
    }
    unfenced[start..=end].trim()
}

/// Extracts and parses the JSON payload embedded in `text`.
///
/// # Errors
/// - `GenerationError::InvalidJson` when the extracted span does not parse
///   into `T`; the error carries the full model text.
pub fn parse_json_from_text<T: DeserializeOwned>(text: &str) -> Result<T, GenerationError> {
    let candidate = extract_first_json(text);
    serde_json::from_str(candidate).map_err(|err| GenerationError::InvalidJson {
        text: text.to_string(),
        message: err.to_string(),
    })
}
