//! Recovery of structured payloads from free-form model output.
//!
//! Model replies are expected to carry exactly one fenced JSON block; the
//! prompts are written to elicit that shape. Fence detection is purely
//! lexical and the first occurrence wins — nested or repeated fences past
//! the first pair are not treated specially.

use serde::de::DeserializeOwned;
use thiserror::Error;

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no payload found in response")]
    Empty,

    #[error("payload is not the expected JSON shape: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Locate the payload within a model reply: a `json`-tagged fence is
/// preferred, any fence otherwise, the whole text as a fallback. A missing
/// closing fence means the payload runs to the end of the text.
fn fenced_payload(raw: &str) -> &str {
    let body = if let Some(start) = raw.find(JSON_FENCE) {
        &raw[start + JSON_FENCE.len()..]
    } else if let Some(start) = raw.find(FENCE) {
        &raw[start + FENCE.len()..]
    } else {
        return raw;
    };

    match body.find(FENCE) {
        Some(end) => &body[..end],
        None => body,
    }
}

/// Extract and parse the JSON payload embedded in a model reply.
///
/// Callers never propagate the error past a stage boundary; they substitute
/// the stage's documented empty value instead.
pub fn extract_as<T: DeserializeOwned>(raw: &str) -> Result<T, ExtractionError> {
    let payload = fenced_payload(raw.trim()).trim();
    if payload.is_empty() {
        return Err(ExtractionError::Empty);
    }
    Ok(serde_json::from_str(payload)?)
}

/// Strip a single code fence from a model reply, leaving the code body.
///
/// A fence tagged with the given language is preferred, a generic fence
/// otherwise. With no fence at all the trimmed reply is returned unchanged.
pub fn strip_code_fence<'a>(raw: &'a str, language: &str) -> &'a str {
    let trimmed = raw.trim();
    let tagged = format!("{}{}", FENCE, language);

    let body = if let Some(start) = trimmed.find(&tagged) {
        &trimmed[start + tagged.len()..]
    } else if let Some(start) = trimmed.find(FENCE) {
        &trimmed[start + FENCE.len()..]
    } else {
        return trimmed;
    };

    let body = match body.find(FENCE) {
        Some(end) => &body[..end],
        None => body,
    };
    body.trim()
}
