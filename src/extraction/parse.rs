//! Recovery of a JSON array from model output
//!
//! Models wrap their answer in markdown fences or surround it with prose.
//! These functions are pure so they can be tested without a network.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::error::ParseError;

/// Opening fence with optional `json` tag, body, then closing fence or end of text
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A```(?:json|JSON)?[ \t]*\r?\n?(.*?)(?:```|\z)").unwrap()
});

/// Strip a surrounding markdown code fence, if present
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match CODE_FENCE.captures(trimmed).and_then(|caps| caps.get(1)) {
        Some(body) => body.as_str().trim(),
        None => trimmed,
    }
}

/// Slice from the first `[` to the last `]`
pub fn extract_json_array(text: &str) -> Result<&str, ParseError> {
    let start = text.find('[').ok_or(ParseError::NoArray)?;
    let end = text.rfind(']').ok_or(ParseError::NoArray)?;
    if end < start {
        return Err(ParseError::NoArray);
    }
    Ok(&text[start..=end])
}

/// Decode a JSON array of candidate learnings
pub fn decode_candidates(text: &str) -> Result<Vec<Value>, ParseError> {
    Ok(serde_json::from_str(text)?)
}

/// Parse output that may be wrapped in a code fence
pub fn parse_fenced_array(text: &str) -> Result<Vec<Value>, ParseError> {
    decode_candidates(strip_code_fence(text))
}

/// Parse output that may have prose around the array
pub fn parse_embedded_array(text: &str) -> Result<Vec<Value>, ParseError> {
    decode_candidates(extract_json_array(text)?)
}
