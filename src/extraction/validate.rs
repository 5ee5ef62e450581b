//! Candidate validation
//!
//! The permissive policy only checks that `type` and `content` are present
//! and non-empty, leaving the memory daemon as the gatekeeper for everything
//! else. The strict policy also enforces the taxonomy and confidence range.

use serde_json::Value;
use tracing::debug;

use super::{Learning, LearningType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationPolicy {
    #[default]
    Permissive,
    Strict,
}

impl ValidationPolicy {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            ValidationPolicy::Strict
        } else {
            ValidationPolicy::Permissive
        }
    }
}

/// Turn one decoded candidate into a `Learning`, or explain why it was rejected
pub fn validate_candidate(candidate: Value, policy: ValidationPolicy) -> Result<Learning, String> {
    let Value::Object(mut fields) = candidate else {
        return Err("candidate is not a JSON object".to_string());
    };

    let kind = take_non_empty(&mut fields, "type")?;
    let content = take_non_empty(&mut fields, "content")?;

    if policy == ValidationPolicy::Strict {
        if kind.parse::<LearningType>().is_err() {
            return Err(format!("unknown type {}", kind));
        }
        if let Some(confidence) = fields.get("confidence") {
            match confidence.as_f64() {
                Some(c) if (0.0..=1.0).contains(&c) => {}
                _ => return Err(format!("confidence out of range: {}", confidence)),
            }
        }
    }

    // Non-string session ids are dropped, never forwarded in extra
    let session_source = match fields.remove("session_source") {
        Some(Value::String(s)) => Some(s),
        _ => None,
    };

    Ok(Learning {
        kind,
        content,
        session_source,
        extra: fields,
    })
}

/// Keep only the candidates that pass validation
pub fn validate_candidates(candidates: Vec<Value>, policy: ValidationPolicy) -> Vec<Learning> {
    let total = candidates.len();
    let learnings: Vec<Learning> = candidates
        .into_iter()
        .filter_map(|candidate| match validate_candidate(candidate, policy) {
            Ok(learning) => Some(learning),
            Err(reason) => {
                debug!("Skipping candidate: {}", reason);
                None
            }
        })
        .collect();

    if learnings.len() < total {
        debug!("{} of {} candidates failed validation", total - learnings.len(), total);
    }
    learnings
}

fn take_non_empty(
    fields: &mut serde_json::Map<String, Value>,
    key: &str,
) -> Result<String, String> {
    match fields.remove(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s),
        Some(Value::String(_)) => Err(format!("empty {}", key)),
        Some(other) => Err(format!("{} is not a string: {}", key, other)),
        None => Err(format!("missing {}", key)),
    }
}
