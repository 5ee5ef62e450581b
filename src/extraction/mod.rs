//! Learning extraction
//!
//! Turns a bounded transcript into candidate learnings:
//! prompt building, LLM providers with ordered fallback, response parsing
//! and validation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub mod anthropic;
pub mod ollama;
pub mod parse;
pub mod prompt;
pub mod provider;
pub mod validate;

pub use anthropic::AnthropicProvider;
pub use ollama::OllamaProvider;
pub use prompt::build_prompt;
pub use provider::{default_providers, extract_with_fallback, ExtractionProvider};
pub use validate::{validate_candidate, validate_candidates, ValidationPolicy};

/// The fixed extraction taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LearningType {
    WorkingSolution,
    Gotcha,
    Pattern,
    Decision,
    Failure,
    Preference,
}

impl LearningType {
    pub const ALL: [LearningType; 6] = [
        LearningType::WorkingSolution,
        LearningType::Gotcha,
        LearningType::Pattern,
        LearningType::Decision,
        LearningType::Failure,
        LearningType::Preference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LearningType::WorkingSolution => "WORKING_SOLUTION",
            LearningType::Gotcha => "GOTCHA",
            LearningType::Pattern => "PATTERN",
            LearningType::Decision => "DECISION",
            LearningType::Failure => "FAILURE",
            LearningType::Preference => "PREFERENCE",
        }
    }

    /// What the model should look for, as shown in the prompt
    pub fn description(&self) -> &'static str {
        match self {
            LearningType::WorkingSolution => {
                "Commands, code patterns, or approaches that WORKED after trial and error"
            }
            LearningType::Gotcha => {
                "Counterintuitive behaviors, traps, or \"watch out for this\" knowledge"
            }
            LearningType::Pattern => "Recurring architectural decisions or workflows",
            LearningType::Decision => "Explicit design choices and their reasoning",
            LearningType::Failure => {
                "Things that looked promising but didn't work, and WHY"
            }
            LearningType::Preference => {
                "User's stated preferences for how they want things done"
            }
        }
    }
}

impl fmt::Display for LearningType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LearningType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LearningType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown learning type: {}", s))
    }
}

/// Evidence strength implied by a confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    /// 0.95 and above
    Confirmed,
    /// 0.85 to 0.94
    Strong,
    /// 0.70 to 0.84
    Inferred,
}

impl ConfidenceBand {
    pub fn from_score(score: f64) -> Option<Self> {
        if score >= 0.95 {
            Some(ConfidenceBand::Confirmed)
        } else if score >= 0.85 {
            Some(ConfidenceBand::Strong)
        } else if score >= 0.70 {
            Some(ConfidenceBand::Inferred)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceBand::Confirmed => "confirmed",
            ConfidenceBand::Strong => "strong",
            ConfidenceBand::Inferred => "inferred",
        }
    }
}

/// A validated learning, in transit between the model and the memory daemon
///
/// `kind` is kept as the raw string so permissive validation can forward
/// values outside the taxonomy. Fields other than `type`, `content` and
/// `session_source` (normally `context` and `confidence`) are carried in
/// `extra` exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Learning {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_source: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Learning {
    #[cfg(test)]
    pub fn new(kind: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            content: content.into(),
            session_source: None,
            extra: Map::new(),
        }
    }

    pub fn context(&self) -> Option<&str> {
        self.extra.get("context").and_then(Value::as_str)
    }

    pub fn confidence(&self) -> Option<f64> {
        self.extra.get("confidence").and_then(Value::as_f64)
    }

    pub fn band(&self) -> Option<ConfidenceBand> {
        self.confidence().and_then(ConfidenceBand::from_score)
    }
}

/// First `max` characters of `text`, with an ellipsis when cut
pub fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
