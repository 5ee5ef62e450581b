//! Extraction prompt

use std::fmt::Write;
use std::sync::LazyLock;

use super::LearningType;

const RULES: &str = r#"## Rules

1. Be specific - include actual commands, file paths, error messages
2. Prefer solutions over problems - only extract FAILURE if no solution was found
3. Confidence: 0.95+ = confirmed working, 0.85-0.94 = strong evidence, 0.70-0.84 = reasonable inference
4. Skip generic programming knowledge Claude already knows
5. Focus on user-specific infrastructure, preferences, and workflows

## Output Format

Output ONLY valid JSON array, no other text:

[
  {"type": "WORKING_SOLUTION", "content": "specific solution here", "context": "what it solves", "confidence": 0.95},
  {"type": "GOTCHA", "content": "specific gotcha here", "context": "when this applies", "confidence": 0.90}
]

If no learnings are worth extracting, output: []

## Transcript

"#;

static INSTRUCTIONS: LazyLock<String> = LazyLock::new(|| {
    let mut text = String::from(
        "Analyze this Claude Code session transcript and extract learnings that should be \
         remembered for future sessions.\n\n## What to Extract\n\n",
    );
    for (i, kind) in LearningType::ALL.iter().enumerate() {
        let _ = writeln!(text, "{}. **{}** - {}", i + 1, kind, kind.description());
    }
    text.push('\n');
    text.push_str(RULES);
    text
});

/// Full prompt for one transcript
pub fn build_prompt(transcript: &str) -> String {
    let mut prompt = String::with_capacity(INSTRUCTIONS.len() + transcript.len());
    prompt.push_str(&INSTRUCTIONS);
    prompt.push_str(transcript);
    prompt
}
