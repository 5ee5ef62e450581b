//! Transcript loading and truncation
//!
//! Long transcripts keep their head (problem setup) and tail (resolution)
//! so the prompt stays bounded no matter how long the session ran.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::PipelineError;

/// Separator inserted between the kept head and tail segments
pub const TRUNCATION_MARKER: &str = "\n\n[... transcript truncated ...]\n\n";

/// A transcript loaded for a single extraction run
#[derive(Debug)]
pub struct TranscriptSession {
    pub path: PathBuf,
    pub session_id: String,
    pub raw: String,
    pub bounded: String,
}

impl TranscriptSession {
    /// Read a transcript from disk and bound it to `max_chars` characters
    pub fn load(path: &Path, max_chars: usize) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::TranscriptNotFound(path.to_path_buf()).into());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read transcript {}", path.display()))?;

        Ok(Self::from_text(path, raw, max_chars))
    }

    pub fn from_text(path: &Path, raw: String, max_chars: usize) -> Self {
        let bounded = truncate(&raw, max_chars);
        if bounded != raw {
            info!("Transcript truncated to {} characters plus marker", max_chars);
        }

        Self {
            path: path.to_path_buf(),
            session_id: session_id_for(path),
            raw,
            bounded,
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Session id is the name of the directory holding the transcript
pub fn session_id_for(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Keep the first and last `max_chars / 2` characters of over-long text
pub fn truncate(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }

    let half = max_chars / 2;
    let head_end = byte_offset(text, half);
    let tail_start = byte_offset(text, total - half);

    let capacity = head_end + TRUNCATION_MARKER.len() + text.len() - tail_start;
    let mut out = String::with_capacity(capacity);
    out.push_str(&text[..head_end]);
    out.push_str(TRUNCATION_MARKER);
    out.push_str(&text[tail_start..]);
    out
}

/// Byte offset of the `n`th character
fn byte_offset(text: &str, n: usize) -> usize {
    text.char_indices()
        .nth(n)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_unchanged() {
        let text = "short transcript";
        assert_eq!(truncate(text, 100_000), text);

        let exact = "x".repeat(100_000);
        assert_eq!(truncate(&exact, 100_000), exact);
    }

    #[test]
    fn test_long_text_keeps_head_and_tail() {
        let text = format!("{}{}{}", "a".repeat(60_000), "m".repeat(10_000), "z".repeat(60_000));
        let out = truncate(&text, 100_000);

        let expected = format!("{}{}{}", "a".repeat(50_000), TRUNCATION_MARKER, "z".repeat(50_000));
        assert_eq!(out, expected);
    }

    #[test]
    fn test_truncated_size_independent_of_input() {
        let a = truncate(&"q".repeat(100_001), 100_000);
        let b = truncate(&"q".repeat(3_000_000), 100_000);
        assert_eq!(a.len(), b.len());
        assert_eq!(a.chars().count(), 100_000 + TRUNCATION_MARKER.chars().count());
    }

    #[test]
    fn test_truncate_counts_characters() {
        let text = "é".repeat(11);
        let out = truncate(&text, 10);
        assert_eq!(out, format!("{}{}{}", "é".repeat(5), TRUNCATION_MARKER, "é".repeat(5)));
    }

    #[test]
    fn test_session_id_from_parent_dir() {
        assert_eq!(session_id_for(Path::new("/logs/abc-123/transcript.md")), "abc-123");
        assert_eq!(session_id_for(Path::new("transcript.md")), "unknown");
    }

    #[test]
    fn test_load_missing_file() {
        let err = TranscriptSession::load(Path::new("/nonexistent/session/t.md"), 100).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::TranscriptNotFound(_))
        ));
    }

    #[test]
    fn test_load_reads_and_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let session_dir = dir.path().join("session-42");
        std::fs::create_dir(&session_dir).unwrap();
        let path = session_dir.join("transcript.md");
        std::fs::write(&path, "0123456789abcdef").unwrap();

        let session = TranscriptSession::load(&path, 10).unwrap();
        assert_eq!(session.session_id, "session-42");
        assert_eq!(session.raw, "0123456789abcdef");
        assert_eq!(session.bounded, format!("01234{}bcdef", TRUNCATION_MARKER));
        assert_eq!(session.file_name(), "transcript.md");
    }
}
