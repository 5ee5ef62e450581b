//! Bulk import of learnings from a JSONL file
//!
//! Every line is handled independently: a bad line is recorded and the
//! import moves on. Unlike extraction there is nowhere safe to put a
//! partial import, so an unreachable daemon aborts before anything is sent.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

use super::{format_similarity, LearningStore, StoreOutcome, StoreStats};
use crate::error::PipelineError;
use crate::extraction::{preview, validate_candidate, ValidationPolicy};

/// A line that could not be imported
#[derive(Debug, Clone, PartialEq)]
pub struct LineError {
    /// 1-based line number
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub duplicates: usize,
    pub errors: Vec<LineError>,
    pub stats: Option<StoreStats>,
}

impl ImportReport {
    fn error(&mut self, line: usize, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("  ✗ Line {}: {}", line, reason);
        self.errors.push(LineError { line, reason });
    }

    /// Operator summary, written to stderr
    pub fn print_summary(&self) {
        eprintln!();
        eprintln!("{}", "=".repeat(50));
        eprintln!("Imported: {}", self.imported);
        eprintln!("Duplicates skipped: {}", self.duplicates);
        eprintln!("Errors: {}", self.errors.len());
        for error in &self.errors {
            eprintln!("  line {}: {}", error.line, error.reason);
        }

        if let Some(stats) = &self.stats {
            eprintln!();
            eprintln!("Total learnings in database: {}", stats.total_learnings);
            eprintln!("By type:");
            for (kind, count) in &stats.by_type {
                eprintln!("  {}: {}", kind, count);
            }
        }
    }
}

/// Import every valid line of `path` into the daemon
pub async fn import_learnings(
    store: &dyn LearningStore,
    path: &Path,
    policy: ValidationPolicy,
) -> Result<ImportReport> {
    if !path.exists() {
        return Err(PipelineError::ImportFileNotFound(path.to_path_buf()).into());
    }

    if let Err(e) = store.health().await {
        warn!("Health check failed: {}", e);
        return Err(PipelineError::CollaboratorUnavailable(store.url().to_string()).into());
    }

    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    info!("Importing learnings from {}", path.display());

    let mut report = ImportReport::default();

    for (idx, raw_line) in bytes.split(|b| *b == b'\n').enumerate() {
        let line_num = idx + 1;

        let line = match std::str::from_utf8(raw_line) {
            Ok(line) => line.trim(),
            Err(e) => {
                report.error(line_num, format!("Invalid UTF-8 - {}", e));
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                report.error(line_num, format!("Invalid JSON - {}", e));
                continue;
            }
        };

        let learning = match validate_candidate(value, policy) {
            Ok(learning) => learning,
            Err(reason) => {
                report.error(line_num, format!("Invalid learning - {}", reason));
                continue;
            }
        };

        match store.store(&learning).await {
            Ok(StoreOutcome::Stored) => {
                report.imported += 1;
                info!("  ✓ {}: {}", learning.kind, preview(&learning.content, 60));
            }
            Ok(StoreOutcome::Duplicate { similarity }) => {
                report.duplicates += 1;
                info!(
                    "  ○ Duplicate (sim={}): {}",
                    format_similarity(similarity),
                    preview(&learning.content, 40)
                );
            }
            Ok(StoreOutcome::Rejected(body)) => {
                report.error(line_num, body.to_string());
            }
            Err(e) => {
                report.error(line_num, format!("Request failed - {}", e));
            }
        }
    }

    match store.stats().await {
        Ok(stats) => report.stats = Some(stats),
        Err(e) => warn!("Could not fetch daemon stats: {}", e),
    }

    Ok(report)
}
