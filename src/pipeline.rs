//! Extraction entry point
//!
//! transcript → prompt → providers (ordered fallback) → validation →
//! daemon. When the daemon is down the learnings are handed back for the
//! caller to dump on stdout, so nothing extracted is lost.

use anyhow::Result;
use tracing::{info, warn};

use crate::extraction::{
    build_prompt, extract_with_fallback, validate_candidates, ExtractionProvider, Learning,
    ValidationPolicy,
};
use crate::ingest::{ingest_learnings, IngestReport, LearningStore};
use crate::transcript::TranscriptSession;

/// How an extraction run ended
#[derive(Debug)]
pub enum ExtractOutcome {
    /// The model found nothing worth keeping
    NothingExtracted,
    /// `--dry-run`: learnings were not submitted
    DryRun(Vec<Learning>),
    /// The daemon was unreachable; these learnings still need a home
    Degraded(Vec<Learning>),
    Ingested(IngestReport),
}

/// Extract learnings from one transcript and submit them
pub async fn run_extraction(
    session: &TranscriptSession,
    providers: &[Box<dyn ExtractionProvider>],
    store: &dyn LearningStore,
    policy: ValidationPolicy,
    dry_run: bool,
) -> Result<ExtractOutcome> {
    info!(
        "Extracting learnings from {} ({} chars)...",
        session.file_name(),
        session.raw.chars().count()
    );

    let prompt = build_prompt(&session.bounded);
    let extraction = extract_with_fallback(providers, &prompt).await?;
    let learnings = validate_candidates(extraction.candidates, policy);

    if learnings.is_empty() {
        info!("No learnings extracted from this session.");
        return Ok(ExtractOutcome::NothingExtracted);
    }

    if dry_run {
        return Ok(ExtractOutcome::DryRun(learnings));
    }

    info!("Extracted {} learnings with {}, storing...", learnings.len(), extraction.provider);

    if let Err(e) = store.health().await {
        warn!("Memory daemon not available at {}: {}", store.url(), e);
        return Ok(ExtractOutcome::Degraded(learnings));
    }

    let report = ingest_learnings(store, learnings, &session.session_id).await;
    Ok(ExtractOutcome::Ingested(report))
}
