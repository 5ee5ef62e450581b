//! Error types for the extraction and ingestion pipeline
//!
//! Provider and parse errors never escape the fallback chain: they mark a
//! provider as unavailable. Ingest errors are per-item unless raised by the
//! health probe. Only `PipelineError` terminates the process.

use std::path::PathBuf;

/// Failure to recover a JSON array from model output.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// No `[` ... `]` span in the text.
    #[error("no JSON array found in response")]
    NoArray,

    #[error("invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Reasons an extraction provider is unavailable.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{0} is not set")]
    MissingCredential(&'static str),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("unexpected response shape: {0}")]
    ResponseShape(String),

    #[error("no models installed")]
    NoModels,

    #[error("could not parse learnings: {0}")]
    Parse(#[from] ParseError),
}

/// Failures talking to the memory daemon.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("daemon returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("undecodable daemon reply: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Process-terminating conditions.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("File not found: {}", .0.display())]
    TranscriptNotFound(PathBuf),

    #[error("File not found: {}", .0.display())]
    ImportFileNotFound(PathBuf),

    #[error("No LLM available for extraction. Set ANTHROPIC_API_KEY or install Ollama.")]
    NoProviderAvailable,

    #[error("Cannot connect to memory daemon at {0}. Start the daemon and retry the import.")]
    CollaboratorUnavailable(String),
}
