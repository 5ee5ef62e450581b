//! Ingestion into the memory daemon
//!
//! The daemon owns all durable state and performs deduplication. This
//! module only submits learnings one at a time and classifies the replies.
//!
//! Protocol (HTTP, JSON bodies):
//! - `GET /health`: 200 when healthy
//! - `POST /store`: `{"status": "stored"}` or `{"status": "duplicate", "similarity": 0.93}`
//! - `GET /stats`: `{"total_learnings": 12, "by_type": {"GOTCHA": 4}}`

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::IngestError;
use crate::extraction::{preview, Learning};

pub mod import;

pub use import::import_learnings;

/// How the daemon classified one submission
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOutcome {
    Stored,
    Duplicate { similarity: Option<f64> },
    /// Any other reply, kept whole for the log
    Rejected(Value),
}

impl StoreOutcome {
    pub fn from_response(body: Value) -> Self {
        match body.get("status").and_then(Value::as_str) {
            Some("stored") => StoreOutcome::Stored,
            Some("duplicate") => StoreOutcome::Duplicate {
                similarity: body.get("similarity").and_then(Value::as_f64),
            },
            _ => StoreOutcome::Rejected(body),
        }
    }
}

/// Aggregate statistics reported by the daemon
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreStats {
    #[serde(default)]
    pub total_learnings: u64,
    #[serde(default)]
    pub by_type: BTreeMap<String, u64>,
}

/// The persistence collaborator
#[async_trait]
pub trait LearningStore: Send + Sync {
    /// Base URL, for operator messages
    fn url(&self) -> &str;

    async fn health(&self) -> Result<(), IngestError>;

    async fn store(&self, learning: &Learning) -> Result<StoreOutcome, IngestError>;

    async fn stats(&self) -> Result<StoreStats, IngestError>;
}

/// HTTP client for the memory daemon
pub struct DaemonClient {
    base_url: String,
    health_timeout: Duration,
    store_timeout: Duration,
    stats_timeout: Duration,
    client: reqwest::Client,
}

impl DaemonClient {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.daemon_url.clone(),
            health_timeout: config.timeouts.health(),
            store_timeout: config.timeouts.store(),
            stats_timeout: config.timeouts.stats(),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl LearningStore for DaemonClient {
    fn url(&self) -> &str {
        &self.base_url
    }

    async fn health(&self) -> Result<(), IngestError> {
        let response = self
            .client
            .get(self.endpoint("/health"))
            .timeout(self.health_timeout)
            .send()
            .await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(IngestError::Status(response.status()));
        }
        Ok(())
    }

    async fn store(&self, learning: &Learning) -> Result<StoreOutcome, IngestError> {
        // The reply body decides the outcome, whatever the HTTP status
        let text = self
            .client
            .post(self.endpoint("/store"))
            .timeout(self.store_timeout)
            .json(learning)
            .send()
            .await?
            .text()
            .await?;

        let body: Value = serde_json::from_str(&text)?;
        Ok(StoreOutcome::from_response(body))
    }

    async fn stats(&self) -> Result<StoreStats, IngestError> {
        let response = self
            .client
            .get(self.endpoint("/stats"))
            .timeout(self.stats_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IngestError::Status(response.status()));
        }
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Counts from one ingestion pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub stored: usize,
    pub duplicates: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stored {}/{} learnings", self.stored, self.total)
    }
}

/// Submit each learning once, tagged with its session
///
/// Failures are counted and logged; they never stop the batch.
pub async fn ingest_learnings(
    store: &dyn LearningStore,
    learnings: Vec<Learning>,
    session_id: &str,
) -> IngestReport {
    let mut report = IngestReport {
        total: learnings.len(),
        ..IngestReport::default()
    };

    for mut learning in learnings {
        learning.extra.remove("session_source");
        learning.session_source = Some(session_id.to_string());

        match store.store(&learning).await {
            Ok(StoreOutcome::Stored) => {
                report.stored += 1;
                let band = learning
                    .band()
                    .map(|b| format!(" [{}]", b.as_str()))
                    .unwrap_or_default();
                info!("  ✓ {}{}: {}", learning.kind, band, preview(&learning.content, 60));
                if let Some(context) = learning.context() {
                    debug!("    context: {}", context);
                }
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
                report.failed += 1;
                warn!("  ✗ Daemon rejected learning: {}", body);
            }
            Err(e) => {
                report.failed += 1;
                warn!("  ✗ Failed to store: {}", e);
            }
        }
    }

    report
}

pub(crate) fn format_similarity(similarity: Option<f64>) -> String {
    similarity
        .map(|s| format!("{:.2}", s))
        .unwrap_or_else(|| "?".to_string())
}
