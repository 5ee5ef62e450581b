//! Extraction providers and the ordered fallback chain

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use super::{AnthropicProvider, OllamaProvider};
use crate::config::Config;
use crate::error::{PipelineError, ProviderError};

/// An LLM backend that turns a prompt into candidate learnings
///
/// Any error means the provider is unavailable for this run; the chain
/// moves on to the next one.
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(&self, prompt: &str) -> Result<Vec<Value>, ProviderError>;
}

/// Candidates produced by the first provider that succeeded
#[derive(Debug)]
pub struct Extraction {
    pub provider: &'static str,
    pub candidates: Vec<Value>,
}

/// Providers in fallback order: Anthropic, then local Ollama
pub fn default_providers(config: &Config) -> Vec<Box<dyn ExtractionProvider>> {
    vec![
        Box::new(AnthropicProvider::from_config(config)),
        Box::new(OllamaProvider::from_config(config)),
    ]
}

/// Try each provider in order and return the first successful extraction
///
/// An empty candidate list is a success. Only when every provider is
/// unavailable does this fail.
pub async fn extract_with_fallback(
    providers: &[Box<dyn ExtractionProvider>],
    prompt: &str,
) -> Result<Extraction, PipelineError> {
    for provider in providers {
        match provider.extract(prompt).await {
            Ok(candidates) => {
                info!("{} returned {} candidates", provider.name(), candidates.len());
                return Ok(Extraction {
                    provider: provider.name(),
                    candidates,
                });
            }
            Err(e) => {
                warn!("{} unavailable: {}", provider.name(), e);
            }
        }
    }

    Err(PipelineError::NoProviderAvailable)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Provider returning a canned result and counting its calls
    pub(crate) struct StubProvider {
        pub name: &'static str,
        pub response: Option<Vec<Value>>,
        pub calls: Arc<AtomicUsize>,
    }

    impl StubProvider {
        pub(crate) fn available(name: &'static str, response: Vec<Value>) -> Self {
            Self { name, response: Some(response), calls: Arc::new(AtomicUsize::new(0)) }
        }

        pub(crate) fn unavailable(name: &'static str) -> Self {
            Self { name, response: None, calls: Arc::new(AtomicUsize::new(0)) }
        }
    }

    #[async_trait]
    impl ExtractionProvider for StubProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn extract(&self, _prompt: &str) -> Result<Vec<Value>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone().ok_or(ProviderError::NoModels)
        }
    }

    #[tokio::test]
    async fn test_first_available_provider_wins() {
        let first =
            StubProvider::available("first", vec![json!({"type": "GOTCHA", "content": "a"})]);
        let second = StubProvider::available("second", vec![]);
        let second_calls = second.calls.clone();

        let providers: Vec<Box<dyn ExtractionProvider>> = vec![Box::new(first), Box::new(second)];
        let extraction = extract_with_fallback(&providers, "prompt").await.unwrap();

        assert_eq!(extraction.provider, "first");
        assert_eq!(extraction.candidates.len(), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_back_in_order() {
        let first = StubProvider::unavailable("first");
        let first_calls = first.calls.clone();
        let second = StubProvider::available("second", vec![]);

        let providers: Vec<Box<dyn ExtractionProvider>> = vec![Box::new(first), Box::new(second)];
        let extraction = extract_with_fallback(&providers, "prompt").await.unwrap();

        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(extraction.provider, "second");
        // Empty is a successful extraction, not a failure
        assert!(extraction.candidates.is_empty());
    }

    #[tokio::test]
    async fn test_all_unavailable_is_fatal() {
        let providers: Vec<Box<dyn ExtractionProvider>> = vec![
            Box::new(StubProvider::unavailable("first")),
            Box::new(StubProvider::unavailable("second")),
        ];
        let err = extract_with_fallback(&providers, "prompt").await.unwrap_err();
        assert!(matches!(err, PipelineError::NoProviderAvailable));
    }

    #[test]
    fn test_default_order() {
        let providers = default_providers(&Config::default());
        let names: Vec<_> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["anthropic", "ollama"]);
    }
}
