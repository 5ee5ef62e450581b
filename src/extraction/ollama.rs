//! Local Ollama provider
//!
//! Picks an installed model by preference, then asks it for the learnings.
//! Local models often add prose around the JSON, so the answer is
//! bracket-scanned rather than decoded directly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::info;

use super::parse::parse_embedded_array;
use super::provider::ExtractionProvider;
use crate::config::Config;
use crate::error::ProviderError;

/// Models known to follow the extraction instructions, best first
pub const PREFERRED_MODELS: [&str; 5] =
    ["llama3", "mistral", "mixtral", "codellama", "deepseek-coder"];

const TEMPERATURE: f32 = 0.3;

/// Response from `/api/tags`
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<InstalledModel>,
}

#[derive(Debug, Deserialize)]
struct InstalledModel {
    name: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

pub struct OllamaProvider {
    base_url: String,
    max_tokens: u32,
    tags_timeout: Duration,
    generate_timeout: Duration,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.ollama_url.clone(),
            max_tokens: config.max_tokens,
            tags_timeout: config.timeouts.ollama_tags(),
            generate_timeout: config.timeouts.ollama_generate(),
            client: reqwest::Client::new(),
        }
    }

    /// Names of the installed models, as reported by `/api/tags`
    async fn installed_models(&self) -> Result<Vec<String>, ProviderError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(self.tags_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl ExtractionProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn extract(&self, prompt: &str) -> Result<Vec<Value>, ProviderError> {
        let installed = self.installed_models().await?;
        let model = select_model(&installed).ok_or(ProviderError::NoModels)?;

        info!("Using Ollama model: {}", model);

        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: TEMPERATURE,
                num_predict: self.max_tokens,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(self.generate_timeout)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ResponseShape(e.to_string()))?;

        Ok(parse_embedded_array(generated.response.trim())?)
    }
}

/// Choose a model from the installed list
///
/// Matching ignores the `:tag` suffix; the returned name keeps it so the
/// generate request addresses the exact installed model.
pub fn select_model(installed: &[String]) -> Option<&str> {
    PREFERRED_MODELS
        .iter()
        .find_map(|preferred| {
            installed
                .iter()
                .find(|name| base_name(name.as_str()) == *preferred)
        })
        .or_else(|| installed.first())
        .map(String::as_str)
}

fn base_name(model: &str) -> &str {
    model.split(':').next().unwrap_or(model)
}
