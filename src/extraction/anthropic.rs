//! Anthropic Messages API provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use super::parse::parse_fenced_array;
use super::provider::ExtractionProvider;
use crate::config::{Config, API_KEY_ENV};
use crate::error::ProviderError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

pub struct AnthropicProvider {
    api_key: Option<String>,
    url: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_key: config.anthropic_api_key.clone(),
            url: config.anthropic_url.clone(),
            model: config.anthropic_model.clone(),
            max_tokens: config.max_tokens,
            timeout: config.timeouts.anthropic(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ExtractionProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn extract(&self, prompt: &str) -> Result<Vec<Value>, ProviderError> {
        // No credential, no request
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredential(API_KEY_ENV))?;

        info!("Extracting with Anthropic model {}", self.model);

        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let raw = response.text().await?;
        let text = response_text(&raw)?;
        debug!("Anthropic response: {} chars", text.len());

        Ok(parse_fenced_array(&text)?)
    }
}

/// Text of the first text block in a Messages API response body
fn response_text(body: &str) -> Result<String, ProviderError> {
    let response: MessagesResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::ResponseShape(e.to_string()))?;

    response
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .ok_or_else(|| ProviderError::ResponseShape("no text content block".to_string()))
}
