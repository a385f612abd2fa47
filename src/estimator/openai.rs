//! Chat-completions client

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{EstimatorError, NutritionEstimator};
use crate::config::Config;

/// Estimator backed by an OpenAI-compatible `/v1/chat/completions` endpoint
#[derive(Clone, Debug)]
pub struct OpenAiEstimator {
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
    temperature: f64,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiEstimator {
    /// A missing key is accepted here and reported on the first call
    pub fn new(
        base_url: &str,
        api_key: Option<SecretString>,
        model: impl Into<String>,
        temperature: f64,
        timeout: Duration,
    ) -> Result<Self, EstimatorError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            temperature,
            client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, EstimatorError> {
        Self::new(
            &config.api_base_url,
            config.api_key.clone(),
            config.model.clone(),
            config.temperature,
            config.request_timeout,
        )
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Extract error information from a failed response.
    async fn error_from_response(&self, resp: reqwest::Response) -> EstimatorError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let body_snippet: String = body.chars().take(256).collect();
        EstimatorError::Status {
            status,
            body: body_snippet,
        }
    }
}

#[async_trait]
impl NutritionEstimator for OpenAiEstimator {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, EstimatorError> {
        let api_key = self.api_key.as_ref().ok_or(EstimatorError::MissingApiKey)?;

        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "requesting completion");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let err = self.error_from_response(resp).await;
            tracing::warn!(error = %err, "completion request failed");
            return Err(err);
        }

        let reply: ChatResponse = resp.json().await?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(EstimatorError::EmptyCompletion)
    }
}
