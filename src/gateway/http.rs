//! HTTP implementation of the model gateway.
//!
//! Speaks the OpenAI-compatible chat completions protocol. No pipeline
//! awareness — just makes API calls via reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatRequest, GatewayError, ModelGateway};
use crate::config::GatewayConfig;
use crate::error::ForgeError;

pub struct HttpGateway {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl HttpGateway {
    /// Build a gateway from config, resolving the credential from the
    /// configured environment variable.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ForgeError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| ForgeError::MissingApiKey(config.api_key_env.clone()))?;
        if api_key.trim().is_empty() {
            return Err(ForgeError::MissingApiKey(config.api_key_env.clone()));
        }
        Ok(Self::new(api_key, config))
    }

    pub fn new(api_key: String, config: &GatewayConfig) -> Self {
        Self {
            http: Client::new(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Override the base URL (for testing against a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn post_completion(&self, body: &CompletionBody<'_>) -> Result<String, GatewayError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(GatewayError::RateLimited { retry_after });
        }

        if status >= 400 {
            let message = response.text().await.unwrap_or_else(|_| "(no body)".into());
            return Err(GatewayError::Api { status, message });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| GatewayError::InvalidResponse("response carried no choices".into()))
    }
}

#[async_trait]
impl ModelGateway for HttpGateway {
    async fn complete(&self, request: ChatRequest) -> Result<String, GatewayError> {
        let model = request.model.as_deref().unwrap_or(&self.model);
        let temperature = request.temperature.unwrap_or(self.temperature);

        let body = CompletionBody {
            model,
            temperature,
            messages: vec![
                Message {
                    role: "system",
                    content: &request.system,
                },
                Message {
                    role: "user",
                    content: &request.user,
                },
            ],
        };

        debug!(model, temperature, user_len = request.user.len(), "Sending completion request");

        match tokio::time::timeout(self.timeout, self.post_completion(&body)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.timeout.as_secs())),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}
