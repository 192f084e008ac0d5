//! Sole point of contact with the external text-completion service.

mod http;

pub use http::HttpGateway;

use async_trait::async_trait;
use thiserror::Error;

/// A single completion request: a system instruction plus one user message.
/// Model and temperature default to the gateway's configured values unless
/// overridden per call.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub model: Option<String>,
    pub temperature: Option<f32>,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            model: None,
            temperature: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// External text-completion collaborator. Implementations must be safe to
/// retry, but the pipeline core never retries on its own — retry policy
/// belongs to the caller or the gateway implementation.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<String, GatewayError>;
}
