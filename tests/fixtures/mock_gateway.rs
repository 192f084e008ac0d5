//! Mock model gateway for testing without actual LLM calls.
//!
//! Responses are keyed by a substring matched against the combined system
//! and user prompt; every matched call bumps an atomic counter so tests
//! can assert exactly how many model calls a stage made.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use testforge::gateway::{ChatRequest, GatewayError, ModelGateway};

#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Failure(String),
}

#[derive(Debug, Clone)]
pub enum ResponseScenario {
    Static(MockReply),
    Sequential(Vec<MockReply>),
}

impl ResponseScenario {
    pub fn text(response: impl Into<String>) -> Self {
        Self::Static(MockReply::Text(response.into()))
    }

    pub fn sequential(replies: Vec<MockReply>) -> Self {
        Self::Sequential(replies)
    }

    pub fn sequential_texts(responses: Vec<&str>) -> Self {
        Self::Sequential(responses.into_iter().map(|r| MockReply::Text(r.into())).collect())
    }
}

#[derive(Default)]
pub struct MockGateway {
    responses: RwLock<HashMap<String, ResponseScenario>>,
    call_counts: RwLock<HashMap<String, AtomicUsize>>,
    total_calls: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_response(&self, key: &str, scenario: ResponseScenario) {
        self.responses.write().insert(key.to_string(), scenario);
        self.call_counts
            .write()
            .insert(key.to_string(), AtomicUsize::new(0));
    }

    pub fn call_count(&self, key: &str) -> usize {
        self.call_counts
            .read()
            .get(key)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    pub fn assert_called(&self, key: &str, times: usize) {
        let count = self.call_count(key);
        assert_eq!(
            count, times,
            "Expected '{}' to be called {} times, but was called {} times",
            key, times, count
        );
    }

    fn find_reply(&self, prompt: &str) -> MockReply {
        let responses = self.responses.read();

        for (key, scenario) in responses.iter() {
            if prompt.contains(key) {
                let count = self
                    .call_counts
                    .read()
                    .get(key)
                    .map(|c| c.fetch_add(1, Ordering::SeqCst))
                    .unwrap_or(0);
                return match scenario {
                    ResponseScenario::Static(reply) => reply.clone(),
                    ResponseScenario::Sequential(replies) => {
                        replies[count % replies.len()].clone()
                    }
                };
            }
        }

        MockReply::Text("OK".to_string())
    }
}

#[async_trait]
impl ModelGateway for MockGateway {
    async fn complete(&self, request: ChatRequest) -> Result<String, GatewayError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        let prompt = format!("{}\n{}", request.system, request.user);
        match self.find_reply(&prompt) {
            MockReply::Text(text) => Ok(text),
            MockReply::Failure(message) => Err(GatewayError::Http(message)),
        }
    }
}

pub struct MockGatewayBuilder {
    gateway: MockGateway,
}

impl MockGatewayBuilder {
    pub fn new() -> Self {
        Self {
            gateway: MockGateway::new(),
        }
    }

    pub fn response(self, key: &str, scenario: ResponseScenario) -> Self {
        self.gateway.set_response(key, scenario);
        self
    }

    pub fn text_response(self, key: &str, response: impl Into<String>) -> Self {
        self.response(key, ResponseScenario::text(response))
    }

    pub fn build(self) -> MockGateway {
        self.gateway
    }
}

impl Default for MockGatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}
