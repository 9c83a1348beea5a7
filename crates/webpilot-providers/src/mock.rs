//! Mock LLM provider for testing.
//!
//! Returns a scripted sequence of responses in order, recording every
//! request it receives, so loop behavior can be asserted without a network.

use crate::{CompletionRequest, CompletionResponse, LLMProvider, Usage};
use anyhow::Result;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A single scripted response (or failure)
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return this content as the completion
    Text(String),
    /// Fail the completion call with this error message (simulates a
    /// transport failure)
    Error(String),
}

impl MockResponse {
    pub fn text(content: &str) -> Self {
        Self::Text(content.to_string())
    }

    pub fn error(message: &str) -> Self {
        Self::Error(message.to_string())
    }
}

pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_response(self, response: MockResponse) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn with_responses(self, responses: impl IntoIterator<Item = MockResponse>) -> Self {
        self.responses.lock().unwrap().extend(responses);
        self
    }

    /// Every request the provider has received, in order
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Handle for inspecting requests after the provider has been moved
    /// into an agent
    pub fn request_log(&self) -> Arc<Mutex<Vec<CompletionRequest>>> {
        self.requests.clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LLMProvider for MockProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests.lock().unwrap().push(request);

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(MockResponse::Text(content)) => Ok(CompletionResponse {
                content,
                usage: Usage {
                    prompt_tokens: 100,
                    completion_tokens: 20,
                    total_tokens: 120,
                },
                model: self.model().to_string(),
            }),
            Some(MockResponse::Error(message)) => Err(anyhow::anyhow!("{}", message)),
            None => Err(anyhow::anyhow!("MockProvider script exhausted")),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    fn max_tokens(&self) -> u32 {
        1024
    }

    fn temperature(&self) -> f32 {
        0.0
    }
}
