//! Scripted LLM provider for tests.
//!
//! Responses are served from FIFO queues. A routed queue is used when its
//! needle appears in the request's system prompt or user message, which keeps
//! concurrent branches deterministic. Everything else comes from the default
//! queue, then from the fallback response if one is set.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::ports::{CompletionRequest, CompletionResponse, LlmProvider, ProviderError};

/// Mock response configuration.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// Text returned as the completion
    pub content: String,
    /// Simulated transport failure message
    pub error_message: Option<String>,
    /// Reported prompt tokens
    pub input_tokens: u64,
    /// Reported generated tokens
    pub output_tokens: u64,
    /// Reported cost
    pub cost_usd: f64,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self {
            content: String::new(),
            error_message: None,
            input_tokens: 100,
            output_tokens: 50,
            cost_usd: 0.01,
        }
    }
}

impl MockResponse {
    /// Completion returning `content`.
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Network error carrying `error`.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error_message: Some(error.into()),
            ..Default::default()
        }
    }

    /// Override the reported cost.
    pub const fn with_cost(mut self, cost_usd: f64) -> Self {
        self.cost_usd = cost_usd;
        self
    }

    /// Override the reported token counts.
    pub const fn with_tokens(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.input_tokens = input_tokens;
        self.output_tokens = output_tokens;
        self
    }
}

#[derive(Debug, Default)]
struct Script {
    routes: Vec<(String, VecDeque<MockResponse>)>,
    queue: VecDeque<MockResponse>,
    requests: Vec<CompletionRequest>,
}

/// LLM provider that replays queued responses.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    script: Mutex<Script>,
    fallback: Option<MockResponse>,
}

impl ScriptedProvider {
    /// Provider with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `responses` in order on the default queue.
    pub fn with_responses(responses: impl IntoIterator<Item = MockResponse>) -> Self {
        Self {
            script: Mutex::new(Script {
                queue: responses.into_iter().collect(),
                ..Script::default()
            }),
            fallback: None,
        }
    }

    /// Response used once every matching queue is empty.
    pub fn with_fallback(mut self, response: MockResponse) -> Self {
        self.fallback = Some(response);
        self
    }

    /// Serve `responses` to requests that mention `needle`.
    pub fn with_route(
        mut self,
        needle: impl Into<String>,
        responses: impl IntoIterator<Item = MockResponse>,
    ) -> Self {
        self.script
            .get_mut()
            .routes
            .push((needle.into(), responses.into_iter().collect()));
        self
    }

    /// Queue one more response on the default queue.
    pub async fn push(&self, response: MockResponse) {
        self.script.lock().await.queue.push_back(response);
    }

    /// Every request received so far, in arrival order.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.script.lock().await.requests.clone()
    }

    /// Requests received so far.
    pub async fn call_count(&self) -> usize {
        self.script.lock().await.requests.len()
    }

    /// Number of requests that asked for `model`.
    pub async fn calls_for_model(&self, model: &str) -> usize {
        self.script
            .lock()
            .await
            .requests
            .iter()
            .filter(|r| r.model == model)
            .count()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn provider_id(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let mut script = self.script.lock().await;

        let routed = script
            .routes
            .iter_mut()
            .filter(|(needle, queue)| {
                !queue.is_empty()
                    && (request.system_prompt.contains(needle.as_str())
                        || request.user_message.contains(needle.as_str()))
            })
            .find_map(|(_, queue)| queue.pop_front());

        let response = routed
            .or_else(|| script.queue.pop_front())
            .or_else(|| self.fallback.clone());

        let model = request.model.clone();
        script.requests.push(request);
        let calls = script.requests.len();
        drop(script);

        let response = response.ok_or(ProviderError::Exhausted(calls))?;
        if let Some(message) = response.error_message {
            return Err(ProviderError::Network(message));
        }

        Ok(CompletionResponse {
            content: response.content,
            input_tokens: response.input_tokens,
            output_tokens: response.output_tokens,
            model_used: model,
            cost_usd: response.cost_usd,
        })
    }
}
