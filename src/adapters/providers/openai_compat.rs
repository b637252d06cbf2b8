//! OpenAI-compatible Chat Completions provider.
//!
//! Serves OpenAI itself and vendors that speak the same wire format
//! (DeepSeek). One non-streaming `POST {base_url}/chat/completions` per
//! completion, with the same rate limiting and retry behaviour as the
//! Anthropic adapter.

use std::time::Duration;

use async_trait::async_trait;
use governor::DefaultDirectRateLimiter;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::transport::{check_status, http_client, rate_limiter, resolve_api_key, retry_transient, RetryPolicy};
use crate::domain::models::config::{PricingConfig, ProviderConfig, ProviderKind};
use crate::domain::ports::{CompletionRequest, CompletionResponse, LlmProvider, ProviderError};
use crate::services::cost_ledger::{cost_at, get_model_pricing, ModelPricing};

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
enum ChatRole {
    System,
    User,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: ChatRole,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Default, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: ChatUsage,
}

/// [`LlmProvider`] for OpenAI-style Chat Completions endpoints.
pub struct OpenAiCompatibleProvider {
    kind: ProviderKind,
    client: Client,
    api_key: String,
    base_url: String,
    fallback_pricing: ModelPricing,
    limiter: DefaultDirectRateLimiter,
    retry: RetryPolicy,
}

impl std::fmt::Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenAiCompatibleProvider {
    /// Build a provider from configuration.
    ///
    /// The key comes from `provider.api_key`, then `OPENAI_API_KEY` or
    /// `DEEPSEEK_API_KEY` depending on `provider.kind`.
    pub fn from_config(provider: &ProviderConfig, pricing: &PricingConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            kind: provider.kind,
            client: http_client(provider)?,
            api_key: resolve_api_key(provider)?,
            base_url: provider.endpoint(),
            fallback_pricing: ModelPricing {
                input: pricing.input_per_million,
                output: pricing.output_per_million,
            },
            limiter: rate_limiter(provider),
            retry: RetryPolicy::default(),
        })
    }

    /// Shorten the retry window. Mostly useful against local test servers.
    #[must_use]
    pub const fn with_retry_window(mut self, initial_interval: Duration, max_elapsed: Duration) -> Self {
        self.retry = RetryPolicy::window(initial_interval, max_elapsed);
        self
    }

    async fn send_once(&self, body: &ChatRequest<'_>) -> Result<ChatResponse, ProviderError> {
        self.limiter.until_ready().await;

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        check_status(response)
            .await?
            .json::<ChatResponse>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn provider_id(&self) -> &str {
        self.kind.as_str()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let body = ChatRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            messages: [
                ChatMessage {
                    role: ChatRole::System,
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: ChatRole::User,
                    content: &request.user_message,
                },
            ],
        };
        let response = retry_transient(self.retry, &request.model, || self.send_once(&body)).await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ProviderError::InvalidResponse("response had no message content".to_string()))?;

        let model_used = response.model.unwrap_or_else(|| request.model.clone());
        let ChatUsage {
            prompt_tokens: input_tokens,
            completion_tokens: output_tokens,
        } = response.usage;
        let pricing = get_model_pricing(&model_used).unwrap_or(self.fallback_pricing);
        let cost_usd = cost_at(pricing, input_tokens, output_tokens);
        debug!(
            provider = %self.kind,
            model = %model_used,
            input_tokens,
            output_tokens,
            cost_usd,
            "Chat completion"
        );

        Ok(CompletionResponse {
            content,
            input_tokens,
            output_tokens,
            model_used,
            cost_usd,
        })
    }
}
