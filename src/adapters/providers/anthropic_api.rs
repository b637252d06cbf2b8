//! Anthropic Messages API provider.
//!
//! One non-streaming `POST /v1/messages` per completion. Calls are throttled
//! by a process-wide rate limiter and retried with exponential backoff while
//! the failure is transient (429, 5xx, transport errors).

use std::time::Duration;

use async_trait::async_trait;
use governor::DefaultDirectRateLimiter;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::transport::{check_status, http_client, rate_limiter, resolve_api_key, retry_transient, RetryPolicy};
use crate::domain::models::config::{PricingConfig, ProviderConfig};
use crate::domain::ports::{CompletionRequest, CompletionResponse, LlmProvider, ProviderError};
use crate::services::cost_ledger::{cost_at, get_model_pricing, ModelPricing};

/// Message role in Anthropic API.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
enum MessageRole {
    User,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: MessageRole,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

/// Content block in a response. Only `text` blocks carry output we use.
#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: Option<String>,
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Usage,
}

/// [`LlmProvider`] backed by the Anthropic Messages API.
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    api_version: String,
    fallback_pricing: ModelPricing,
    limiter: DefaultDirectRateLimiter,
    retry: RetryPolicy,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("fallback_pricing", &self.fallback_pricing)
            .finish_non_exhaustive()
    }
}

impl AnthropicProvider {
    /// Build a provider from configuration.
    ///
    /// The API key comes from `provider.api_key`, then `ANTHROPIC_API_KEY`.
    /// A missing key is [`ProviderError::NotConfigured`].
    pub fn from_config(provider: &ProviderConfig, pricing: &PricingConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(provider)?,
            api_key: resolve_api_key(provider)?,
            base_url: provider.endpoint(),
            api_version: provider.api_version.clone(),
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

    fn cost_for(&self, model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
        let pricing = get_model_pricing(model).unwrap_or(self.fallback_pricing);
        cost_at(pricing, input_tokens, output_tokens)
    }

    async fn send_once(&self, body: &MessagesRequest<'_>) -> Result<MessagesResponse, ProviderError> {
        self.limiter.until_ready().await;

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        check_status(response)
            .await?
            .json::<MessagesResponse>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn provider_id(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let body = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            system: &request.system_prompt,
            messages: vec![Message {
                role: MessageRole::User,
                content: &request.user_message,
            }],
        };
        let response = retry_transient(self.retry, &request.model, || self.send_once(&body)).await?;

        let content: String = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        if content.is_empty() {
            return Err(ProviderError::InvalidResponse("response had no text content".to_string()));
        }

        let model_used = response.model.unwrap_or_else(|| request.model.clone());
        let Usage {
            input_tokens,
            output_tokens,
        } = response.usage;
        let cost_usd = self.cost_for(&model_used, input_tokens, output_tokens);
        debug!(
            model = %model_used,
            input_tokens,
            output_tokens,
            cost_usd,
            "Anthropic completion"
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

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn provider_for(url: &str) -> AnthropicProvider {
        let config = ProviderConfig {
            api_key: Some("test-key".to_string()),
            base_url: Some(url.to_string()),
            requests_per_minute: 600,
            ..ProviderConfig::default()
        };
        AnthropicProvider::from_config(&config, &PricingConfig::default())
            .unwrap()
            .with_retry_window(Duration::from_millis(5), Duration::from_millis(200))
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new("You are terse.", "{\"q\":1}", "claude-sonnet-4-5", 256)
    }

    const OK_BODY: &str = r#"{
        "id": "msg_1",
        "type": "message",
        "role": "assistant",
        "model": "claude-sonnet-4-5",
        "content": [{"type": "text", "text": "{\"answer\":"}, {"type": "text", "text": "42}"}],
        "stop_reason": "end_turn",
        "usage": {"input_tokens": 1000, "output_tokens": 200}
    }"#;

    #[tokio::test]
    async fn test_complete_parses_text_and_usage() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .match_header("anthropic-version", "2023-06-01")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "claude-sonnet-4-5",
                "max_tokens": 256,
                "system": "You are terse.",
                "messages": [{"role": "user", "content": "{\"q\":1}"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(OK_BODY)
            .create_async()
            .await;

        let response = provider_for(&server.url()).complete(request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.content, "{\"answer\":42}");
        assert_eq!(response.input_tokens, 1000);
        assert_eq!(response.output_tokens, 200);
        // sonnet: 1000 * 3 + 200 * 15 per million
        assert!((response.cost_usd - 0.006).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_unknown_model_uses_fallback_pricing() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(
                r#"{"model": "house-model", "content": [{"type": "text", "text": "hi"}],
                    "usage": {"input_tokens": 1000000, "output_tokens": 0}}"#,
            )
            .create_async()
            .await;

        let config = ProviderConfig {
            api_key: Some("test-key".to_string()),
            base_url: Some(server.url()),
            ..ProviderConfig::default()
        };
        let pricing = PricingConfig {
            input_per_million: 2.0,
            output_per_million: 8.0,
        };
        let provider = AnthropicProvider::from_config(&config, &pricing).unwrap();

        let response = provider.complete(request()).await.unwrap();
        assert_eq!(response.model_used, "house-model");
        assert!((response.cost_usd - 2.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("POST", "/v1/messages")
            .with_status(529)
            .with_body("overloaded")
            .expect(1)
            .create_async()
            .await;
        let recovered = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(OK_BODY)
            .create_async()
            .await;

        let response = provider_for(&server.url()).complete(request()).await.unwrap();

        failing.assert_async().await;
        recovered.assert_async().await;
        assert_eq!(response.content, "{\"answer\":42}");
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(400)
            .with_body("bad model")
            .expect(1)
            .create_async()
            .await;

        let err = provider_for(&server.url()).complete(request()).await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, ProviderError::Http { status: 400, ref body } if body == "bad model"));
    }

    #[tokio::test]
    async fn test_empty_content_is_invalid() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(r#"{"content": [], "usage": {"input_tokens": 1, "output_tokens": 0}}"#)
            .create_async()
            .await;

        let err = provider_for(&server.url()).complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[test]
    fn test_missing_key_is_not_configured() {
        temp_env::with_var_unset("ANTHROPIC_API_KEY", || {
            let err = AnthropicProvider::from_config(&ProviderConfig::default(), &PricingConfig::default())
                .unwrap_err();
            assert!(matches!(err, ProviderError::NotConfigured(_)));
        });
    }

    #[test]
    fn test_key_read_from_environment() {
        temp_env::with_var("ANTHROPIC_API_KEY", Some("env-key"), || {
            let provider =
                AnthropicProvider::from_config(&ProviderConfig::default(), &PricingConfig::default()).unwrap();
            assert_eq!(provider.api_key, "env-key");
        });
    }
}
