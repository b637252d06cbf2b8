//! LLM Provider Port
//!
//! The single call every agent and critic makes: a system prompt and one user
//! message in, generated text plus token accounting out. Providers must surface
//! a per-call cost estimate so the cost ledger never has to guess.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Request for one completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// System prompt (role instructions, knowledge, schema)
    pub system_prompt: String,

    /// User message (serialized input payload)
    pub user_message: String,

    /// Concrete model identifier, already resolved from any tier alias
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Request for `model` with the given prompts and output cap.
    pub fn new(
        system_prompt: impl Into<String>,
        user_message: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_message: user_message.into(),
            model: model.into(),
            max_tokens,
        }
    }
}

/// Response from a provider after one completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated content
    pub content: String,

    /// Prompt tokens consumed
    pub input_tokens: u64,

    /// Tokens generated
    pub output_tokens: u64,

    /// Model that actually served the call
    pub model_used: String,

    /// Estimated cost of this call in USD
    pub cost_usd: f64,
}

/// Token usage totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens
    pub input_tokens: u64,
    /// Generated tokens
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Add one call's tokens to the running total.
    pub fn add(&mut self, input_tokens: u64, output_tokens: u64) {
        self.input_tokens += input_tokens;
        self.output_tokens += output_tokens;
    }

    /// Prompt and generated tokens together.
    pub const fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

impl std::ops::AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.add(rhs.input_tokens, rhs.output_tokens);
    }
}

/// Error types for provider operations
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// No API key or endpoint for the provider
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Non-success status from the API
    #[error("Provider returned HTTP {status}: {body}")]
    Http {
        /// Response status code
        status: u16,
        /// Response body, for the log
        body: String,
    },

    /// HTTP 429 from the API
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Connection or timeout failure
    #[error("Network error: {0}")]
    Network(String),

    /// Body that could not be read as a completion
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A scripted provider ran out of queued responses
    #[error("Scripted responses exhausted after {0} call(s)")]
    Exhausted(usize),
}

impl ProviderError {
    /// Whether a retry has a reasonable chance of succeeding.
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status >= 500,
            Self::RateLimited(_) | Self::Network(_) => true,
            Self::NotConfigured(_) | Self::InvalidResponse(_) | Self::Exhausted(_) => false,
        }
    }
}

/// Port trait for LLM provider implementations
///
/// # Implementations
///
/// - **AnthropicProvider**: Anthropic Messages API over HTTPS
/// - **OpenAiCompatibleProvider**: OpenAI and DeepSeek chat completions
/// - **ScriptedProvider**: queued responses for tests
///
/// Implementations must be `Send + Sync`; the fan-in pipeline calls the same
/// provider from two tokio tasks at once.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short identifier, e.g. "anthropic" or "scripted"
    fn provider_id(&self) -> &str;

    /// Run one completion.
    ///
    /// Transport failures are returned as errors; the caller treats them as
    /// fatal for the current stage.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;
}

/// Maps a tier name or alias to a concrete model identifier.
pub trait ModelResolver: Send + Sync {
    /// Concrete model id for a tier name, alias or id.
    fn resolve(&self, tier_or_alias: &str) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_usage_accumulates() {
        let mut usage = TokenUsage::default();
        usage.add(100, 20);
        usage += TokenUsage {
            input_tokens: 5,
            output_tokens: 7,
        };
        assert_eq!(usage.input_tokens, 105);
        assert_eq!(usage.output_tokens, 27);
        assert_eq!(usage.total(), 132);
    }

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::Http { status: 529, body: String::new() }.is_transient());
        assert!(!ProviderError::Http { status: 400, body: String::new() }.is_transient());
        assert!(ProviderError::RateLimited("slow down".into()).is_transient());
        assert!(!ProviderError::NotConfigured("no key".into()).is_transient());
    }
}
