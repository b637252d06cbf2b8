//! LLM provider adapters.
//!
//! - `anthropic_api`: Anthropic Messages API over HTTPS
//! - `openai_compat`: OpenAI-style Chat Completions (OpenAI, DeepSeek)
//! - `mock`: scripted responses for tests and dry runs

pub mod anthropic_api;
pub mod mock;
pub mod openai_compat;
mod transport;

use std::sync::Arc;

pub use anthropic_api::AnthropicProvider;
pub use mock::{MockResponse, ScriptedProvider};
pub use openai_compat::OpenAiCompatibleProvider;

use crate::domain::models::config::{PricingConfig, ProviderConfig, ProviderKind};
use crate::domain::ports::{LlmProvider, ProviderError};

/// Build the adapter selected by `provider.kind`.
pub fn build_provider(provider: &ProviderConfig, pricing: &PricingConfig) -> Result<Arc<dyn LlmProvider>, ProviderError> {
    tracing::debug!(kind = %provider.kind, endpoint = %provider.endpoint(), "Building LLM provider");
    Ok(match provider.kind {
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::from_config(provider, pricing)?),
        ProviderKind::OpenAi | ProviderKind::DeepSeek => {
            Arc::new(OpenAiCompatibleProvider::from_config(provider, pricing)?)
        }
    })
}
