//! HTTP plumbing shared by the vendor adapters: key lookup, client and rate
//! limiter construction, status mapping and the transient-retry loop.

use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, Response, StatusCode};
use tracing::warn;

use crate::domain::models::config::ProviderConfig;
use crate::domain::ports::ProviderError;

/// Retry window for transient failures.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryPolicy {
    /// First backoff delay
    pub initial_interval: Duration,
    /// Longest single delay
    pub max_interval: Duration,
    /// Give up after this long
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(30),
            max_elapsed: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    /// Window where the longest single wait equals the whole budget.
    pub const fn window(initial_interval: Duration, max_elapsed: Duration) -> Self {
        Self {
            initial_interval,
            max_interval: max_elapsed,
            max_elapsed,
        }
    }
}

/// `provider.api_key`, then the vendor's environment variable. Blank values
/// count as unset.
pub(crate) fn resolve_api_key(provider: &ProviderConfig) -> Result<String, ProviderError> {
    let env_var = provider.kind.api_key_env();
    provider
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .or_else(|| std::env::var(env_var).ok().filter(|key| !key.trim().is_empty()))
        .ok_or_else(|| ProviderError::NotConfigured(format!("no API key; set provider.api_key or {env_var}")))
}

pub(crate) fn http_client(provider: &ProviderConfig) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(Duration::from_secs(provider.timeout_secs))
        .build()
        .map_err(|e| ProviderError::NotConfigured(format!("failed to build HTTP client: {e}")))
}

/// Direct limiter allowing `provider.requests_per_minute` calls, at least one.
pub(crate) fn rate_limiter(provider: &ProviderConfig) -> DefaultDirectRateLimiter {
    let per_minute = NonZeroU32::new(provider.requests_per_minute).unwrap_or(NonZeroU32::MIN);
    RateLimiter::direct(Quota::per_minute(per_minute))
}

/// Pass a 2xx response through; map 429 to `RateLimited` and anything else
/// to `Http` with the body attached.
pub(crate) async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(if status == StatusCode::TOO_MANY_REQUESTS {
        ProviderError::RateLimited(body)
    } else {
        ProviderError::Http {
            status: status.as_u16(),
            body,
        }
    })
}

/// Run `attempt` until it succeeds, fails permanently or the window closes.
pub(crate) async fn retry_transient<T, F, Fut>(policy: RetryPolicy, model: &str, attempt: F) -> Result<T, ProviderError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let backoff_policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(policy.initial_interval)
        .with_max_interval(policy.max_interval)
        .with_max_elapsed_time(Some(policy.max_elapsed))
        .build();

    let attempt = &attempt;
    backoff::future::retry(backoff_policy, move || async move {
        attempt().await.map_err(|err| {
            if err.is_transient() {
                warn!(model, error = %err, "Transient provider failure, retrying");
                backoff::Error::transient(err)
            } else {
                backoff::Error::permanent(err)
            }
        })
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::ProviderKind;

    #[test]
    fn test_key_env_follows_vendor() {
        let config = ProviderConfig {
            kind: ProviderKind::DeepSeek,
            ..ProviderConfig::default()
        };
        temp_env::with_vars(
            [("DEEPSEEK_API_KEY", Some("ds-key")), ("ANTHROPIC_API_KEY", Some("wrong"))],
            || assert_eq!(resolve_api_key(&config).unwrap(), "ds-key"),
        );
    }

    #[test]
    fn test_blank_config_key_falls_back_to_env() {
        let config = ProviderConfig {
            api_key: Some("  ".to_string()),
            ..ProviderConfig::default()
        };
        temp_env::with_var("ANTHROPIC_API_KEY", Some("env-key"), || {
            assert_eq!(resolve_api_key(&config).unwrap(), "env-key");
        });
        temp_env::with_var_unset("ANTHROPIC_API_KEY", || {
            assert!(matches!(resolve_api_key(&config), Err(ProviderError::NotConfigured(_))));
        });
    }
}
