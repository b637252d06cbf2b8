//! Knowledge provider port.
//!
//! Supplies the static framework text an agent works from. Critics are handed
//! the exact same text so they judge by the rules the agent was given.

use async_trait::async_trait;

/// Errors raised by knowledge providers.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    /// No cheat sheets are mapped to the role
    #[error("Unknown agent role: {0}")]
    UnknownRole(String),

    /// A knowledge source exists but could not be read
    #[error("Failed to read knowledge source {path}: {message}")]
    Read {
        /// Source that failed
        path: String,
        /// Underlying I/O error text
        message: String,
    },
}

/// Source of framework knowledge for agents and critics.
#[async_trait]
pub trait KnowledgeProvider: Send + Sync {
    /// Framework text for the agent playing `role`.
    async fn context_for_agent(&self, role: &str) -> Result<String, KnowledgeError>;

    /// Framework text for the critic reviewing `role`. Identical to the agent's.
    async fn context_for_critic(&self, role: &str) -> Result<String, KnowledgeError> {
        self.context_for_agent(role).await
    }
}
