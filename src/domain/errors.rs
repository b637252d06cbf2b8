//! Domain errors for the meta-factory swarm.

use thiserror::Error;

use crate::domain::ports::knowledge::KnowledgeError;
use crate::domain::ports::llm_provider::ProviderError;

/// Domain-level errors that can occur while running agents and pipelines.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The LLM provider failed after its own retries.
    #[error("Provider call failed: {0}")]
    Provider(#[from] ProviderError),

    /// An agent's reply never parsed or validated, even after corrective retries.
    #[error("Agent '{agent}' produced invalid output after {attempts} attempt(s): {message}")]
    AgentOutput {
        /// Agent display name
        agent: String,
        /// Calls made, including the first
        attempts: u32,
        /// Last parse or validation error
        message: String,
    },

    /// A critic reply was not a valid verdict. Critics are never retried.
    #[error("Critic verdict could not be parsed: {0}")]
    CriticParse(String),

    /// The knowledge provider could not supply framework text.
    #[error("Knowledge lookup failed: {0}")]
    Knowledge(#[from] KnowledgeError),

    /// A run state change the lifecycle does not allow.
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Status before the attempted change
        from: String,
        /// Requested status
        to: String,
    },

    /// A stage tried to record a second artifact under the same name.
    #[error("Artifact for stage '{0}' already recorded")]
    DuplicateArtifact(String),

    /// Input or configuration did not satisfy a precondition.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Writing run artifacts to disk failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A spawned task panicked or was cancelled.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

impl DomainError {
    /// Stable snake_case name of the error variant, recorded on failed runs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Provider(_) => "provider_error",
            Self::AgentOutput { .. } => "agent_output_error",
            Self::CriticParse(_) => "critic_parse_error",
            Self::Knowledge(_) => "knowledge_error",
            Self::InvalidStateTransition { .. } => "invalid_state_transition",
            Self::DuplicateArtifact(_) => "duplicate_artifact",
            Self::ValidationFailed(_) => "validation_failed",
            Self::SerializationError(_) => "serialization_error",
            Self::Persistence(_) => "persistence_error",
            Self::ExecutionFailed(_) => "execution_failed",
        }
    }
}

/// Result type used throughout the domain and service layers.
pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}
