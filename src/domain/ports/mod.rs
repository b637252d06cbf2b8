//! Domain ports (interfaces) for the meta-factory swarm.
//!
//! Ports define the boundaries between the critique core and external
//! collaborators: language-model providers, knowledge sources and the
//! objection similarity heuristic.

pub mod knowledge;
pub mod llm_provider;
pub mod similarity;

pub use knowledge::{KnowledgeError, KnowledgeProvider};
pub use llm_provider::{
    CompletionRequest, CompletionResponse, LlmProvider, ModelResolver, ProviderError, TokenUsage,
};
pub use similarity::ObjectionSimilarity;
