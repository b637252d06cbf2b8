//! Infrastructure adapters for external systems.
//!
//! - `knowledge`: cheat-sheet backed knowledge provider
//! - `providers`: LLM providers (Anthropic over HTTPS, scripted for tests)

pub mod knowledge;
pub mod providers;
