//! Agent roles and profiles.

use serde::{Deserialize, Serialize};

/// Role an agent plays in a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Extracts monetized pain from a transcript
    Discovery,
    /// Analyzes an existing codebase
    Legacy,
    /// Designs the solution or the refactoring plan
    Architect,
    /// Produces PERT estimates
    Estimator,
    /// Combines stage results into an engagement summary
    Synthesis,
    /// Writes the client proposal
    Proposal,
    /// Condenses raw documents into a project dossier
    Miner,
}

impl AgentRole {
    /// snake_case role name, also the critic's role.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Legacy => "legacy",
            Self::Architect => "architect",
            Self::Estimator => "estimator",
            Self::Synthesis => "synthesis",
            Self::Proposal => "proposal",
            Self::Miner => "miner",
        }
    }

    /// Knowledge key the role reads from. Synthesis writes in the proposal's
    /// frameworks, so it shares them.
    pub const fn knowledge_role(&self) -> &'static str {
        match self {
            Self::Synthesis => "proposal",
            other => other.as_str(),
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which way an ensemble estimator leans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorBias {
    /// Best realistic case
    Optimist,
    /// Worst realistic case
    Pessimist,
    /// Outside view, corrected for the planning fallacy
    Realist,
}

impl EstimatorBias {
    /// Lowercase name, used in stage names.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Optimist => "optimist",
            Self::Pessimist => "pessimist",
            Self::Realist => "realist",
        }
    }
}

/// Everything needed to run one agent: who it is and how it is prompted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentProfile {
    /// Role the agent plays
    pub role: AgentRole,
    /// Display name used in logs and the cost ledger
    pub name: String,
    /// Role instructions, before knowledge and schema are appended
    pub system_prompt: String,
    /// Tier or alias, resolved through the model resolver
    pub default_model: String,
}

impl AgentProfile {
    /// Profile on the `default` model alias.
    pub fn new(role: AgentRole, name: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            role,
            name: name.into(),
            system_prompt: system_prompt.into(),
            default_model: "default".to_string(),
        }
    }

    /// Run on another tier or alias.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Knowledge key of the profile's role.
    pub const fn knowledge_role(&self) -> &'static str {
        self.role.knowledge_role()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesis_reads_proposal_knowledge() {
        assert_eq!(AgentRole::Synthesis.knowledge_role(), "proposal");
        assert_eq!(AgentRole::Architect.knowledge_role(), "architect");
    }

    #[test]
    fn test_profile_defaults_to_default_alias() {
        let profile = AgentProfile::new(AgentRole::Discovery, "Discovery", "prompt");
        assert_eq!(profile.default_model, "default");
        let profile = profile.with_default_model("tier3");
        assert_eq!(profile.default_model, "tier3");
    }
}
