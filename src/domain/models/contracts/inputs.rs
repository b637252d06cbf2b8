//! Stage inputs, serialized into each agent's user message.

use serde::{Deserialize, Serialize};

use super::architecture::{ArchitectureDecision, ArchitectureResult};
use super::discovery::PainMonetizationMatrix;
use super::estimation::EstimationResult;
use super::legacy::{ConstraintList, LegacyAnalysisResult};
use super::proposal::EngagementSummary;

/// What the discovery agent reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryInput {
    /// Client conversation or rendered dossier
    pub transcript: String,
    /// Extra background
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// What the legacy analyst reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyInput {
    /// Prose description of the existing system
    pub codebase_description: String,
    /// Representative source excerpts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code_samples: Vec<String>,
    /// Problems the client already knows of
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub known_issues: Vec<String>,
    /// What the client wants changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_requirements: Option<String>,
}

/// What the architect reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectInput {
    /// Discovery artifact
    pub pain_matrix: PainMonetizationMatrix,
    /// Constraints from legacy analysis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<ConstraintList>,
    /// Attributes the client ranks first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quality_priorities: Vec<String>,
    /// Legacy artifact, when there is one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_analysis: Option<LegacyAnalysisResult>,
}

/// What each estimator reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatorInput {
    /// Decisions to estimate
    pub architecture_decisions: Vec<ArchitectureDecision>,
    /// Phase for the cone of uncertainty
    pub project_phase: String,
    /// Known risks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risk_factors: Vec<String>,
}

/// Everything the synthesis agent condenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisInput {
    /// Discovery artifact
    pub pain_matrix: PainMonetizationMatrix,
    /// Architecture artifact
    pub architecture: ArchitectureResult,
    /// Estimation artifact
    pub estimation: EstimationResult,
    /// Legacy artifact, when there is one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_analysis: Option<LegacyAnalysisResult>,
}

/// What the proposal writer reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalInput {
    /// Synthesis artifact
    pub engagement_summary: EngagementSummary,
    /// Client the proposal is addressed to
    pub client_name: String,
    /// USD per hour for pricing
    pub hourly_rate: f64,
}
