//! Typed stage contracts exchanged between agents.

pub mod architecture;
pub mod discovery;
pub mod estimation;
pub mod inputs;
pub mod legacy;
pub mod project;
pub mod proposal;

pub use architecture::{ArchitectureDecision, ArchitectureResult, QualityScenario, Rating, UtilityTree};
pub use discovery::{Frequency, PainMonetizationMatrix, PainPoint, Priority, StakeholderNeed};
pub use estimation::{ConeOfUncertainty, EstimationResult, PertEstimate};
pub use inputs::{
    ArchitectInput, DiscoveryInput, EstimatorInput, LegacyInput, ProposalInput, SynthesisInput,
};
pub use legacy::{ConstraintList, LegacyAnalysisResult, ReconciledConstraints, TechDebtItem};
pub use project::{
    ConstraintPriority, CoreLogicFlow, MinerInput, ProjectDossier, Stakeholder, TechConstraint,
};
pub use proposal::{EngagementSummary, ProposalDocument};
