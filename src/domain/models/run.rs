//! Pipeline run state machine and its final result.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::critique::{Escalation, Verdict};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::TokenUsage;
use super::cost::CostManifest;

/// Which pipeline variant a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineMode {
    /// New build from a transcript (sequential)
    Greenfield,
    /// Modernise an existing system (sequential with a derived stage)
    Brownfield,
    /// Extend an existing platform (parallel fan-in)
    Greyfield,
    /// Condense raw client documents into a project dossier (single stage)
    Ingestion,
}

impl PipelineMode {
    /// Lowercase name used in run ids, file names and on the command line.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Greenfield => "greenfield",
            Self::Brownfield => "brownfield",
            Self::Greyfield => "greyfield",
            Self::Ingestion => "ingestion",
        }
    }
}

impl std::fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PipelineMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "greenfield" => Ok(Self::Greenfield),
            "brownfield" => Ok(Self::Brownfield),
            "greyfield" | "grayfield" => Ok(Self::Greyfield),
            "ingestion" => Ok(Self::Ingestion),
            other => Err(DomainError::ValidationFailed(format!("unknown pipeline mode: {other}"))),
        }
    }
}

/// Lifecycle of a pipeline run.
///
/// `NotStarted -> Running -> {Completed | CostExceeded | Error}`; the three
/// outcomes are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Created, no stage has run
    NotStarted,
    /// Stages are executing
    Running,
    /// Every stage ran; some may have escalated
    Completed,
    /// The cost ledger reached its cap and the run stopped early
    CostExceeded,
    /// An unrecoverable error stopped the run
    Error,
}

impl RunStatus {
    /// snake_case wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::CostExceeded => "cost_exceeded",
            Self::Error => "error",
        }
    }

    /// Whether no further transition is allowed.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::CostExceeded | Self::Error)
    }

    /// NotStarted -> Running -> {Completed | CostExceeded | Error}
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotStarted, Self::Running)
                | (Self::Running, Self::Completed | Self::CostExceeded | Self::Error)
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error captured at the orchestrator boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    /// Stable error kind from [`DomainError::kind`]
    pub kind: String,
    /// Display message of the error
    pub message: String,
}

impl From<&DomainError> for RunError {
    fn from(err: &DomainError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Mutable state of one pipeline run. Finalized exactly once.
#[derive(Debug, Clone)]
pub struct RunState {
    /// `{mode}_{YYYYmmdd_HHMMSS}`
    pub run_id: String,
    /// Pipeline variant being run
    pub mode: PipelineMode,
    status: RunStatus,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    artifacts: BTreeMap<String, serde_json::Value>,
    /// Stage names in the order their artifacts were recorded
    stage_order: Vec<String>,
    escalations: Vec<Escalation>,
    critic_logs: BTreeMap<String, Vec<Verdict>>,
    error: Option<RunError>,
}

impl RunState {
    /// Fresh `NotStarted` state with a time-stamped run id.
    pub fn new(mode: PipelineMode) -> Self {
        Self {
            run_id: format!("{}_{}", mode.as_str(), Utc::now().format("%Y%m%d_%H%M%S")),
            mode,
            status: RunStatus::NotStarted,
            started_at: None,
            completed_at: None,
            artifacts: BTreeMap::new(),
            stage_order: Vec::new(),
            escalations: Vec::new(),
            critic_logs: BTreeMap::new(),
            error: None,
        }
    }

    /// Current lifecycle status.
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// When the run reached a terminal status.
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Recorded artifact for `stage`.
    pub fn artifact(&self, stage: &str) -> Option<&serde_json::Value> {
        self.artifacts.get(stage)
    }

    /// Stage names in recording order.
    pub fn stages(&self) -> &[String] {
        &self.stage_order
    }

    /// Escalations raised so far.
    pub fn escalations(&self) -> &[Escalation] {
        &self.escalations
    }

    fn transition(&mut self, next: RunStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// `NotStarted -> Running`, stamping `started_at`.
    pub fn start(&mut self) -> DomainResult<()> {
        self.transition(RunStatus::Running)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Store a stage's artifact. A stage name is written at most once.
    pub fn record_artifact<T: Serialize>(&mut self, stage: &str, artifact: &T) -> DomainResult<()> {
        if self.artifacts.contains_key(stage) {
            return Err(DomainError::DuplicateArtifact(stage.to_string()));
        }
        let value = serde_json::to_value(artifact)?;
        self.artifacts.insert(stage.to_string(), value);
        self.stage_order.push(stage.to_string());
        Ok(())
    }

    /// Append an escalation for human review.
    pub fn record_escalation(&mut self, escalation: Escalation) {
        self.escalations.push(escalation);
    }

    /// Keep the verdicts a stage's critique loop produced. Empty logs are skipped.
    pub fn record_critic_log(&mut self, stage: &str, verdicts: Vec<Verdict>) {
        if !verdicts.is_empty() {
            self.critic_logs.insert(stage.to_string(), verdicts);
        }
    }

    /// Move to a terminal status and stamp `completed_at`.
    pub fn finalize(&mut self, status: RunStatus, error: Option<RunError>) -> DomainResult<()> {
        if !status.is_terminal() {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: status.to_string(),
            });
        }
        self.transition(status)?;
        self.completed_at = Some(Utc::now());
        self.error = error;
        Ok(())
    }

    /// Consume the state into the public result, attaching the ledger's report.
    pub fn into_result(self, cost: CostManifest, token_usage: TokenUsage) -> RunResult {
        RunResult {
            run_id: self.run_id,
            mode: self.mode,
            status: self.status,
            started_at: self.started_at,
            completed_at: self.completed_at,
            artifacts: self.artifacts,
            stage_order: self.stage_order,
            escalations: self.escalations,
            critic_logs: self.critic_logs,
            cost_usd: cost.total_cost_usd,
            token_usage,
            cost,
            error: self.error,
        }
    }
}

/// Public outcome of `run_pipeline`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Run identifier, also the output directory name
    pub run_id: String,
    /// Pipeline variant that ran
    pub mode: PipelineMode,
    /// Terminal status
    pub status: RunStatus,
    /// When the first stage began
    pub started_at: Option<DateTime<Utc>>,
    /// When the run finished
    pub completed_at: Option<DateTime<Utc>>,
    /// Stage name to artifact JSON
    pub artifacts: BTreeMap<String, serde_json::Value>,
    /// Stage names in the order they were recorded
    pub stage_order: Vec<String>,
    /// Stages needing human attention
    pub escalations: Vec<Escalation>,
    /// Stage name to every verdict its critic returned
    pub critic_logs: BTreeMap<String, Vec<Verdict>>,
    /// Total spend in USD
    pub cost_usd: f64,
    /// Tokens across every call of the run
    pub token_usage: TokenUsage,
    /// Full ledger report
    pub cost: CostManifest,
    /// Set when `status` is `Error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RunError>,
}

impl RunResult {
    /// Deserialize a stage artifact back into its typed form.
    pub fn artifact_as<T: serde::de::DeserializeOwned>(&self, stage: &str) -> Option<T> {
        self.artifacts
            .get(stage)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}
