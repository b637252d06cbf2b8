//! Raw client input for one pipeline run.

use serde::{Deserialize, Serialize};

use super::contracts::{DiscoveryInput, LegacyInput, MinerInput, ProjectDossier};
use super::run::PipelineMode;
use crate::domain::errors::{DomainError, DomainResult};

fn default_hourly_rate() -> f64 {
    150.0
}

fn default_project_phase() -> String {
    "requirements_complete".to_string()
}

/// Everything a client hands over, loaded from a YAML or JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementInput {
    /// Client or project name
    pub client_name: String,

    /// Rate used to price the proposal (USD)
    #[serde(default = "default_hourly_rate")]
    pub hourly_rate: f64,

    /// Cone-of-uncertainty phase the estimate is placed in
    #[serde(default = "default_project_phase")]
    pub project_phase: String,

    /// Meeting transcript or idea description (greenfield, greyfield)
    #[serde(default)]
    pub transcript: Option<String>,

    /// Mined dossier; stands in for the transcript when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dossier: Option<ProjectDossier>,

    /// Raw client documents to mine (ingestion)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<String>,

    /// Extra background for discovery
    #[serde(default)]
    pub context: Option<String>,

    /// Description of the existing system (brownfield, greyfield)
    #[serde(default)]
    pub codebase_description: Option<String>,

    /// Representative code excerpts
    #[serde(default)]
    pub code_samples: Vec<String>,

    /// Problems the client already knows about
    #[serde(default)]
    pub known_issues: Vec<String>,

    /// What the client wants changed (brownfield)
    #[serde(default)]
    pub change_requirements: Option<String>,

    /// Quality attributes the architect should favour
    #[serde(default)]
    pub quality_priorities: Vec<String>,
}

impl EngagementInput {
    /// Input for a transcript-driven run.
    pub fn greenfield(client_name: impl Into<String>, transcript: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            hourly_rate: default_hourly_rate(),
            project_phase: default_project_phase(),
            transcript: Some(transcript.into()),
            dossier: None,
            documents: None,
            context: None,
            codebase_description: None,
            code_samples: Vec::new(),
            known_issues: Vec::new(),
            change_requirements: None,
            quality_priorities: Vec::new(),
        }
    }

    /// Input for a run over an existing codebase.
    pub fn brownfield(client_name: impl Into<String>, codebase_description: impl Into<String>) -> Self {
        Self {
            transcript: None,
            codebase_description: Some(codebase_description.into()),
            ..Self::greenfield(client_name, String::new())
        }
    }

    /// Input for mining raw documents into a dossier.
    pub fn ingestion(client_name: impl Into<String>, documents: impl Into<String>) -> Self {
        Self {
            transcript: None,
            documents: Some(documents.into()),
            ..Self::greenfield(client_name, String::new())
        }
    }

    /// Attach a description of the existing system.
    pub fn with_codebase(mut self, description: impl Into<String>) -> Self {
        self.codebase_description = Some(description.into());
        self
    }

    /// Replace the known issues.
    pub fn with_known_issues(mut self, issues: Vec<String>) -> Self {
        self.known_issues = issues;
        self
    }

    /// Use a mined dossier in place of the transcript.
    #[must_use]
    pub fn with_dossier(mut self, dossier: ProjectDossier) -> Self {
        self.dossier = Some(dossier);
        self
    }

    /// Check that the fields `mode` needs are present.
    pub fn validate_for(&self, mode: PipelineMode) -> DomainResult<()> {
        let has = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.trim().is_empty());

        if self.client_name.trim().is_empty() {
            return Err(DomainError::ValidationFailed("client_name must not be empty".to_string()));
        }
        if self.hourly_rate <= 0.0 {
            return Err(DomainError::ValidationFailed(format!(
                "hourly_rate must be positive, got {}",
                self.hourly_rate
            )));
        }
        if matches!(mode, PipelineMode::Greenfield | PipelineMode::Greyfield)
            && !has(&self.transcript)
            && self.dossier.is_none()
        {
            return Err(DomainError::ValidationFailed(format!(
                "{mode} runs need a transcript or a dossier"
            )));
        }
        if mode == PipelineMode::Ingestion && !has(&self.documents) {
            return Err(DomainError::ValidationFailed(format!("{mode} runs need documents")));
        }
        if matches!(mode, PipelineMode::Brownfield | PipelineMode::Greyfield)
            && !has(&self.codebase_description)
        {
            return Err(DomainError::ValidationFailed(format!(
                "{mode} runs need a codebase_description"
            )));
        }
        Ok(())
    }

    /// Discovery input: the dossier's rendering when present, else the transcript.
    pub fn discovery_input(&self) -> DiscoveryInput {
        let transcript = match &self.dossier {
            Some(dossier) => dossier.to_discovery_transcript(),
            None => self.transcript.clone().unwrap_or_default(),
        };
        DiscoveryInput {
            transcript,
            context: self.context.clone(),
        }
    }

    /// Miner input. A codebase description marks an existing system.
    pub fn miner_input(&self) -> MinerInput {
        MinerInput {
            client_name: self.client_name.clone(),
            documents: self.documents.clone().unwrap_or_default(),
            legacy_system: self
                .codebase_description
                .as_deref()
                .is_some_and(|d| !d.trim().is_empty()),
        }
    }

    /// Legacy-analysis input.
    pub fn legacy_input(&self) -> LegacyInput {
        LegacyInput {
            codebase_description: self.codebase_description.clone().unwrap_or_default(),
            code_samples: self.code_samples.clone(),
            known_issues: self.known_issues.clone(),
            change_requirements: self.change_requirements.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_defaults() {
        let input: EngagementInput = serde_yaml::from_str(
            "client_name: Acme\ntranscript: We re-key every order by hand.\n",
        )
        .unwrap();
        assert!((input.hourly_rate - 150.0).abs() < f64::EPSILON);
        assert_eq!(input.project_phase, "requirements_complete");
        assert!(input.validate_for(PipelineMode::Greenfield).is_ok());
    }

    #[test]
    fn test_mode_requirements() {
        let input = EngagementInput::greenfield("Acme", "transcript");
        assert!(input.validate_for(PipelineMode::Brownfield).is_err());
        assert!(input.validate_for(PipelineMode::Greyfield).is_err());

        let input = input.with_codebase("Java monolith");
        assert!(input.validate_for(PipelineMode::Greyfield).is_ok());

        let input = EngagementInput::brownfield("Acme", "COBOL batch");
        assert!(input.validate_for(PipelineMode::Brownfield).is_ok());
        assert!(input.validate_for(PipelineMode::Greenfield).is_err());
    }

    #[test]
    fn test_ingestion_needs_documents() {
        let input = EngagementInput::ingestion("Acme", "Minutes of the kickoff");
        assert!(input.validate_for(PipelineMode::Ingestion).is_ok());
        assert!(!input.miner_input().legacy_system);

        let input = EngagementInput::greenfield("Acme", "transcript");
        let err = input.validate_for(PipelineMode::Ingestion).unwrap_err();
        assert!(err.to_string().contains("need documents"));
    }

    #[test]
    fn test_dossier_replaces_transcript() {
        let dossier: ProjectDossier = serde_json::from_value(serde_json::json!({
            "project_name": "Acme",
            "summary": "Automate order intake."
        }))
        .unwrap();
        let mut input = EngagementInput::greenfield("Acme", "").with_dossier(dossier);
        input.transcript = None;

        assert!(input.validate_for(PipelineMode::Greenfield).is_ok());
        assert_eq!(
            input.discovery_input().transcript,
            "# Project: Acme\n\nAutomate order intake."
        );
    }
}
