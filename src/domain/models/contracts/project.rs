//! Project dossier: the condensed facts mined from a client's documents.
//!
//! A dossier can stand in for a transcript. Its discovery rendering is what a
//! greenfield or greyfield run feeds the discovery agent when the engagement
//! input carries a dossier instead of a meeting transcript.

use serde::{Deserialize, Serialize};

use super::inputs::DiscoveryInput;
use crate::domain::models::artifact::{ensure, Artifact, FieldSpec};

/// MoSCoW-style priority of a technical constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintPriority {
    /// Non-negotiable
    #[serde(rename = "Must-have", alias = "must-have", alias = "must_have")]
    MustHave,
    /// Expected unless there is a good reason
    #[serde(rename = "Should-have", alias = "should-have", alias = "should_have")]
    ShouldHave,
    /// Desirable
    #[serde(rename = "Nice-to-have", alias = "nice-to-have", alias = "nice_to_have")]
    NiceToHave,
}

impl ConstraintPriority {
    /// Label as it appears in documents and prompts.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MustHave => "Must-have",
            Self::ShouldHave => "Should-have",
            Self::NiceToHave => "Nice-to-have",
        }
    }
}

/// A person with a stake in the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stakeholder {
    /// Who they are
    pub name: String,
    /// Their function
    pub role: String,
    /// What they worry about
    #[serde(default)]
    pub concerns: Vec<String>,
}

/// A technical requirement found in the documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechConstraint {
    /// Database, Frontend, Security, ...
    pub category: String,
    /// What must hold
    pub requirement: String,
    /// MoSCoW-style weight
    pub priority: ConstraintPriority,
}

/// A business or technical flow: what starts it, what happens, what results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreLogicFlow {
    /// What starts the flow
    pub trigger: String,
    /// What happens
    pub process: String,
    /// What results
    pub outcome: String,
}

/// Condensed source of truth about a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDossier {
    /// Name of the project
    pub project_name: String,
    /// Two paragraphs on goals and current state
    pub summary: String,
    /// People involved
    #[serde(default)]
    pub stakeholders: Vec<Stakeholder>,
    /// Technologies named in the documents
    #[serde(default)]
    pub tech_stack_detected: Vec<String>,
    /// Technical requirements
    #[serde(default)]
    pub constraints: Vec<TechConstraint>,
    /// Business flows
    #[serde(default)]
    pub logic_flows: Vec<CoreLogicFlow>,
    /// Only meaningful when an existing system is involved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_debt_summary: Option<String>,
}

impl ProjectDossier {
    /// Render the dossier as markdown in place of a meeting transcript.
    ///
    /// Empty sections are left out; sections are separated by a blank line.
    pub fn to_discovery_transcript(&self) -> String {
        let mut sections = vec![format!("# Project: {}\n\n{}", self.project_name, self.summary)];

        if !self.stakeholders.is_empty() {
            let lines: Vec<String> = self
                .stakeholders
                .iter()
                .map(|s| {
                    let concerns = if s.concerns.is_empty() {
                        "none stated".to_string()
                    } else {
                        s.concerns.join(", ")
                    };
                    format!("- **{}** ({}): {concerns}", s.name, s.role)
                })
                .collect();
            sections.push(format!("## Stakeholders\n{}", lines.join("\n")));
        }

        if !self.tech_stack_detected.is_empty() {
            sections.push(format!("## Tech Stack\n{}", self.tech_stack_detected.join(", ")));
        }

        if !self.constraints.is_empty() {
            let lines: Vec<String> = self
                .constraints
                .iter()
                .map(|c| format!("- [{}] {}: {}", c.priority.as_str(), c.category, c.requirement))
                .collect();
            sections.push(format!("## Constraints\n{}", lines.join("\n")));
        }

        if !self.logic_flows.is_empty() {
            let lines: Vec<String> = self
                .logic_flows
                .iter()
                .map(|f| {
                    format!(
                        "- **Trigger:** {} → **Process:** {} → **Outcome:** {}",
                        f.trigger, f.process, f.outcome
                    )
                })
                .collect();
            sections.push(format!("## Core Flows\n{}", lines.join("\n")));
        }

        if let Some(debt) = self.legacy_debt_summary.as_deref().filter(|d| !d.trim().is_empty()) {
            sections.push(format!("## Legacy / Tech Debt\n{debt}"));
        }

        sections.join("\n\n")
    }
}

impl From<&ProjectDossier> for DiscoveryInput {
    fn from(dossier: &ProjectDossier) -> Self {
        Self {
            transcript: dossier.to_discovery_transcript(),
            context: None,
        }
    }
}

impl Artifact for ProjectDossier {
    const KIND: &'static str = "ProjectDossier";

    fn schema() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::required("project_name", "string", "The client name from the input"),
            FieldSpec::required("summary", "string", "Exactly two paragraphs on goals and current state"),
            FieldSpec::optional("stakeholders[].name", "string", "Person or group"),
            FieldSpec::optional("stakeholders[].role", "string", "Their role in the project"),
            FieldSpec::optional("stakeholders[].concerns", "list<string>", "What they care about"),
            FieldSpec::optional("tech_stack_detected", "list<string>", "Technologies named in the documents"),
            FieldSpec::optional("constraints[].category", "string", "Database, Frontend, Security, ..."),
            FieldSpec::optional("constraints[].requirement", "string", "The requirement itself"),
            FieldSpec::optional(
                "constraints[].priority",
                "Must-have|Should-have|Nice-to-have",
                "How binding the constraint is",
            ),
            FieldSpec::optional("logic_flows[].trigger", "string", "What starts the flow"),
            FieldSpec::optional("logic_flows[].process", "string", "What happens"),
            FieldSpec::optional("logic_flows[].outcome", "string", "What results"),
            FieldSpec::optional("legacy_debt_summary", "string|null", "Only when an existing system is involved"),
        ];
        FIELDS
    }

    fn validate(&self) -> Result<(), String> {
        ensure(!self.project_name.trim().is_empty(), || "project_name must not be empty".to_string())?;
        ensure(!self.summary.trim().is_empty(), || "summary must not be empty".to_string())?;
        for (i, stakeholder) in self.stakeholders.iter().enumerate() {
            ensure(!stakeholder.name.trim().is_empty(), || format!("stakeholders[{i}].name must not be empty"))?;
        }
        Ok(())
    }
}

/// What the miner reads: the raw documents and who they are about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinerInput {
    /// Client the documents belong to
    pub client_name: String,
    /// Concatenated document text
    pub documents: String,
    /// Whether an existing system is in scope, which enables `legacy_debt_summary`
    pub legacy_system: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dossier() -> ProjectDossier {
        ProjectDossier {
            project_name: "Acme".to_string(),
            summary: "Automate order intake.".to_string(),
            stakeholders: vec![
                Stakeholder {
                    name: "Dana".to_string(),
                    role: "COO".to_string(),
                    concerns: vec!["error rate".to_string(), "cost".to_string()],
                },
                Stakeholder {
                    name: "Lee".to_string(),
                    role: "Ops".to_string(),
                    concerns: Vec::new(),
                },
            ],
            tech_stack_detected: vec!["Oracle".to_string(), "Java".to_string()],
            constraints: vec![TechConstraint {
                category: "Security".to_string(),
                requirement: "GDPR".to_string(),
                priority: ConstraintPriority::MustHave,
            }],
            logic_flows: vec![CoreLogicFlow {
                trigger: "Email order".to_string(),
                process: "Re-keyed".to_string(),
                outcome: "ERP entry".to_string(),
            }],
            legacy_debt_summary: Some("Shared tables with billing".to_string()),
        }
    }

    #[test]
    fn test_transcript_sections() {
        let transcript = dossier().to_discovery_transcript();
        let sections: Vec<&str> = transcript.split("\n\n").collect();

        assert_eq!(sections[0], "# Project: Acme");
        assert_eq!(sections[1], "Automate order intake.");
        assert_eq!(
            sections[2],
            "## Stakeholders\n- **Dana** (COO): error rate, cost\n- **Lee** (Ops): none stated"
        );
        assert_eq!(sections[3], "## Tech Stack\nOracle, Java");
        assert_eq!(sections[4], "## Constraints\n- [Must-have] Security: GDPR");
        assert_eq!(
            sections[5],
            "## Core Flows\n- **Trigger:** Email order → **Process:** Re-keyed → **Outcome:** ERP entry"
        );
        assert_eq!(sections[6], "## Legacy / Tech Debt\nShared tables with billing");
    }

    #[test]
    fn test_empty_sections_omitted() {
        let bare = ProjectDossier {
            stakeholders: Vec::new(),
            tech_stack_detected: Vec::new(),
            constraints: Vec::new(),
            logic_flows: Vec::new(),
            legacy_debt_summary: None,
            ..dossier()
        };
        assert_eq!(bare.to_discovery_transcript(), "# Project: Acme\n\nAutomate order intake.");
        assert_eq!(DiscoveryInput::from(&bare).transcript, bare.to_discovery_transcript());
    }

    #[test]
    fn test_priority_labels() {
        let constraint: TechConstraint = serde_json::from_value(serde_json::json!({
            "category": "Database", "requirement": "Stay on Oracle", "priority": "Should-have"
        }))
        .unwrap();
        assert_eq!(constraint.priority, ConstraintPriority::ShouldHave);
        assert!(serde_json::from_value::<TechConstraint>(serde_json::json!({
            "category": "Database", "requirement": "x", "priority": "Optional"
        }))
        .is_err());
    }

    #[test]
    fn test_blank_summary_rejected() {
        let mut bad = dossier();
        bad.summary = " ".to_string();
        assert_eq!(bad.validate().unwrap_err(), "summary must not be empty");
    }
}
