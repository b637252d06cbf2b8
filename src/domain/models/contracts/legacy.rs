//! Legacy codebase analysis: seams, debt and constraints.

use serde::{Deserialize, Serialize};

use crate::domain::models::artifact::{ensure, Artifact, FieldSpec};

/// Feathers seam kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeamType {
    /// Polymorphic substitution
    Object,
    /// Swapped at link or import time
    Link,
    /// Swapped by macros or build flags
    Preprocessor,
}

/// Risk of changing code at a seam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Likely to break things
    High,
    /// Needs care
    Medium,
    /// Safe to change
    Low,
}

/// How a piece of debt is worked off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemediationStrategy {
    /// New code beside the old
    Sprout,
    /// New behavior around the old
    Wrap,
    /// Pull the logic out
    Extract,
}

/// C4 model zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum C4Level {
    /// System and its users
    Context,
    /// Deployable units
    Container,
    /// Parts of a container
    Component,
    /// Classes and functions
    Code,
}

/// A place where behavior can change without editing in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeamAnalysis {
    /// Kind of seam
    pub seam_type: SeamType,
    /// File, module or class
    pub location: String,
    /// Risk of changing here
    pub risk_level: RiskLevel,
    /// How to get it under test
    pub test_strategy: String,
    /// Why it is suitable
    pub description: String,
}

/// One piece of technical debt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechDebtItem {
    /// Module holding the debt
    pub module: String,
    /// coupling, complexity, duplication, ...
    pub debt_type: String,
    /// Complexity, when measured
    #[serde(default)]
    pub cyclomatic_complexity: Option<u32>,
    /// Coupling problems
    pub coupling_description: String,
    /// How to work it off
    pub remediation_strategy: RemediationStrategy,
    /// Hours to remediate
    pub estimated_effort_hours: f64,
}

/// A C4 view of the existing system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct C4Diagram {
    /// Zoom level
    pub level: C4Level,
    /// Diagram title
    pub title: String,
    /// Key elements
    #[serde(default)]
    pub elements: Vec<String>,
    /// Key relationships
    #[serde(default)]
    pub relationships: Vec<String>,
    /// Mermaid or PlantUML source
    #[serde(default)]
    pub diagram_code: Option<String>,
}

/// Constraints a change must respect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintList {
    /// Must hold
    #[serde(default)]
    pub hard_constraints: Vec<String>,
    /// Should hold
    #[serde(default)]
    pub soft_constraints: Vec<String>,
    /// Areas that must not be modified
    #[serde(default)]
    pub no_go_zones: Vec<String>,
}

/// Legacy analysis stage artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyAnalysisResult {
    /// Seams found
    #[serde(default)]
    pub seams: Vec<SeamAnalysis>,
    /// Debt found
    #[serde(default)]
    pub tech_debt: Vec<TechDebtItem>,
    /// Views of the system
    #[serde(default)]
    pub c4_diagrams: Vec<C4Diagram>,
    /// Constraints a change must respect
    #[serde(default)]
    pub constraints: ConstraintList,
    /// Executive summary
    pub summary: String,
}

impl Artifact for LegacyAnalysisResult {
    const KIND: &'static str = "LegacyAnalysisResult";

    fn schema() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::optional("seams[].seam_type", "object|link|preprocessor", "Feathers seam type"),
            FieldSpec::optional("seams[].location", "string", "File, module or class of the seam"),
            FieldSpec::optional("seams[].risk_level", "high|medium|low", "Risk of modifying at this seam"),
            FieldSpec::optional("seams[].test_strategy", "string", "How to get the seam under test"),
            FieldSpec::optional("seams[].description", "string", "Why the seam is suitable"),
            FieldSpec::optional("tech_debt[].module", "string", "Module containing the debt"),
            FieldSpec::optional("tech_debt[].debt_type", "string", "coupling, complexity, duplication, ..."),
            FieldSpec::optional("tech_debt[].cyclomatic_complexity", "integer", "Complexity if known"),
            FieldSpec::optional("tech_debt[].coupling_description", "string", "Coupling issues"),
            FieldSpec::optional("tech_debt[].remediation_strategy", "sprout|wrap|extract", "Remediation"),
            FieldSpec::optional("tech_debt[].estimated_effort_hours", "number >= 0", "Hours to remediate"),
            FieldSpec::optional("c4_diagrams[].level", "context|container|component|code", "C4 level"),
            FieldSpec::optional("c4_diagrams[].title", "string", "Diagram title"),
            FieldSpec::optional("c4_diagrams[].elements", "list<string>", "Key elements"),
            FieldSpec::optional("c4_diagrams[].relationships", "list<string>", "Key relationships"),
            FieldSpec::optional("constraints.hard_constraints", "list<string>", "Non-negotiable constraints"),
            FieldSpec::optional("constraints.soft_constraints", "list<string>", "Flexible constraints"),
            FieldSpec::optional("constraints.no_go_zones", "list<string>", "Areas that must not change"),
            FieldSpec::required("summary", "string", "Executive summary of the analysis"),
        ];
        FIELDS
    }

    fn validate(&self) -> Result<(), String> {
        ensure(!self.summary.trim().is_empty(), || "summary must not be empty".to_string())?;
        for (i, debt) in self.tech_debt.iter().enumerate() {
            ensure(debt.estimated_effort_hours >= 0.0, || {
                format!("tech_debt[{i}].estimated_effort_hours must not be negative")
            })?;
        }
        Ok(())
    }
}

/// Constraints merged from a discovery and a legacy analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledConstraints {
    /// Merged constraint list
    pub constraints: ConstraintList,
    /// Apparent conflicts between stakeholder needs and legacy constraints
    pub conflicts: Vec<String>,
}
