//! Built-in agent profiles.
//!
//! One profile per pipeline role, plus the three biased estimators used by
//! ensemble estimation. Framework knowledge is not baked in here; it is
//! appended at execution time from the knowledge provider.

use crate::domain::models::agent::{AgentProfile, AgentRole, EstimatorBias};

/// Tier the estimator runs on. Estimates drive pricing, so they get the
/// strongest model.
pub const ESTIMATOR_TIER: &str = "tier3";

/// Tier the miner runs on. It reads whole documents in one pass, so it gets
/// the long-context model.
pub const MINER_TIER: &str = "tier0";

/// Discovery agent instructions.
pub const DISCOVERY_SYSTEM_PROMPT: &str = r"You are the discovery analyst of a software consultancy.

Read the client transcript and extract the business pain behind it.

- Record only pain the client actually described. Quote them.
- Prefer past behaviour over opinions about the future.
- Put a number on each pain point where the transcript allows: how often it
  happens and what one incident costs. Annualize when both are known.
- Give every pain point a confidence between 0 and 1.
- List stakeholder needs with a priority, the hard constraints you heard,
  and the next steps you would recommend.";

/// Legacy analyst instructions.
pub const LEGACY_SYSTEM_PROMPT: &str = r"You are the legacy systems analyst of a software consultancy.

Study the description and samples of an existing codebase.

- Find seams: places where behaviour can be changed without editing in place.
- Catalogue technical debt per module with a remediation strategy
  (sprout, wrap or extract) and an effort estimate in hours.
- Sketch the system at the C4 context and container levels.
- Separate hard constraints, soft constraints and no-go zones.
- Close with a short summary a non-engineer could follow.";

/// Architect instructions, shared by the refactoring planner.
pub const ARCHITECT_SYSTEM_PROMPT: &str = r"You are the solution architect of a software consultancy.

Design a solution for the validated pain points.

- Build a utility tree of quality attribute scenarios, each rated for
  importance and difficulty (H, M or L).
- Record each architecture decision with the pattern used, the trade-off
  accepted, the alternatives considered and how it can fail.
- Name the integration patterns involved.
- Respect every hard constraint you are given. If a decision bends a soft
  constraint, say so in the trade-off.";

/// Estimator instructions, prefixed with a bias brief in ensemble runs.
pub const ESTIMATOR_SYSTEM_PROMPT: &str = r"You are the estimator of a software consultancy.

Estimate the work implied by the architecture decisions.

- Break the work into tasks and give each a three-point estimate in hours:
  optimistic, most likely, pessimistic.
- expected_hours must equal (O + 4M + P) / 6 and std_dev must equal
  (P - O) / 6, both rounded to two decimals.
- Place the whole estimate on the cone of uncertainty for the current
  project phase.
- total_expected_hours is the sum of the expected hours. total_std_dev is
  the square root of the summed variances. The 90% confidence interval is
  total_expected_hours plus or minus 1.645 standard deviations.
- List risk factors and caveats. Never present a single number as certain.";

/// Synthesis lead instructions.
pub const SYNTHESIS_SYSTEM_PROMPT: &str = r"You are the synthesis lead of a software consultancy.

Combine the pain analysis, architecture and estimate into one engagement
summary.

- Frame the story as situation, complication, question and answer.
- Carry the numbers over unchanged. Do not re-estimate.
- Pull out the key risks, the assumptions the plan rests on and what is
  explicitly out of scope.";

/// Proposal writer instructions.
pub const PROPOSAL_SYSTEM_PROMPT: &str = r"You are the proposal writer of a software consultancy.

Turn the engagement summary into a client proposal.

- Lead with the answer: an executive summary with one to five key benefits.
- Restate the problem in the client's terms before the solution.
- Lay out milestones and delivery phases, recommend a first phase, and
  price the work from the estimate and the hourly rate you are given.
- Keep terms and conditions short and specific.";

/// Miner instructions.
pub const MINER_SYSTEM_PROMPT: &str = r#"You are the fact extractor of a software consultancy.

Read the client's documents and condense them into a project dossier.

- Record only facts the documents state. Do not invent or assume.
- Leave a list empty when the documents say nothing about it.
- Merge duplicates: the same stakeholder, constraint or flow mentioned in
  several places appears once.
- project_name is the client name you are given.
- The summary is exactly two paragraphs: the project's goals, then its
  current state.
- Constraint priority is exactly one of "Must-have", "Should-have" or
  "Nice-to-have".
- Fill legacy_debt_summary only when legacy_system is true; otherwise
  leave it null."#;

const OPTIMIST_BIAS: &str = r"## Estimation bias: optimistic
Estimate the best realistic case. Assume an experienced team, manageable
debt, integrations that behave as documented and stable requirements.
Still use PERT, but let the most likely value lean toward the optimistic one.";

const PESSIMIST_BIAS: &str = r"## Estimation bias: pessimistic
Estimate the worst realistic case. Assume legacy code is worse than
described, integrations hide undocumented behaviour, requirements change at
least once and the team hits one major blocker.
Still use PERT, but let the most likely value lean toward the pessimistic one.";

const REALIST_BIAS: &str = r"## Estimation bias: realist
Estimate what actually happens on projects like this one. Take the outside
view, correct for the planning fallacy by adding 30 to 50 percent to your
first instinct, and multiply legacy integration work by 1.5.";

/// Discovery analyst.
pub fn discovery() -> AgentProfile {
    AgentProfile::new(AgentRole::Discovery, "Discovery", DISCOVERY_SYSTEM_PROMPT)
}

/// Legacy systems analyst.
pub fn legacy() -> AgentProfile {
    AgentProfile::new(AgentRole::Legacy, "Legacy", LEGACY_SYSTEM_PROMPT)
}

/// Solution architect.
pub fn architect() -> AgentProfile {
    AgentProfile::new(AgentRole::Architect, "Architect", ARCHITECT_SYSTEM_PROMPT)
}

/// The architect, briefed to plan an incremental modernization.
pub fn refactoring_planner() -> AgentProfile {
    AgentProfile::new(
        AgentRole::Architect,
        "RefactoringPlanner",
        format!(
            "{ARCHITECT_SYSTEM_PROMPT}\n\nThe system already exists. Prefer incremental \
             strangler-style steps over a rewrite, and keep it running throughout."
        ),
    )
}

/// Single estimator on [`ESTIMATOR_TIER`].
pub fn estimator() -> AgentProfile {
    AgentProfile::new(AgentRole::Estimator, "Estimator", ESTIMATOR_SYSTEM_PROMPT)
        .with_default_model(ESTIMATOR_TIER)
}

/// Estimator whose instructions are prefixed with a bias brief.
pub fn estimator_with_bias(bias: EstimatorBias) -> AgentProfile {
    let (name, brief) = match bias {
        EstimatorBias::Optimist => ("OptimistEstimator", OPTIMIST_BIAS),
        EstimatorBias::Pessimist => ("PessimistEstimator", PESSIMIST_BIAS),
        EstimatorBias::Realist => ("RealistEstimator", REALIST_BIAS),
    };
    AgentProfile::new(
        AgentRole::Estimator,
        name,
        format!("{brief}\n\n{ESTIMATOR_SYSTEM_PROMPT}"),
    )
    .with_default_model(ESTIMATOR_TIER)
}

/// Synthesis lead.
pub fn synthesis() -> AgentProfile {
    AgentProfile::new(AgentRole::Synthesis, "Synthesis", SYNTHESIS_SYSTEM_PROMPT)
}

/// Proposal writer.
pub fn proposal() -> AgentProfile {
    AgentProfile::new(AgentRole::Proposal, "Proposal", PROPOSAL_SYSTEM_PROMPT)
}

/// Document miner on [`MINER_TIER`].
pub fn miner() -> AgentProfile {
    AgentProfile::new(AgentRole::Miner, "Miner", MINER_SYSTEM_PROMPT).with_default_model(MINER_TIER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimators_run_on_tier3() {
        assert_eq!(estimator().default_model, "tier3");
        for bias in [EstimatorBias::Optimist, EstimatorBias::Pessimist, EstimatorBias::Realist] {
            assert_eq!(estimator_with_bias(bias).default_model, "tier3");
        }
        assert_eq!(discovery().default_model, "default");
    }

    #[test]
    fn test_bias_brief_comes_first() {
        let profile = estimator_with_bias(EstimatorBias::Pessimist);
        assert!(profile.system_prompt.starts_with("## Estimation bias: pessimistic"));
        assert!(profile.system_prompt.ends_with(ESTIMATOR_SYSTEM_PROMPT));
        assert_eq!(profile.name, "PessimistEstimator");
    }

    #[test]
    fn test_refactoring_planner_is_an_architect() {
        let planner = refactoring_planner();
        assert_eq!(planner.role, AgentRole::Architect);
        assert!(planner.system_prompt.starts_with(ARCHITECT_SYSTEM_PROMPT));
    }

    #[test]
    fn test_synthesis_and_proposal_share_knowledge() {
        assert_eq!(synthesis().knowledge_role(), proposal().knowledge_role());
    }

    #[test]
    fn test_miner_reads_on_long_context_tier() {
        let miner = miner();
        assert_eq!(miner.role, AgentRole::Miner);
        assert_eq!(miner.default_model, MINER_TIER);
        assert_eq!(miner.knowledge_role(), "miner");
    }
}
