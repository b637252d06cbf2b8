//! Cost records kept by the ledger.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One LLM call as seen by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEntry {
    /// Agent or critic that made the call
    pub agent: String,
    /// Pipeline stage the call belongs to
    pub stage: String,
    /// Model that served the call
    pub model: String,
    /// Prompt tokens
    pub input_tokens: u64,
    /// Generated tokens
    pub output_tokens: u64,
    /// Cost in USD, never negative once recorded
    pub cost_usd: f64,
    /// When the ledger saw the call
    pub recorded_at: DateTime<Utc>,
}

impl CostEntry {
    /// Zero-cost entry stamped now.
    pub fn new(agent: impl Into<String>, stage: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            stage: stage.into(),
            model: model.into(),
            input_tokens: 0,
            output_tokens: 0,
            cost_usd: 0.0,
            recorded_at: Utc::now(),
        }
    }

    /// Set the token counts.
    pub const fn with_tokens(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.input_tokens = input_tokens;
        self.output_tokens = output_tokens;
        self
    }

    /// Set the USD cost.
    pub const fn with_cost(mut self, cost_usd: f64) -> Self {
        self.cost_usd = cost_usd;
        self
    }
}

/// Totals for one breakdown bucket (agent, stage or model).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBucket {
    /// Number of calls
    pub calls: u32,
    /// Prompt tokens
    pub input_tokens: u64,
    /// Generated tokens
    pub output_tokens: u64,
    /// Spend in USD
    pub cost_usd: f64,
}

impl CostBucket {
    fn add(&mut self, entry: &CostEntry) {
        self.calls += 1;
        self.input_tokens += entry.input_tokens;
        self.output_tokens += entry.output_tokens;
        self.cost_usd += entry.cost_usd;
    }
}

/// Aggregated view of the ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    /// Total spend in USD
    pub total_usd: f64,
    /// Total prompt tokens
    pub total_input_tokens: u64,
    /// Total generated tokens
    pub total_output_tokens: u64,
    /// Number of recorded calls
    pub call_count: u32,
    /// Breakdown by agent or critic name
    pub by_agent: BTreeMap<String, CostBucket>,
    /// Breakdown by stage
    pub by_stage: BTreeMap<String, CostBucket>,
    /// Breakdown by model
    pub by_model: BTreeMap<String, CostBucket>,
}

impl CostSummary {
    /// Fold one call into the totals and every breakdown.
    pub fn add(&mut self, entry: &CostEntry) {
        self.total_usd += entry.cost_usd;
        self.total_input_tokens += entry.input_tokens;
        self.total_output_tokens += entry.output_tokens;
        self.call_count += 1;
        self.by_agent.entry(entry.agent.clone()).or_default().add(entry);
        self.by_stage.entry(entry.stage.clone()).or_default().add(entry);
        self.by_model.entry(entry.model.clone()).or_default().add(entry);
    }

    /// Format as a human-readable summary.
    pub fn format_summary(&self) -> String {
        let mut s = format!(
            "Cost: ${:.4} ({} calls, {}K input, {}K output)",
            self.total_usd,
            self.call_count,
            self.total_input_tokens / 1000,
            self.total_output_tokens / 1000,
        );

        if self.by_stage.len() > 1 {
            s.push_str("\n  By stage:");
            let mut stages: Vec<_> = self.by_stage.iter().collect();
            stages.sort_by(|a, b| {
                b.1.cost_usd
                    .partial_cmp(&a.1.cost_usd)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            for (stage, bucket) in stages {
                s.push_str(&format!("\n    {}: ${:.4}", stage, bucket.cost_usd));
            }
        }

        s
    }
}

/// Serializable cost report written next to a run's artifacts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostManifest {
    /// Budget cap of the run
    pub max_cost_usd: f64,
    /// Total spend
    pub total_cost_usd: f64,
    /// `max(0, max - total)`
    pub remaining_usd: f64,
    /// Spend as a percentage of the cap
    pub budget_used_percent: f64,
    /// Whether the cap was reached at any point in the run
    pub circuit_broken: bool,
    /// Total prompt tokens
    pub total_input_tokens: u64,
    /// Total generated tokens
    pub total_output_tokens: u64,
    /// Breakdown by agent or critic name
    pub by_agent: BTreeMap<String, CostBucket>,
    /// Breakdown by stage
    pub by_stage: BTreeMap<String, CostBucket>,
    /// Breakdown by model
    pub by_model: BTreeMap<String, CostBucket>,
    /// Every call in recording order
    pub detailed_records: Vec<CostEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_breakdowns() {
        let mut summary = CostSummary::default();
        summary.add(&CostEntry::new("Discovery", "discovery", "sonnet").with_tokens(1000, 200).with_cost(0.006));
        summary.add(&CostEntry::new("critic(discovery)", "discovery", "haiku").with_tokens(800, 100).with_cost(0.001));
        summary.add(&CostEntry::new("Architect", "architecture", "sonnet").with_tokens(2000, 400).with_cost(0.012));

        assert_eq!(summary.call_count, 3);
        assert_eq!(summary.by_stage["discovery"].calls, 2);
        assert_eq!(summary.by_model["sonnet"].input_tokens, 3000);
        assert!((summary.total_usd - 0.019).abs() < 1e-9);
        assert!(summary.format_summary().contains("By stage:"));
    }
}
