//! Per-run cost ledger with per-model pricing.
//!
//! Every agent and critic call records into one shared ledger. The ledger only
//! grows within a run, latches a `circuit_broken` flag the first time the
//! budget is reached, and is reset explicitly at the start of the next run.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::models::cost::{CostEntry, CostManifest, CostSummary};

/// Pricing per million tokens for a specific model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    /// Cost per million input tokens (USD).
    pub input: f64,
    /// Cost per million output tokens (USD).
    pub output: f64,
}

/// Known model pricing table (costs in USD per million tokens).
const PRICING_TABLE: &[(&str, ModelPricing)] = &[
    ("opus", ModelPricing { input: 15.0, output: 75.0 }),
    ("sonnet", ModelPricing { input: 3.0, output: 15.0 }),
    ("haiku", ModelPricing { input: 0.80, output: 4.0 }),
    ("gpt-4o-mini", ModelPricing { input: 0.15, output: 0.60 }),
    ("gpt-4o", ModelPricing { input: 2.50, output: 10.0 }),
    ("deepseek-reasoner", ModelPricing { input: 0.55, output: 2.19 }),
    ("deepseek", ModelPricing { input: 0.27, output: 1.10 }),
];

/// Get pricing for a model by name or alias.
///
/// Matches against known model name substrings (e.g. "opus" matches
/// "claude-opus-4-20250514"). Earlier table entries win.
pub fn get_model_pricing(model: &str) -> Option<ModelPricing> {
    let model_lower = model.to_lowercase();
    PRICING_TABLE
        .iter()
        .find(|(name, _)| model_lower.contains(name))
        .map(|(_, pricing)| *pricing)
}

/// Cost in USD for the given token counts at the given rates.
pub fn cost_at(pricing: ModelPricing, input_tokens: u64, output_tokens: u64) -> f64 {
    (input_tokens as f64 * pricing.input + output_tokens as f64 * pricing.output) / 1_000_000.0
}

/// Estimate cost in USD for a given set of token counts.
pub fn estimate_cost(model: &str, input_tokens: u64, output_tokens: u64) -> Option<f64> {
    get_model_pricing(model).map(|pricing| cost_at(pricing, input_tokens, output_tokens))
}

#[derive(Debug, Default)]
struct LedgerState {
    summary: CostSummary,
    records: Vec<CostEntry>,
    circuit_broken: bool,
}

/// Shared, clonable handle on the run's cost ledger.
#[derive(Debug, Clone)]
pub struct CostLedger {
    max_cost_usd: f64,
    state: Arc<RwLock<LedgerState>>,
}

impl CostLedger {
    /// Empty ledger capped at `max_cost_usd`.
    pub fn new(max_cost_usd: f64) -> Self {
        Self {
            max_cost_usd,
            state: Arc::new(RwLock::new(LedgerState::default())),
        }
    }

    /// Budget cap in USD.
    pub const fn max_cost_usd(&self) -> f64 {
        self.max_cost_usd
    }

    /// Record one call. Returns `true` while the run is still within budget.
    pub async fn record(&self, mut entry: CostEntry) -> bool {
        if entry.cost_usd < 0.0 || !entry.cost_usd.is_finite() {
            tracing::warn!(
                agent = %entry.agent,
                cost_usd = entry.cost_usd,
                "Ignoring invalid cost on ledger entry"
            );
            entry.cost_usd = 0.0;
        }

        let mut state = self.state.write().await;
        state.summary.add(&entry);
        state.records.push(entry);

        let exceeded = state.summary.total_usd >= self.max_cost_usd;
        if exceeded && !state.circuit_broken {
            state.circuit_broken = true;
            tracing::warn!(
                total_usd = state.summary.total_usd,
                max_cost_usd = self.max_cost_usd,
                "Cost budget exhausted, circuit breaker tripped"
            );
        }
        !exceeded
    }

    /// Spend so far.
    pub async fn total_usd(&self) -> f64 {
        self.state.read().await.summary.total_usd
    }

    /// Budget left, never negative.
    pub async fn remaining_usd(&self) -> f64 {
        (self.max_cost_usd - self.total_usd().await).max(0.0)
    }

    /// At or over budget.
    pub async fn is_exceeded(&self) -> bool {
        self.total_usd().await >= self.max_cost_usd
    }

    /// Whether a call costing `estimated_usd` would stay under budget.
    pub async fn can_afford(&self, estimated_usd: f64) -> bool {
        self.total_usd().await + estimated_usd < self.max_cost_usd
    }

    /// Whether the budget was reached during this run.
    pub async fn circuit_broken(&self) -> bool {
        self.state.read().await.circuit_broken
    }

    /// Zero the ledger for a new run.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        *state = LedgerState::default();
    }

    /// Running totals.
    pub async fn summary(&self) -> CostSummary {
        self.state.read().await.summary.clone()
    }

    /// Totals, breakdowns and every record, for the run directory.
    pub async fn manifest(&self) -> CostManifest {
        let state = self.state.read().await;
        let total = state.summary.total_usd;
        let budget_used_percent = if self.max_cost_usd > 0.0 {
            total / self.max_cost_usd * 100.0
        } else {
            0.0
        };

        CostManifest {
            max_cost_usd: self.max_cost_usd,
            total_cost_usd: total,
            remaining_usd: (self.max_cost_usd - total).max(0.0),
            budget_used_percent,
            circuit_broken: state.circuit_broken,
            total_input_tokens: state.summary.total_input_tokens,
            total_output_tokens: state.summary.total_output_tokens,
            by_agent: state.summary.by_agent.clone(),
            by_stage: state.summary.by_stage.clone(),
            by_model: state.summary.by_model.clone(),
            detailed_records: state.records.clone(),
        }
    }
}
