//! Common test utilities for integration tests
//!
//! Canned agent output, scripted-provider builders and a swarm context that
//! runs without any cheat sheets on disk.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use meta_factory::adapters::knowledge::Librarian;
use meta_factory::adapters::providers::{MockResponse, ScriptedProvider};
use meta_factory::{Config, SwarmContext};
use serde_json::{json, Value};

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Config with the single realist estimator.
pub fn sequential_config() -> Config {
    let mut config = Config::default();
    config.estimation.ensemble = false;
    config
}

pub fn context(provider: Arc<ScriptedProvider>, config: Config) -> SwarmContext {
    SwarmContext::new(config, provider, Arc::new(Librarian::in_memory(HashMap::new())))
}

pub fn ok(value: &Value) -> MockResponse {
    MockResponse::success(value.to_string())
}

pub fn pass() -> MockResponse {
    ok(&json!({"passed": true, "score": 0.9, "summary": "Ready", "objections": []}))
}

/// Failing verdict carrying one major objection.
pub fn fail_with(description: &str) -> MockResponse {
    ok(&json!({
        "passed": false,
        "score": 0.4,
        "summary": "Needs work",
        "objections": [{
            "category": "completeness",
            "description": description,
            "severity": "major"
        }]
    }))
}

/// Architecture, estimation, synthesis and proposal, each passing first time.
pub fn passing_tail() -> Vec<MockResponse> {
    vec![
        ok(&architecture()),
        pass(),
        ok(&estimation(12.0)),
        pass(),
        ok(&engagement_summary()),
        pass(),
        ok(&proposal()),
        pass(),
    ]
}

pub fn pain_matrix() -> Value {
    json!({
        "pain_points": [{
            "description": "Orders re-keyed by hand",
            "frequency": "daily",
            "cost_per_incident": 40.0,
            "annual_cost": 10400.0,
            "source_quote": "we type every order twice",
            "confidence": 0.9
        }],
        "stakeholder_needs": [{"role": "COO", "need": "Real-time order API", "priority": "high"}],
        "key_constraints": ["GDPR"]
    })
}

pub fn legacy_analysis() -> Value {
    json!({
        "tech_debt": [{
            "module": "orders",
            "debt_type": "coupling",
            "coupling_description": "shares tables with billing",
            "remediation_strategy": "wrap",
            "estimated_effort_hours": 10.0
        }],
        "constraints": {"hard_constraints": ["Batch only nightly export"]},
        "summary": "Monolithic order system on Oracle"
    })
}

pub fn architecture() -> Value {
    json!({
        "utility_tree": {"scenarios": [{
            "attribute": "modifiability",
            "scenario": "Add a sales channel in under a week",
            "importance": "H",
            "difficulty": "M"
        }]},
        "decisions": [{
            "decision": "Introduce an order intake service",
            "context": "Orders arrive from three channels",
            "pattern_used": "Message Router",
            "trade_off": "One more deployable",
            "alternatives_considered": ["Extend the monolith"]
        }],
        "integration_patterns": ["Message Router"]
    })
}

/// Single-task estimation with the given expected hours and a spread of 6.
pub fn estimation(expected: f64) -> Value {
    json!({
        "pert_estimates": [{
            "task": "Order intake service",
            "optimistic_hours": expected - 3.0,
            "likely_hours": expected,
            "pessimistic_hours": expected + 3.0,
            "expected_hours": expected,
            "std_dev": 1.0
        }],
        "cone_of_uncertainty": {
            "phase": "requirements_complete",
            "low_multiplier": 0.5,
            "high_multiplier": 2.0,
            "base_estimate": expected,
            "range_low": expected * 0.5,
            "range_high": expected * 2.0
        },
        "total_expected_hours": expected,
        "total_std_dev": 1.0,
        "confidence_interval_90": [expected - 1.645, expected + 1.645]
    })
}

pub fn engagement_summary() -> Value {
    json!({
        "scqa": {
            "situation": "Orders arrive through three channels",
            "complication": "Each is re-keyed by hand",
            "question": "How do we automate intake?",
            "answer": "A dedicated intake service"
        },
        "pain_matrix": pain_matrix(),
        "architecture_decisions": architecture()["decisions"].clone(),
        "estimates": estimation(12.0)["pert_estimates"].clone(),
        "total_estimate": estimation(12.0)["cone_of_uncertainty"].clone()
    })
}

pub fn proposal() -> Value {
    json!({
        "title": "Order intake automation",
        "client_name": "Acme",
        "executive_summary": {
            "bottom_line": "Stop re-keying orders",
            "key_benefits": ["Fewer errors"],
            "investment_summary": "About 12 hours",
            "recommended_action": "Start phase one"
        },
        "engagement_summary": engagement_summary(),
        "problem_statement": "Orders are typed twice",
        "proposed_solution": "An intake service",
        "technical_approach": "Message router in front of the monolith",
        "milestones": [{
            "name": "Intake live",
            "description": "Channel orders flow through the service",
            "deliverables": ["Service"],
            "estimated_hours": 12.0
        }],
        "timeline_weeks": 2,
        "investment": "$1,800"
    })
}
