//! Writes a finished run to disk, one JSON document per stage.
//!
//! Layout under `{base_dir}/{run_id}/`:
//! - `{stage}.json` for every recorded artifact
//! - `run_metadata.json`
//! - `escalations.json` (only when the run escalated something)
//! - `critic_logs.json` (only when any stage was reviewed)
//! - `cost_manifest.json`

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::critique::Objection;
use crate::domain::models::run::{RunError, RunResult};
use crate::domain::ports::TokenUsage;

#[derive(Debug, Serialize)]
struct RunMetadata<'a> {
    run_id: &'a str,
    mode: &'a str,
    status: &'a str,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    token_usage: &'a TokenUsage,
    cost_usd: f64,
    escalations: usize,
    artifacts: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a RunError>,
}

#[derive(Debug, Serialize)]
struct EscalationRecord<'a> {
    stage: &'a str,
    reason: &'a str,
    suggested_resolution: Option<&'a str>,
    objection_count: usize,
    objections: &'a [Objection],
}

/// Persists [`RunResult`]s as JSON files.
pub struct RunWriter;

impl RunWriter {
    /// Write `result` under `base_dir` and return the run directory.
    pub async fn write(result: &RunResult, base_dir: impl AsRef<Path>) -> DomainResult<PathBuf> {
        let run_dir = base_dir.as_ref().join(&result.run_id);
        tokio::fs::create_dir_all(&run_dir)
            .await
            .map_err(|e| persistence_error(&run_dir, &e))?;

        for stage in &result.stage_order {
            if let Some(artifact) = result.artifacts.get(stage) {
                write_json(&run_dir.join(format!("{stage}.json")), artifact).await?;
            }
        }

        let metadata = RunMetadata {
            run_id: &result.run_id,
            mode: result.mode.as_str(),
            status: result.status.as_str(),
            started_at: result.started_at,
            completed_at: result.completed_at,
            token_usage: &result.token_usage,
            cost_usd: result.cost_usd,
            escalations: result.escalations.len(),
            artifacts: &result.stage_order,
            error: result.error.as_ref(),
        };
        write_json(&run_dir.join("run_metadata.json"), &metadata).await?;

        if !result.escalations.is_empty() {
            let records: Vec<EscalationRecord<'_>> = result
                .escalations
                .iter()
                .map(|e| EscalationRecord {
                    stage: &e.stage,
                    reason: &e.reason,
                    suggested_resolution: e.suggested_resolution.as_deref(),
                    objection_count: e.objections.len(),
                    objections: &e.objections,
                })
                .collect();
            write_json(&run_dir.join("escalations.json"), &records).await?;
        }

        if !result.critic_logs.is_empty() {
            write_json(&run_dir.join("critic_logs.json"), &result.critic_logs).await?;
        }

        write_json(&run_dir.join("cost_manifest.json"), &result.cost).await?;

        tracing::info!(
            run_id = %result.run_id,
            path = %run_dir.display(),
            artifacts = result.stage_order.len(),
            "Run artifacts written"
        );
        Ok(run_dir)
    }
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> DomainResult<()> {
    let body = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, body)
        .await
        .map_err(|e| persistence_error(path, &e))
}

fn persistence_error(path: &Path, err: &std::io::Error) -> DomainError {
    DomainError::Persistence(format!("{}: {err}", path.display()))
}
