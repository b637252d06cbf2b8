//! `meta-factory run`: one pipeline over one engagement input file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::adapters::knowledge::Librarian;
use crate::adapters::providers::build_provider;
use crate::cli::output::{create_spinner, list_table, output, style_status, truncate, CommandOutput};
use crate::domain::models::config::Config;
use crate::domain::models::engagement::EngagementInput;
use crate::domain::models::run::{PipelineMode, RunResult, RunStatus};
use crate::domain::ports::TokenUsage;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::LoggerImpl;
use crate::infrastructure::persistence::RunWriter;
use crate::services::pipelines::{pipeline_for, SwarmContext};

/// Arguments of `meta-factory run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Pipeline mode (greenfield, brownfield, greyfield, ingestion)
    #[arg(short, long)]
    pub mode: PipelineMode,

    /// Engagement input file (.yaml, .yml or .json)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Override the run budget in USD
    #[arg(short, long)]
    pub budget: Option<f64>,

    /// Use a single estimator instead of the optimist/pessimist/realist ensemble
    #[arg(long)]
    pub no_ensemble: bool,

    /// Directory run artifacts are written under
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Load configuration from this file instead of .meta-factory/
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Client documents to mine, appended to the input's `documents` (ingestion)
    #[arg(long, num_args = 1..)]
    pub documents: Vec<PathBuf>,
}

impl RunArgs {
    /// Configuration with this invocation's overrides applied.
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        if let Some(budget) = self.budget {
            config.budget.max_cost_usd = budget;
        }
        if self.no_ensemble {
            config.estimation.ensemble = false;
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir.clone_from(dir);
        }
        ConfigLoader::validate(&config).context("Invalid configuration after command-line overrides")?;
        Ok(config)
    }
}

/// One line of the stage table.
#[derive(Debug, Serialize)]
pub struct StageRow {
    /// Stage name
    pub stage: String,
    /// passed, failed, escalated or derived
    pub status: String,
    /// Score of the last verdict
    pub score: Option<f64>,
    /// Verdicts the critic returned
    pub iterations: usize,
    /// Objections in the last verdict
    pub objections: usize,
}

/// What `run` reports once the pipeline finishes.
#[derive(Debug, Serialize)]
pub struct RunOutput {
    /// Run identifier
    pub run_id: String,
    /// Pipeline mode
    pub mode: String,
    /// Terminal status
    pub status: String,
    /// Spend in USD
    pub cost_usd: f64,
    /// Budget cap in USD
    pub max_cost_usd: f64,
    /// Tokens across the run
    pub token_usage: TokenUsage,
    /// Per-stage summary
    pub stages: Vec<StageRow>,
    /// Number of escalations
    pub escalations: usize,
    /// Where artifacts were written
    pub output_dir: PathBuf,
    /// `kind: message` when the run failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunOutput {
    /// Summarize `result`, written under `output_dir`.
    pub fn new(result: &RunResult, output_dir: PathBuf) -> Self {
        let stages = result
            .stage_order
            .iter()
            .map(|stage| {
                let verdicts = result.critic_logs.get(stage);
                let last = verdicts.and_then(|v| v.last());
                let escalated = result.escalations.iter().any(|e| &e.stage == stage);
                let status = match (escalated, last) {
                    (true, _) => "escalated",
                    (false, Some(v)) if v.passed => "passed",
                    (false, Some(_)) => "failed",
                    (false, None) => "derived",
                };
                StageRow {
                    stage: stage.clone(),
                    status: status.to_string(),
                    score: last.map(|v| v.score),
                    iterations: verdicts.map_or(0, Vec::len),
                    objections: last.map_or(0, |v| v.objections.len()),
                }
            })
            .collect();

        Self {
            run_id: result.run_id.clone(),
            mode: result.mode.to_string(),
            status: result.status.to_string(),
            cost_usd: result.cost_usd,
            max_cost_usd: result.cost.max_cost_usd,
            token_usage: result.token_usage,
            stages,
            escalations: result.escalations.len(),
            output_dir,
            error: result.error.as_ref().map(|e| format!("{}: {}", e.kind, e.message)),
        }
    }
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["stage", "status", "score", "iterations", "objections"]);
        for row in &self.stages {
            table.add_row(vec![
                row.stage.clone(),
                style_status(&row.status).to_string(),
                row.score.map_or_else(|| "-".to_string(), |s| format!("{s:.2}")),
                row.iterations.to_string(),
                row.objections.to_string(),
            ]);
        }

        let mut lines = vec![
            format!(
                "Run {} ({}): {}",
                self.run_id,
                self.mode,
                style_status(&self.status)
            ),
            String::new(),
            table.to_string(),
            String::new(),
            format!(
                "Cost: ${:.4} of ${:.2}  Tokens: {} in / {} out",
                self.cost_usd, self.max_cost_usd, self.token_usage.input_tokens, self.token_usage.output_tokens
            ),
        ];
        if self.escalations > 0 {
            lines.push(format!("Escalations: {} (see escalations.json)", self.escalations));
        }
        if let Some(error) = &self.error {
            lines.push(format!("Error: {}", truncate(error, 200)));
        }
        lines.push(format!("Artifacts: {}", self.output_dir.display()));
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Parse an engagement input by file extension: `.json` as JSON, anything
/// else as YAML.
pub fn parse_engagement(path: &Path, text: &str) -> Result<EngagementInput> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(text).with_context(|| format!("Invalid JSON engagement input in {}", path.display()))
    } else {
        serde_yaml::from_str(text).with_context(|| format!("Invalid YAML engagement input in {}", path.display()))
    }
}

/// Read `paths` and join them into one document set, each under a
/// `## {file name}` heading, separated by `---` rules.
pub async fn read_documents(paths: &[PathBuf]) -> Result<String> {
    let mut sections = Vec::with_capacity(paths.len());
    for path in paths {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read document {}", path.display()))?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        sections.push(format!("## {name}\n\n{}", text.trim()));
    }
    Ok(sections.join("\n\n---\n\n"))
}

/// Load config and input, run the selected pipeline and write its artifacts.
pub async fn execute(args: RunArgs, json_mode: bool) -> Result<()> {
    let config = args.resolve_config()?;
    let _logger = LoggerImpl::init(&config.logging).context("Failed to initialize logging")?;

    let text = tokio::fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("Failed to read input file {}", args.input.display()))?;
    let mut input = parse_engagement(&args.input, &text)?;
    if !args.documents.is_empty() {
        let documents = read_documents(&args.documents).await?;
        input.documents = Some(match input.documents.take() {
            Some(existing) if !existing.trim().is_empty() => format!("{existing}\n\n---\n\n{documents}"),
            _ => documents,
        });
    }
    input
        .validate_for(args.mode)
        .with_context(|| format!("Input is not usable for a {} run", args.mode))?;

    let provider = build_provider(&config.provider, &config.pricing)
        .with_context(|| format!("Failed to configure the {} provider", config.provider.kind))?;
    let knowledge = Librarian::new(&config.knowledge.cheat_sheets_dir);
    let output_dir = config.output.dir.clone();
    let ctx = SwarmContext::new(config, provider, Arc::new(knowledge));

    let spinner = (!json_mode).then(|| create_spinner(format!("Running {} pipeline for {}", args.mode, input.client_name)));
    let result = pipeline_for(args.mode, ctx).run_pipeline(input).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let run_dir = RunWriter::write(&result, &output_dir)
        .await
        .context("Failed to write run artifacts")?;
    output(&RunOutput::new(&result, run_dir), json_mode);

    if result.status == RunStatus::Error {
        let detail = result
            .error
            .map_or_else(|| "unknown error".to_string(), |e| format!("{}: {}", e.kind, e.message));
        anyhow::bail!("Run {} ended with an error ({detail})", result.run_id);
    }
    Ok(())
}
