//! Provenance record written once per run, next to the output file.
//!
//! The log captures what produced the output: provider, model, file paths, the
//! exact system instruction (text and SHA-256), the run parameters, and the
//! aggregate token usage of the successful entries. It is written only after
//! the last entry, so an interrupted run leaves no log behind.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use pipeline::{
    CostRates, GenerationParams, RunId, SystemInstruction, Timestamp, TokenCost, TokenCount,
};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::batch::{Pacing, RunSummary};
use crate::error::{Result, RunError};
use crate::retry::RetryPolicy;

/// Hex-encoded SHA-256 of `text`.
pub fn sha256_hex(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Run parameters as recorded in the log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunParams {
    pub max_retries: u32,
    pub base_delay_seconds: f64,
    pub batch_size_for_delay: usize,
    pub batch_delay_seconds: f64,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_rates: Option<CostRates>,
}

/// Aggregate results. Failed entries contribute zero tokens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResults {
    pub entry_count: usize,
    pub failed_entries: usize,
    pub total_input_tokens: TokenCount,
    pub total_output_tokens: TokenCount,
    pub total_tokens: TokenCount,
    /// `null` for an empty batch.
    pub average_tokens_per_entry: Option<f64>,
    /// Omitted when no cost rates are configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<TokenCost>,
    pub execution_time_seconds: f64,
}

/// Everything about a run that is known before it starts.
#[derive(Debug, Clone)]
pub struct RunContext<'a> {
    pub run_id: RunId,
    pub provider: &'a str,
    pub params: &'a GenerationParams,
    pub input_file: &'a Path,
    pub output_file: &'a Path,
    pub system_prompt_file: &'a Path,
    pub instruction: &'a SystemInstruction,
    pub retry: RetryPolicy,
    pub pacing: Pacing,
    pub cost_rates: Option<CostRates>,
}

/// The persisted provenance record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunLog {
    pub run_id: RunId,
    pub date_of_creation: Timestamp,
    pub provider: String,
    pub model: String,
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub system_prompt_file: PathBuf,
    pub system_prompt_sha256: String,
    pub system_prompt_text: String,
    pub run_params: RunParams,
    pub results: RunResults,
}

impl RunLog {
    /// Assembles the log from the run's context and the runner's totals.
    ///
    /// `execution_time` is supplied by the caller so that set-up (loading
    /// input, resolving the provider) can be included.
    pub fn build(ctx: &RunContext<'_>, summary: &RunSummary, execution_time: Duration) -> Self {
        let totals = &summary.totals;
        let prompt_text = ctx.instruction.source_text();

        Self {
            run_id: ctx.run_id,
            date_of_creation: Timestamp::now(),
            provider: ctx.provider.to_string(),
            model: ctx.params.model.to_string(),
            input_file: ctx.input_file.to_path_buf(),
            output_file: ctx.output_file.to_path_buf(),
            system_prompt_file: ctx.system_prompt_file.to_path_buf(),
            system_prompt_sha256: sha256_hex(prompt_text),
            system_prompt_text: prompt_text.to_string(),
            run_params: RunParams {
                max_retries: ctx.retry.max_retries(),
                base_delay_seconds: ctx.pacing.base_delay.as_secs_f64(),
                batch_size_for_delay: ctx.pacing.batch_size,
                batch_delay_seconds: ctx.pacing.batch_delay.as_secs_f64(),
                temperature: ctx.params.temperature,
                max_tokens: ctx.params.max_tokens,
                cost_rates: ctx.cost_rates,
            },
            results: RunResults {
                entry_count: summary.entries_processed,
                failed_entries: summary.entries_failed,
                total_input_tokens: totals.input_tokens(),
                total_output_tokens: totals.output_tokens(),
                total_tokens: totals.total_tokens(),
                average_tokens_per_entry: totals.average_per_entry(summary.entries_processed),
                estimated_cost: ctx.cost_rates.map(|rates| rates.estimate(totals)),
                execution_time_seconds: execution_time.as_secs_f64(),
            },
        }
    }

    /// Path of the log for a run of `model` at `at`: a sibling of the output
    /// file named `run_log_<model>_<YYYYMMDD_HHMMSS>.json`.
    pub fn path_for(output_file: &Path, safe_model: &str, at: DateTime<Local>) -> PathBuf {
        let name = format!("run_log_{}_{}.json", safe_model, at.format("%Y%m%d_%H%M%S"));
        output_file.with_file_name(name)
    }

    /// Writes the log as pretty-printed JSON to `path`, creating parent
    /// directories as needed.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| RunError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| RunError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes the log next to `output_file`, timestamped now. Returns the path.
    pub fn persist(&self, output_file: &Path, safe_model: &str) -> Result<PathBuf> {
        let path = Self::path_for(output_file, safe_model, Local::now());
        self.write_to(&path)?;
        tracing::info!(path = %path.display(), "Run log written");
        Ok(path)
    }
}
