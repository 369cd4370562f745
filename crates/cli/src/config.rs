//! Job configuration: the YAML file that describes one batch run.
//!
//! ```yaml
//! provider: anthropic
//! paths:
//!   input_json: data/entries.json
//!   system_prompt: data/prompts/system.txt
//!   output: output/{PROVIDER}/{MODEL}.ttl
//! generation:
//!   model: claude-sonnet-4-5
//!   max_tokens: 4096
//!   temperature: 0
//! run:
//!   max_retries: 3
//!   base_delay_seconds: 0
//!   batch_size: 0
//!   batch_delay_seconds: 0
//! cost:
//!   input_per_1m: 3.0
//!   output_per_1m: 15.0
//! ```
//!
//! Relative paths are resolved against the directory containing the config
//! file. In path templates `{PROVIDER}` becomes the lower-cased provider name
//! and `{MODEL}` the file-safe model name.

use std::path::{Path, PathBuf};
use std::time::Duration;

use pipeline::{CostRates, GenerationParams, ModelId};
use runner::{Pacing, RetryPolicy};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading or validating the job configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// File schema
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FileConfig {
    provider: String,
    paths: PathsConfig,
    generation: GenerationConfig,
    #[serde(default)]
    run: RunConfig,
    #[serde(default)]
    cost: Option<CostConfig>,
}

#[derive(Debug, Deserialize)]
struct PathsConfig {
    input_json: String,
    system_prompt: String,
    #[serde(alias = "output_rdf")]
    output: String,
}

#[derive(Debug, Deserialize)]
struct GenerationConfig {
    model: String,
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,
    #[serde(default)]
    temperature: f32,
}

fn default_max_tokens() -> u32 {
    4096
}

#[derive(Debug, Deserialize)]
struct RunConfig {
    #[serde(default = "default_max_retries")]
    max_retries: u32,
    #[serde(default)]
    base_delay_seconds: f64,
    /// 0 disables the batch delay.
    #[serde(default)]
    batch_size: usize,
    #[serde(default)]
    batch_delay_seconds: f64,
}

fn default_max_retries() -> u32 {
    RetryPolicy::DEFAULT_MAX_RETRIES
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_seconds: 0.0,
            batch_size: 0,
            batch_delay_seconds: 0.0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CostConfig {
    #[serde(default)]
    input_per_1m: f64,
    #[serde(default)]
    output_per_1m: f64,
}

// ---------------------------------------------------------------------------
// Resolved job
// ---------------------------------------------------------------------------

/// A validated job with absolute paths.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    /// Provider name as configured; resolved by the registry.
    pub provider: String,
    pub params: GenerationParams,
    pub retry: RetryPolicy,
    pub pacing: Pacing,
    pub cost_rates: Option<CostRates>,
    pub input_file: PathBuf,
    pub system_prompt_file: PathBuf,
    pub output_file: PathBuf,
}

/// Loads and validates the job described by the YAML file at `path`.
pub fn load(path: &Path) -> Result<Job, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let base_dir = std::path::absolute(base_dir).map_err(|source| ConfigError::Read {
        path: base_dir.to_path_buf(),
        source,
    })?;
    from_yaml(&text, &base_dir).map_err(|e| match e {
        ConfigError::Parse { source, .. } => ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

/// Parses and validates YAML text, resolving relative paths against `base_dir`.
pub fn from_yaml(text: &str, base_dir: &Path) -> Result<Job, ConfigError> {
    let file: FileConfig = serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
        path: PathBuf::new(),
        source,
    })?;
    resolve(file, base_dir)
}

fn resolve(file: FileConfig, base_dir: &Path) -> Result<Job, ConfigError> {
    if file.provider.trim().is_empty() {
        return Err(invalid("provider must not be empty"));
    }
    let model = ModelId::new(file.generation.model)
        .ok_or_else(|| invalid("generation.model must not be empty"))?;
    if !file.generation.temperature.is_finite() || file.generation.temperature < 0.0 {
        return Err(invalid("generation.temperature must be a non-negative number"));
    }
    if file.run.max_retries == 0 {
        return Err(invalid("run.max_retries must be at least 1"));
    }
    let base_delay = seconds("run.base_delay_seconds", file.run.base_delay_seconds)?;
    let batch_delay = seconds("run.batch_delay_seconds", file.run.batch_delay_seconds)?;
    let cost_rates = file
        .cost
        .map(|c| {
            CostRates::new(c.input_per_1m, c.output_per_1m)
                .ok_or_else(|| invalid("cost rates must be non-negative numbers"))
        })
        .transpose()?;

    let resolve_path = |template: &str| -> PathBuf {
        base_dir.join(format_path(template, &file.provider, &model))
    };

    Ok(Job {
        input_file: resolve_path(&file.paths.input_json),
        system_prompt_file: resolve_path(&file.paths.system_prompt),
        output_file: resolve_path(&file.paths.output),
        provider: file.provider.clone(),
        params: GenerationParams {
            model: model.clone(),
            max_tokens: file.generation.max_tokens,
            temperature: file.generation.temperature,
        },
        retry: RetryPolicy::new(file.run.max_retries),
        pacing: Pacing {
            base_delay,
            batch_size: file.run.batch_size,
            batch_delay,
        },
        cost_rates,
    })
}

fn seconds(field: &str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| invalid(format!("{field} must be a non-negative number")))
}

/// Substitutes `{PROVIDER}` and `{MODEL}` in a path template.
pub fn format_path(template: &str, provider: &str, model: &ModelId) -> String {
    template
        .replace("{PROVIDER}", &provider.to_lowercase())
        .replace("{MODEL}", &model.file_safe())
}
