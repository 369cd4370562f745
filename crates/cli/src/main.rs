//! batchgen CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Load secrets**: read `.env` (if present) into the process environment.
//! 2. **Wire observability**: configure `tracing-subscriber` with either a
//!    human-readable or a JSON layer. All `tracing` spans and structured events
//!    emitted by every crate in the workspace flow through this layer.
//! 3. **Parse configuration**: load the YAML job file and validate it.
//! 4. **Construct infrastructure**: resolve the provider adapter through the
//!    registry *before* any input is read or any output is touched, so an
//!    unknown provider or a missing credential aborts cleanly.
//! 5. **Run**: drive the batch runner, then persist the run log.

mod config;

use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use pipeline::{parse_entries, Entry, RunId, SystemInstruction, TextGenerator};
use runner::{BatchRunner, OutputWriter, RetryController, RunContext, RunLog, RunSummary};
use tracing::Instrument;
use tracing_subscriber::EnvFilter;

use crate::config::Job;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

/// Sends every entry of a JSON file through an LLM and writes the results.
#[derive(Debug, Parser)]
#[command(name = "batchgen", version, about)]
struct Cli {
    /// Path to the YAML job configuration.
    #[arg(short, long, env = "BATCHGEN_CONFIG", default_value = "config.yaml")]
    config: std::path::PathBuf,

    /// Console log format. Verbosity is controlled by `RUST_LOG`.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let started = Instant::now();
    let cli = Cli::parse();

    let dotenv = dotenvy::dotenv();
    init_tracing(cli.log_format);
    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => tracing::debug!("No .env file found"),
        Err(e) => return Err(e).context("failed to load .env"),
    }

    let run_id = RunId::new_random();
    let span = tracing::info_span!("run", run_id = %run_id);
    async {
        let job = config::load(&cli.config)
            .with_context(|| format!("failed to load configuration {}", cli.config.display()))?;
        run(&job, run_id, started).await
    }
    .instrument(span)
    .await
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Resolves the provider, then executes the job.
async fn run(job: &Job, run_id: RunId, started: Instant) -> anyhow::Result<()> {
    tracing::info!(
        provider = %job.provider,
        model = %job.params.model,
        input = %job.input_file.display(),
        prompt = %job.system_prompt_file.display(),
        output = %job.output_file.display(),
        "Job configured"
    );

    let generator = llm::resolve(&job.provider)
        .with_context(|| format!("failed to initialise provider '{}'", job.provider))?;

    execute(job, generator.as_ref(), run_id, started).await?;
    Ok(())
}

/// Runs the batch against an already-constructed generator and writes the run log.
async fn execute(
    job: &Job,
    generator: &dyn TextGenerator,
    run_id: RunId,
    started: Instant,
) -> anyhow::Result<RunSummary> {
    let instruction = load_instruction(&job.system_prompt_file)?;
    let entries = load_entries(&job.input_file)?;
    tracing::info!(count = entries.len(), "Loaded entries");

    let mut output = OutputWriter::create(&job.output_file)?;
    let runner = BatchRunner::new(
        generator,
        instruction.clone(),
        job.params.clone(),
        RetryController::new(job.retry),
        job.pacing,
    );
    let summary = runner.run(&entries, &mut output).await?;
    drop(output);

    if let Some(rates) = job.cost_rates {
        tracing::info!(
            estimated_cost = %rates.estimate(&summary.totals),
            "Cost estimate"
        );
    }
    tracing::info!(path = %job.output_file.display(), "Output written");

    let ctx = RunContext {
        run_id,
        provider: generator.provider(),
        params: &job.params,
        input_file: &job.input_file,
        output_file: &job.output_file,
        system_prompt_file: &job.system_prompt_file,
        instruction: &instruction,
        retry: job.retry,
        pacing: job.pacing,
        cost_rates: job.cost_rates,
    };
    let log = RunLog::build(&ctx, &summary, started.elapsed());
    log.persist(&job.output_file, &job.params.model.file_safe())?;

    tracing::info!(
        execution_time_secs = log.results.execution_time_seconds,
        "Processing complete"
    );
    Ok(summary)
}

/// Reads the system instruction. A missing file degrades to an empty
/// instruction; any other read failure is fatal.
fn load_instruction(path: &Path) -> anyhow::Result<SystemInstruction> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(SystemInstruction::new(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(
                path = %path.display(),
                "System prompt file not found; proceeding without it"
            );
            Ok(SystemInstruction::default())
        }
        Err(e) => {
            Err(e).with_context(|| format!("failed to read system prompt {}", path.display()))
        }
    }
}

fn load_entries(path: &Path) -> anyhow::Result<Vec<Entry>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read input {}", path.display()))?;
    parse_entries(&text).with_context(|| format!("failed to parse input {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pipeline::{GenResult, GenerationRequest, ProviderError, TokenCount, Usage};
    use std::fs;

    struct FixedGenerator;

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        fn provider(&self) -> &str {
            "fake"
        }

        async fn generate(&self, _request: &GenerationRequest) -> Result<GenResult, ProviderError> {
            Ok(GenResult::new("foo", Usage::new(10, 5)))
        }
    }

    fn job_in(dir: &Path, provider: &str) -> Job {
        let yaml = format!(
            "provider: {provider}\n\
             paths:\n  input_json: entries.json\n  system_prompt: prompt.txt\n  output: out/{{PROVIDER}}/{{MODEL}}.ttl\n\
             generation:\n  model: test/model\n"
        );
        config::from_yaml(&yaml, dir).unwrap()
    }

    fn run_logs(dir: &Path) -> Vec<std::path::PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| {
                p.file_name()
                    .unwrap()
                    .to_string_lossy()
                    .starts_with("run_log_test_model_")
            })
            .collect()
    }

    #[tokio::test]
    async fn unknown_provider_fails_before_output_is_created() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("entries.json"), r#"[{"id": "A1", "entry": "x"}]"#).unwrap();
        let job = job_in(dir.path(), "acme");

        let err = run(&job, RunId::new_random(), Instant::now())
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("Unknown provider: acme"));
        assert!(!job.output_file.exists());
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn single_entry_writes_output_and_run_log() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("entries.json"), r#"[{"id": "A1", "entry": "x"}]"#).unwrap();
        fs::write(dir.path().join("prompt.txt"), "Encode as RDF.").unwrap();
        let job = job_in(dir.path(), "fake");

        let summary = execute(&job, &FixedGenerator, RunId::new_random(), Instant::now())
            .await
            .unwrap();

        assert_eq!(summary.totals.input_tokens(), TokenCount::new(10));
        assert_eq!(fs::read_to_string(&job.output_file).unwrap(), "foo\n\n");

        let logs = run_logs(job.output_file.parent().unwrap());
        assert_eq!(logs.len(), 1);
        let log: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&logs[0]).unwrap()).unwrap();
        assert_eq!(log["results"]["total_input_tokens"], 10);
        assert_eq!(log["results"]["total_output_tokens"], 5);
        assert_eq!(log["results"]["average_tokens_per_entry"], 15.0);
        assert_eq!(log["system_prompt_text"], "Encode as RDF.");
    }

    #[tokio::test]
    async fn rerun_truncates_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("entries.json"), r#"[{"id": "A1"}]"#).unwrap();
        let job = job_in(dir.path(), "fake");
        fs::create_dir_all(job.output_file.parent().unwrap()).unwrap();
        fs::write(&job.output_file, "stale output from an earlier run\n\n").unwrap();

        execute(&job, &FixedGenerator, RunId::new_random(), Instant::now())
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(&job.output_file).unwrap(), "foo\n\n");
    }

    #[test]
    fn missing_prompt_file_degrades_to_empty_instruction() {
        let dir = tempfile::tempdir().unwrap();
        let instruction = load_instruction(&dir.path().join("absent.txt")).unwrap();
        assert_eq!(instruction, SystemInstruction::default());
    }

    #[test]
    fn malformed_input_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.json");
        fs::write(&path, "not json").unwrap();
        assert!(load_entries(&path).is_err());
    }
}
