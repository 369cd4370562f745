//! The batch runner: drives every entry through the retry controller, in order.
//!
//! Per entry the state moves `PENDING → ATTEMPTING → SUCCEEDED | FAILED_EXHAUSTED`
//! and both terminal states write exactly one flushed block before the next
//! entry starts. Nothing runs concurrently: every generation call and every
//! pacing pause is awaited in sequence, so the output file and the running
//! totals need no synchronisation.

use std::io::Write;
use std::time::Duration;

use pipeline::{
    Entry, GenerationParams, GenerationRequest, RunTotals, SystemInstruction, TextGenerator,
};
use tokio::time::Instant;
use tracing::Instrument;

use crate::error::Result;
use crate::output::OutputWriter;
use crate::retry::{RetryController, RetryOutcome};

/// Pauses inserted between entries to stay under vendor rate limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pacing {
    /// Sleep after every entry. Zero disables.
    pub base_delay: Duration,
    /// Every `batch_size` entries, sleep `batch_delay` as well. Zero disables.
    pub batch_size: usize,
    pub batch_delay: Duration,
}

impl Pacing {
    /// Pause due after the `processed`-th entry (1-based), if any.
    fn batch_pause_after(&self, processed: usize) -> Option<Duration> {
        let due = self.batch_size > 0
            && !self.batch_delay.is_zero()
            && processed % self.batch_size == 0;
        due.then_some(self.batch_delay)
    }
}

/// Totals handed to the run logger once the last entry is written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Usage of successful entries only.
    pub totals: RunTotals,
    pub entries_processed: usize,
    pub entries_failed: usize,
    /// Wall time spent in [`BatchRunner::run`], pauses included.
    pub elapsed: Duration,
}

/// Sequential executor for one batch.
pub struct BatchRunner<'a> {
    generator: &'a dyn TextGenerator,
    instruction: SystemInstruction,
    params: GenerationParams,
    retry: RetryController,
    pacing: Pacing,
}

impl<'a> BatchRunner<'a> {
    pub fn new(
        generator: &'a dyn TextGenerator,
        instruction: SystemInstruction,
        params: GenerationParams,
        retry: RetryController,
        pacing: Pacing,
    ) -> Self {
        Self {
            generator,
            instruction,
            params,
            retry,
            pacing,
        }
    }

    /// Processes `entries` in order, writing one block per entry to `output`.
    ///
    /// Generation failures never abort the run; only a failure to write a block
    /// does.
    pub async fn run<W: Write>(
        &self,
        entries: &[Entry],
        output: &mut OutputWriter<W>,
    ) -> Result<RunSummary> {
        let started = Instant::now();
        let total = entries.len();
        let mut totals = RunTotals::default();
        let mut failed = 0usize;

        tracing::info!(
            provider = self.generator.provider(),
            model = %self.params.model,
            entries = total,
            "Batch started"
        );

        for (index, entry) in entries.iter().enumerate() {
            let entry_id = entry.id();
            let span = tracing::info_span!(
                "entry",
                index = index + 1,
                total,
                entry_id = %entry_id
            );

            let request = GenerationRequest::for_entry(entry, &self.instruction, &self.params);
            let outcome = self
                .retry
                .execute(self.generator, &request, &entry_id)
                .instrument(span.clone())
                .await;

            let exhausted = span.in_scope(|| -> Result<bool> {
                match outcome {
                    RetryOutcome::Succeeded { result, attempts } => {
                        output.write_success(result.text())?;
                        totals.record(result.usage());
                        tracing::info!(
                            attempts,
                            input_tokens = %result.usage().input_tokens,
                            output_tokens = %result.usage().output_tokens,
                            "Entry succeeded"
                        );
                        Ok(false)
                    }
                    RetryOutcome::Exhausted {
                        entry_id,
                        error,
                        attempts,
                    } => {
                        output.write_failure(&entry_id, &error)?;
                        tracing::error!(attempts, error = %error, "Entry failed after all attempts");
                        Ok(true)
                    }
                }
            })?;
            if exhausted {
                failed += 1;
            }

            if !self.pacing.base_delay.is_zero() {
                tokio::time::sleep(self.pacing.base_delay).await;
            }
            if let Some(pause) = self.pacing.batch_pause_after(index + 1) {
                tracing::info!(
                    processed = index + 1,
                    pause_secs = pause.as_secs_f64(),
                    "Batch delay"
                );
                tokio::time::sleep(pause).await;
            }
        }

        let summary = RunSummary {
            totals,
            entries_processed: total,
            entries_failed: failed,
            elapsed: started.elapsed(),
        };

        tracing::info!(
            entries = total,
            failed,
            total_input_tokens = %totals.input_tokens(),
            total_output_tokens = %totals.output_tokens(),
            total_tokens = %totals.total_tokens(),
            "Batch finished"
        );

        Ok(summary)
    }
}
