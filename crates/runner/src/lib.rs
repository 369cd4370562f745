//! batchgen batch execution engine.
//!
//! Drives a [`pipeline::TextGenerator`] over an ordered list of entries:
//!
//! 1. [`retry`]: one entry, bounded attempts, `2^n`-second backoff, failure
//!    exhaustion returned as a value.
//! 2. [`batch`]: strictly sequential loop over entries with inter-entry and
//!    inter-batch pacing; accumulates token totals.
//! 3. [`output`]: one flushed block per entry in the result stream.
//! 4. [`run_log`]: provenance record written once after the last entry.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Sequences calls between the domain types in
//! [`pipeline`] and whatever adapter the composition root hands in. Contains no
//! vendor knowledge.

pub mod batch;
pub mod error;
pub mod output;
pub mod retry;
pub mod run_log;

#[cfg(test)]
mod test_support;

pub use batch::{BatchRunner, Pacing, RunSummary};
pub use error::{Result, RunError};
pub use output::OutputWriter;
pub use retry::{RetryController, RetryOutcome, RetryPolicy};
pub use run_log::{RunContext, RunLog};
