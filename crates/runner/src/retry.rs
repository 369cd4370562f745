//! Retry controller: one entry, bounded attempts, deterministic backoff.
//!
//! Failure exhaustion is an ordinary value ([`RetryOutcome::Exhausted`]) rather
//! than an error, so the batch runner can write a marker and move on. The
//! attempt counter lives inside [`RetryController::execute`] and therefore resets
//! for every entry; one bad entry never eats into the next entry's budget.

use std::time::Duration;

use pipeline::{EntryId, GenResult, GenerationRequest, ProviderError, TextGenerator};

/// How many times an entry is attempted before it is given up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
}

impl RetryPolicy {
    /// Default attempt budget.
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    /// Creates a policy. `max_retries` is the total number of attempts and is
    /// raised to 1 if given as 0, so every entry is tried at least once.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries: max_retries.max(1),
        }
    }

    /// Total attempts per entry.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before the retry that follows failed attempt `attempt` (0-based):
    /// `2^attempt` seconds.
    pub fn backoff_delay(attempt: u32) -> Duration {
        Duration::from_secs(2u64.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_RETRIES)
    }
}

/// Terminal state of one entry.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome {
    /// An attempt succeeded; no further attempts were made.
    Succeeded {
        result: GenResult,
        /// Attempts used, including the successful one.
        attempts: u32,
    },
    /// Every attempt failed.
    Exhausted {
        entry_id: EntryId,
        /// Error from the final attempt.
        error: ProviderError,
        attempts: u32,
    },
}

/// Runs one generation call per entry with bounded retries.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryController {
    policy: RetryPolicy,
}

impl RetryController {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Attempts `request` until it succeeds or the budget is spent.
    pub async fn execute(
        &self,
        generator: &dyn TextGenerator,
        request: &GenerationRequest,
        entry_id: &EntryId,
    ) -> RetryOutcome {
        let mut attempt: u32 = 0;
        loop {
            tracing::info!(attempt = attempt + 1, "Generating");

            let error = match generator.generate(request).await {
                Ok(result) => {
                    return RetryOutcome::Succeeded {
                        result,
                        attempts: attempt + 1,
                    }
                }
                Err(error) => error,
            };

            tracing::warn!(
                attempt = attempt + 1,
                max_retries = self.policy.max_retries(),
                error = %error,
                "Generation attempt failed"
            );

            if attempt + 1 >= self.policy.max_retries() {
                return RetryOutcome::Exhausted {
                    entry_id: entry_id.clone(),
                    error,
                    attempts: attempt + 1,
                };
            }

            tokio::time::sleep(RetryPolicy::backoff_delay(attempt)).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedGenerator, Step};
    use pipeline::{ModelId, Usage};

    fn request() -> GenerationRequest {
        GenerationRequest {
            system: "s\n".to_string(),
            user: "u".to_string(),
            model: ModelId::new("m").unwrap(),
            max_tokens: 16,
            temperature: 0.0,
        }
    }

    #[test]
    fn backoff_doubles_from_one_second() {
        assert_eq!(RetryPolicy::backoff_delay(0), Duration::from_secs(1));
        assert_eq!(RetryPolicy::backoff_delay(1), Duration::from_secs(2));
        assert_eq!(RetryPolicy::backoff_delay(4), Duration::from_secs(16));
    }

    #[test]
    fn zero_retries_still_allows_one_attempt() {
        assert_eq!(RetryPolicy::new(0).max_retries(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_returns_without_retrying() {
        let generator = ScriptedGenerator::always(Step::Text("foo", Usage::new(10, 5)));
        let controller = RetryController::new(RetryPolicy::new(3));

        let outcome = controller
            .execute(&generator, &request(), &EntryId::new("A1"))
            .await;

        assert_eq!(generator.call_count(), 1);
        match outcome {
            RetryOutcome::Succeeded { result, attempts } => {
                assert_eq!(result.text(), "foo");
                assert_eq!(attempts, 1);
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_generator_is_called_max_retries_times_with_exponential_delays() {
        let generator = ScriptedGenerator::always(Step::Fail("boom"));
        let controller = RetryController::new(RetryPolicy::new(4));

        let outcome = controller
            .execute(&generator, &request(), &EntryId::new("A7"))
            .await;

        assert_eq!(generator.call_count(), 4);
        let gaps: Vec<u64> = generator
            .call_instants()
            .windows(2)
            .map(|w| (w[1] - w[0]).as_secs())
            .collect();
        assert_eq!(gaps, [1, 2, 4]);

        match outcome {
            RetryOutcome::Exhausted {
                entry_id,
                error,
                attempts,
            } => {
                assert_eq!(entry_id.as_str(), "A7");
                assert_eq!(attempts, 4);
                assert!(error.to_string().contains("boom"));
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn one_failure_then_success_retries_exactly_once() {
        let generator = ScriptedGenerator::new(
            vec![Step::Fail("flaky")],
            Step::Text("recovered", Usage::new(3, 4)),
        );
        let controller = RetryController::new(RetryPolicy::new(3));

        let outcome = controller
            .execute(&generator, &request(), &EntryId::new("A1"))
            .await;

        assert_eq!(generator.call_count(), 2);
        assert_eq!(
            outcome,
            RetryOutcome::Succeeded {
                result: GenResult::new("recovered", Usage::new(3, 4)),
                attempts: 2,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn single_attempt_budget_does_not_sleep() {
        let generator = ScriptedGenerator::always(Step::Fail("nope"));
        let controller = RetryController::new(RetryPolicy::new(1));
        let start = tokio::time::Instant::now();

        let outcome = controller
            .execute(&generator, &request(), &EntryId::new("A1"))
            .await;

        assert_eq!(generator.call_count(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(matches!(outcome, RetryOutcome::Exhausted { attempts: 1, .. }));
    }
}
