//! Shared value types for the batchgen domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (token counts are non-negative integers,
//! generated text is always trimmed, run totals only ever grow) and participate
//! in the run's accounting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Token and cost types
// ---------------------------------------------------------------------------

/// Number of tokens consumed in an LLM API call.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TokenCount(u64);

impl TokenCount {
    /// Creates a [`TokenCount`] from a raw integer.
    pub fn new(count: u64) -> Self {
        Self(count)
    }

    /// Returns the underlying integer value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TokenCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add for TokenCount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::AddAssign for TokenCount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

// ---------------------------------------------------------------------------

/// Monetary cost of LLM token usage, expressed in US dollars.
///
/// Callers are responsible for rounding to suitable display precision.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenCost(f64);

impl TokenCost {
    /// Creates a [`TokenCost`] from a raw float value (USD).
    ///
    /// Returns `None` if `value` is negative, infinite, or NaN.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() && value >= 0.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Creates a [`TokenCost`] of exactly zero.
    pub fn zero() -> Self {
        Self(0.0)
    }

    /// Returns the underlying `f64` value (USD).
    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for TokenCost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${:.4}", self.0)
    }
}

// ---------------------------------------------------------------------------

/// Per-million-token prices used to estimate the cost of a run.
///
/// Rates are optional in the job configuration; when absent no estimate is
/// produced at all rather than a guessed default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostRates {
    /// USD per one million input (prompt) tokens.
    #[serde(default)]
    pub input_per_1m: f64,
    /// USD per one million output (completion) tokens.
    #[serde(default)]
    pub output_per_1m: f64,
}

impl CostRates {
    /// Creates a rate pair, returning `None` if either rate is negative,
    /// infinite, or NaN.
    #[must_use]
    pub fn new(input_per_1m: f64, output_per_1m: f64) -> Option<Self> {
        let valid = |r: f64| r.is_finite() && r >= 0.0;
        if valid(input_per_1m) && valid(output_per_1m) {
            Some(Self {
                input_per_1m,
                output_per_1m,
            })
        } else {
            None
        }
    }

    /// Estimates the cost of the given totals.
    pub fn estimate(&self, totals: &RunTotals) -> TokenCost {
        let input = totals.input_tokens().as_u64() as f64 / 1_000_000.0 * self.input_per_1m;
        let output = totals.output_tokens().as_u64() as f64 / 1_000_000.0 * self.output_per_1m;
        TokenCost::new(input + output).unwrap_or_else(TokenCost::zero)
    }
}

// ---------------------------------------------------------------------------
// Generation results
// ---------------------------------------------------------------------------

/// Token counts billed for one generation call.
///
/// Adapters default each count to zero when the vendor omits it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Prompt tokens consumed.
    pub input_tokens: TokenCount,
    /// Completion tokens produced.
    pub output_tokens: TokenCount,
}

impl Usage {
    /// Creates a [`Usage`] from raw counts.
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens: TokenCount::new(input_tokens),
            output_tokens: TokenCount::new(output_tokens),
        }
    }

    /// Sum of input and output tokens.
    pub fn total(&self) -> TokenCount {
        self.input_tokens + self.output_tokens
    }
}

// ---------------------------------------------------------------------------

/// Outcome of one successful generation call.
///
/// The text is trimmed of surrounding whitespace on construction, so every
/// consumer sees the same normalised form regardless of which vendor produced
/// it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenResult {
    text: String,
    usage: Usage,
}

impl GenResult {
    /// Creates a result, trimming `text`.
    pub fn new(text: impl AsRef<str>, usage: Usage) -> Self {
        Self {
            text: text.as_ref().trim().to_string(),
            usage,
        }
    }

    /// The generated text, trimmed.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Tokens billed for the call.
    pub fn usage(&self) -> Usage {
        self.usage
    }
}

// ---------------------------------------------------------------------------

/// Running token totals for one batch.
///
/// Only ever grows: the sole mutator is [`RunTotals::record`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    input_tokens: TokenCount,
    output_tokens: TokenCount,
}

impl RunTotals {
    /// Adds one call's usage to the totals.
    pub fn record(&mut self, usage: Usage) {
        self.input_tokens += usage.input_tokens;
        self.output_tokens += usage.output_tokens;
    }

    /// Total input tokens recorded so far.
    pub fn input_tokens(&self) -> TokenCount {
        self.input_tokens
    }

    /// Total output tokens recorded so far.
    pub fn output_tokens(&self) -> TokenCount {
        self.output_tokens
    }

    /// Input plus output tokens.
    pub fn total_tokens(&self) -> TokenCount {
        self.input_tokens + self.output_tokens
    }

    /// Average tokens per entry, or `None` when no entries were processed.
    pub fn average_per_entry(&self, entry_count: usize) -> Option<f64> {
        if entry_count == 0 {
            None
        } else {
            Some(self.total_tokens().as_u64() as f64 / entry_count as f64)
        }
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly. Serialises as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gen_result_trims_surrounding_whitespace() {
        let result = GenResult::new("\n  <rdf:Description/>  \n\n", Usage::new(1, 2));
        assert_eq!(result.text(), "<rdf:Description/>");
        assert_eq!(result.usage(), Usage::new(1, 2));
    }

    #[test]
    fn run_totals_accumulate_usage() {
        let mut totals = RunTotals::default();
        totals.record(Usage::new(10, 5));
        totals.record(Usage::new(7, 3));
        assert_eq!(totals.input_tokens(), TokenCount::new(17));
        assert_eq!(totals.output_tokens(), TokenCount::new(8));
        assert_eq!(totals.total_tokens(), TokenCount::new(25));
    }

    #[test]
    fn average_is_none_for_empty_batches() {
        let totals = RunTotals::default();
        assert_eq!(totals.average_per_entry(0), None);
    }

    #[test]
    fn average_divides_total_by_entry_count() {
        let mut totals = RunTotals::default();
        totals.record(Usage::new(10, 5));
        assert_eq!(totals.average_per_entry(1), Some(15.0));
        assert_eq!(totals.average_per_entry(2), Some(7.5));
    }

    #[test]
    fn cost_estimate_uses_per_million_rates() {
        let mut totals = RunTotals::default();
        totals.record(Usage::new(2_000_000, 500_000));
        let rates = CostRates::new(3.0, 15.0).unwrap();
        let cost = rates.estimate(&totals);
        assert!((cost.as_f64() - 13.5).abs() < 1e-9);
    }

    #[test]
    fn cost_rates_reject_negative_values() {
        assert!(CostRates::new(-1.0, 0.0).is_none());
        assert!(CostRates::new(0.0, f64::NAN).is_none());
    }

    #[test]
    fn token_cost_display_uses_four_decimals() {
        assert_eq!(TokenCost::new(1.5).unwrap().to_string(), "$1.5000");
    }
}
