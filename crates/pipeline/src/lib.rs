//! Core domain for batchgen.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type, and error type used throughout the batch engine. Infrastructure crates
//! implement the [`TextGenerator`] port defined here; they never add domain
//! rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; the `llm` crate supplies vendor adapters and
//! the `runner` crate drives them.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`EntryId`, `ModelId`, `RunId`) |
//! | [`types`] | Token, cost, usage and result value types |
//! | [`entry`] | Input entries and their canonical prompt form |
//! | [`provider`] | The `TextGenerator` port and request types |
//! | [`errors`] | Provider error taxonomy |

pub mod entry;
pub mod errors;
pub mod identifiers;
pub mod provider;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use entry::{parse_entries, Entry};
pub use errors::ProviderError;
pub use identifiers::{EntryId, ModelId, RunId};
pub use provider::{GenerationParams, GenerationRequest, SystemInstruction, TextGenerator};
pub use types::{CostRates, GenResult, RunTotals, Timestamp, TokenCost, TokenCount, Usage};
