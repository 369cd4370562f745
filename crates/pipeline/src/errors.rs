//! Error types for provider construction and generation calls.
//!
//! [`ProviderError`] covers both the fatal start-up conditions (unknown provider
//! name, missing credential) and the per-call failures that the retry loop
//! absorbs. Only the latter are ever returned from
//! [`TextGenerator::generate`](crate::TextGenerator::generate).

use thiserror::Error;

/// Errors produced while resolving a provider or calling it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The configured provider name does not match any known backend.
    ///
    /// Produced by the registry before any entry is read.
    #[error("Unknown provider: {name}")]
    UnknownProvider {
        /// The name as it appeared in the configuration.
        name: String,
    },

    /// The credential environment variable required by an adapter is unset or empty.
    ///
    /// Produced at adapter construction; the run aborts before any entry runs.
    #[error("{env_var} not found")]
    MissingCredential {
        /// Name of the environment variable that was consulted.
        env_var: String,
    },

    /// The request never produced an HTTP response (DNS, TLS, timeout, reset).
    #[error("{provider} transport error: {message}")]
    Transport {
        /// Provider that was being called.
        provider: String,
        /// Description of the underlying failure.
        message: String,
    },

    /// The vendor answered with a non-success status.
    #[error("{provider} API error (HTTP {status}): {message}")]
    Api {
        /// Provider that was being called.
        provider: String,
        /// HTTP status code returned by the vendor.
        status: u16,
        /// Response body, truncated.
        message: String,
    },

    /// The vendor answered successfully but the body could not be interpreted.
    #[error("{provider} returned a malformed response: {message}")]
    MalformedResponse {
        /// Provider that was being called.
        provider: String,
        /// What was wrong with the body.
        message: String,
    },
}
