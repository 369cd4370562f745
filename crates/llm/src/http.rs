//! Transport plumbing shared by every adapter.
//!
//! Adapters build one [`reqwest::Client`] at construction and keep it for the
//! whole run. Every call goes through [`post_json`], which maps transport
//! failures, non-success statuses and undecodable bodies onto the matching
//! [`ProviderError`] variants.

use std::time::Duration;

use pipeline::ProviderError;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Per-request timeout applied to every adapter's client.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Error bodies longer than this are truncated before they reach logs and the
/// output stream.
const MAX_ERROR_BODY: usize = 512;

pub(crate) fn build_http_client(provider: &str) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ProviderError::Transport {
            provider: provider.to_string(),
            message: format!("failed to build HTTP client: {e}"),
        })
}

/// Reads a credential from the process environment.
pub(crate) fn credential_from_env(env_var: &str) -> Result<String, ProviderError> {
    require_credential(env_var, std::env::var(env_var).ok())
}

/// Unset, empty and whitespace-only values all count as missing.
pub(crate) fn require_credential(
    env_var: &str,
    value: Option<String>,
) -> Result<String, ProviderError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ProviderError::MissingCredential {
            env_var: env_var.to_string(),
        }),
    }
}

/// Sends `body` as JSON and decodes a successful response as `R`.
pub(crate) async fn post_json<B, R>(
    provider: &str,
    request: RequestBuilder,
    body: &B,
) -> Result<R, ProviderError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = request
        .json(body)
        .send()
        .await
        .map_err(|e| transport_error(provider, &e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(response_to_error(provider, response).await);
    }

    let text = response
        .text()
        .await
        .map_err(|e| transport_error(provider, &e))?;

    tracing::debug!(
        provider,
        status = status.as_u16(),
        response_len = text.len(),
        "Provider request completed"
    );

    serde_json::from_str(&text).map_err(|e| ProviderError::MalformedResponse {
        provider: provider.to_string(),
        message: e.to_string(),
    })
}

fn transport_error(provider: &str, error: &reqwest::Error) -> ProviderError {
    ProviderError::Transport {
        provider: provider.to_string(),
        message: error.to_string(),
    }
}

async fn response_to_error(provider: &str, response: Response) -> ProviderError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    ProviderError::Api {
        provider: provider.to_string(),
        status,
        message: truncate_body(body),
    }
}

fn truncate_body(body: String) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body;
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credentials_count_as_missing() {
        for value in [None, Some(String::new()), Some("  ".to_string())] {
            let err = require_credential("OPENAI_API_KEY", value).unwrap_err();
            assert_eq!(
                err,
                ProviderError::MissingCredential {
                    env_var: "OPENAI_API_KEY".to_string()
                }
            );
        }
    }

    #[test]
    fn present_credential_is_returned_verbatim() {
        let key = require_credential("OPENAI_API_KEY", Some("sk-test".to_string())).unwrap();
        assert_eq!(key, "sk-test");
    }

    #[test]
    fn short_bodies_are_kept() {
        assert_eq!(truncate_body("overloaded".to_string()), "overloaded");
    }

    #[test]
    fn long_bodies_are_truncated_on_a_char_boundary() {
        let body = "ä".repeat(400);
        let truncated = truncate_body(body);
        assert!(truncated.ends_with("... [truncated]"));
        assert!(truncated.len() <= MAX_ERROR_BODY + "... [truncated]".len());
    }
}
