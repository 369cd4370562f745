//! Provider registry: maps a configured provider name onto an adapter.

use std::fmt;
use std::str::FromStr;

use pipeline::{ProviderError, TextGenerator};

use crate::anthropic::{AnthropicProvider, ANTHROPIC_API_KEY_ENV};
use crate::gemini::{GeminiProvider, GEMINI_API_KEY_ENV};
use crate::mistral::{MistralProvider, MISTRAL_API_KEY_ENV};
use crate::openai::{OpenAiProvider, OPENAI_API_KEY_ENV};

/// The supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Anthropic,
    OpenAi,
    Mistral,
    Gemini,
}

impl ProviderKind {
    /// Every supported backend, in display order.
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Anthropic,
        ProviderKind::OpenAi,
        ProviderKind::Mistral,
        ProviderKind::Gemini,
    ];

    /// Canonical lower-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Mistral => "mistral",
            Self::Gemini => "gemini",
        }
    }

    /// Environment variable the adapter reads its credential from.
    pub fn credential_env(&self) -> &'static str {
        match self {
            Self::Anthropic => ANTHROPIC_API_KEY_ENV,
            Self::OpenAi => OPENAI_API_KEY_ENV,
            Self::Mistral => MISTRAL_API_KEY_ENV,
            Self::Gemini => GEMINI_API_KEY_ENV,
        }
    }

    /// Constructs the adapter, reading its credential from the environment.
    pub fn build_from_env(self) -> Result<Box<dyn TextGenerator>, ProviderError> {
        Ok(match self {
            Self::Anthropic => Box::new(AnthropicProvider::from_env()?),
            Self::OpenAi => Box::new(OpenAiProvider::from_env()?),
            Self::Mistral => Box::new(MistralProvider::from_env()?),
            Self::Gemini => Box::new(GeminiProvider::from_env()?),
        })
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let normalized = name.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ProviderError::UnknownProvider {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves `name` to a ready-to-use adapter.
///
/// Fails with [`ProviderError::UnknownProvider`] before touching the
/// environment if the name is not recognised, and with
/// [`ProviderError::MissingCredential`] if the adapter's key is not set.
pub fn resolve(name: &str) -> Result<Box<dyn TextGenerator>, ProviderError> {
    let kind: ProviderKind = name.parse()?;
    let adapter = kind.build_from_env()?;
    tracing::info!(provider = %kind, credential_env = kind.credential_env(), "Provider resolved");
    Ok(adapter)
}
