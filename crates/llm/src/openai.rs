//! OpenAI chat-completions adapter.

use async_trait::async_trait;
use pipeline::{GenResult, GenerationRequest, ProviderError, TextGenerator};
use reqwest::Client;

use crate::chat_completions;
use crate::http::{build_http_client, credential_from_env};

/// Environment variable holding the OpenAI API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

const PROVIDER: &str = "openai";
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Adapter for OpenAI's `/v1/chat/completions` endpoint.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    /// Creates an adapter with an explicit API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_http_client(PROVIDER)?,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Creates an adapter from [`OPENAI_API_KEY_ENV`].
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::new(credential_from_env(OPENAI_API_KEY_ENV)?)
    }

    /// Points the adapter at a different host (used by tests and compatible services).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl TextGenerator for OpenAiProvider {
    fn provider(&self) -> &str {
        PROVIDER
    }

    #[tracing::instrument(skip(self, request), fields(provider = PROVIDER, model = %request.model))]
    async fn generate(&self, request: &GenerationRequest) -> Result<GenResult, ProviderError> {
        chat_completions::complete(PROVIDER, &self.client, &self.base_url, &self.api_key, request)
            .await
    }
}
