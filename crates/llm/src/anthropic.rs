//! Anthropic Messages API adapter.

use async_trait::async_trait;
use pipeline::{GenResult, GenerationRequest, ProviderError, TextGenerator, Usage};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::http::{build_http_client, credential_from_env, post_json};

/// Environment variable holding the Anthropic API key.
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

const PROVIDER: &str = "anthropic";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Adapter for Anthropic's `/v1/messages` endpoint.
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    /// Creates an adapter with an explicit API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_http_client(PROVIDER)?,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Creates an adapter from [`ANTHROPIC_API_KEY_ENV`].
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::new(credential_from_env(ANTHROPIC_API_KEY_ENV)?)
    }

    /// Points the adapter at a different host (used by tests and proxies).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: Option<u64>,
    #[serde(default)]
    output_tokens: Option<u64>,
}

impl MessagesResponse {
    fn into_result(self) -> GenResult {
        let text = self
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .unwrap_or_default();
        let usage = self
            .usage
            .map(|u| Usage::new(u.input_tokens.unwrap_or(0), u.output_tokens.unwrap_or(0)))
            .unwrap_or_default();
        GenResult::new(text, usage)
    }
}

#[async_trait]
impl TextGenerator for AnthropicProvider {
    fn provider(&self) -> &str {
        PROVIDER
    }

    #[tracing::instrument(skip(self, request), fields(provider = PROVIDER, model = %request.model))]
    async fn generate(&self, request: &GenerationRequest) -> Result<GenResult, ProviderError> {
        let body = MessagesRequest {
            model: request.model.as_str(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: &request.system,
            messages: vec![Message {
                role: "user",
                content: &request.user,
            }],
        };

        let http_request = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION);

        let response: MessagesResponse = post_json(PROVIDER, http_request, &body).await?;
        Ok(response.into_result())
    }
}
