//! Wire format for OpenAI-compatible `/v1/chat/completions` endpoints.
//!
//! OpenAI and Mistral speak the same request and response shapes; each adapter
//! owns its own client, key and base URL and delegates the exchange to
//! [`complete`].

use pipeline::{GenResult, GenerationRequest, ProviderError, Usage};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::http::post_json;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<MessageContent>,
}

/// Mistral may return content as a list of typed chunks instead of a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Chunks(Vec<ContentChunk>),
}

#[derive(Deserialize)]
struct ContentChunk {
    #[serde(default)]
    text: Option<String>,
}

impl MessageContent {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Chunks(chunks) => chunks.into_iter().filter_map(|c| c.text).collect(),
        }
    }
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: Option<u64>,
    #[serde(default)]
    completion_tokens: Option<u64>,
}

impl ChatResponse {
    fn into_result(self, provider: &str) -> Result<GenResult, ProviderError> {
        let choice = self.choices.into_iter().next().ok_or_else(|| {
            ProviderError::MalformedResponse {
                provider: provider.to_string(),
                message: "response contained no choices".to_string(),
            }
        })?;
        let text = choice
            .message
            .content
            .map(MessageContent::into_text)
            .unwrap_or_default();
        let usage = self
            .usage
            .map(|u| {
                Usage::new(
                    u.prompt_tokens.unwrap_or(0),
                    u.completion_tokens.unwrap_or(0),
                )
            })
            .unwrap_or_default();
        Ok(GenResult::new(text, usage))
    }
}

/// Performs one chat-completions exchange against `{base_url}/v1/chat/completions`.
pub(crate) async fn complete(
    provider: &str,
    client: &Client,
    base_url: &str,
    api_key: &str,
    request: &GenerationRequest,
) -> Result<GenResult, ProviderError> {
    let body = ChatRequest {
        model: request.model.as_str(),
        messages: vec![
            ChatMessage {
                role: "system",
                content: &request.system,
            },
            ChatMessage {
                role: "user",
                content: &request.user,
            },
        ],
        max_tokens: request.max_tokens,
        temperature: request.temperature,
    };

    let http_request = client
        .post(format!("{base_url}/v1/chat/completions"))
        .bearer_auth(api_key);

    let response: ChatResponse = post_json(provider, http_request, &body).await?;
    response.into_result(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<GenResult, ProviderError> {
        serde_json::from_value::<ChatResponse>(value)
            .unwrap()
            .into_result("openai")
    }

    #[test]
    fn null_content_becomes_empty_text() {
        let result = parse(json!({
            "choices": [{"message": {"role": "assistant", "content": null}}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 0}
        }))
        .unwrap();
        assert_eq!(result.text(), "");
        assert_eq!(result.usage(), Usage::new(3, 0));
    }

    #[test]
    fn chunked_content_is_concatenated() {
        let result = parse(json!({
            "choices": [{"message": {"content": [
                {"type": "text", "text": "ex:A1 "},
                {"type": "text", "text": "a ex:Entry ."}
            ]}}]
        }))
        .unwrap();
        assert_eq!(result.text(), "ex:A1 a ex:Entry .");
        assert_eq!(result.usage(), Usage::default());
    }

    #[test]
    fn missing_choices_is_malformed() {
        let err = parse(json!({"choices": []})).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse { .. }));
    }
}
