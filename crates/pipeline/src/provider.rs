//! The provider port: one generation contract shared by every backend.
//!
//! Infrastructure crates implement [`TextGenerator`] once per vendor. The
//! runner only ever sees `&dyn TextGenerator`, so swapping vendors is a
//! configuration change.

use async_trait::async_trait;

use crate::{Entry, GenResult, ModelId, ProviderError};

/// Model parameters that are fixed for a whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    /// Vendor model identifier.
    pub model: ModelId,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

/// The system instruction shared by every entry of a run.
///
/// Loaded once. The text sent to the model is the loaded text followed by a
/// single newline; [`SystemInstruction::source_text`] returns the text as it
/// was loaded, which is what the run log hashes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemInstruction {
    text: String,
}

impl SystemInstruction {
    /// Wraps the loaded instruction text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The instruction exactly as loaded.
    pub fn source_text(&self) -> &str {
        &self.text
    }

    /// The instruction as sent to the model.
    pub fn prompt_text(&self) -> String {
        format!("{}\n", self.text)
    }
}

/// One fully-specified generation call.
///
/// Built per entry from the run's [`SystemInstruction`] and
/// [`GenerationParams`]; immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// System instruction text.
    pub system: String,
    /// User message: the entry's canonical prompt form.
    pub user: String,
    /// Vendor model identifier.
    pub model: ModelId,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl GenerationRequest {
    /// Builds the request for one entry.
    pub fn for_entry(
        entry: &Entry,
        instruction: &SystemInstruction,
        params: &GenerationParams,
    ) -> Self {
        Self {
            system: instruction.prompt_text(),
            user: entry.to_user_prompt(),
            model: params.model.clone(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        }
    }
}

/// A text-generation backend.
///
/// Implementations perform exactly one network call per [`generate`] and never
/// retry internally; retry policy belongs to the caller. Returned text must
/// already be trimmed (constructing a [`GenResult`] guarantees this) and must be
/// the empty string rather than an error when the vendor returns no content.
///
/// [`generate`]: TextGenerator::generate
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short lower-case provider name, e.g. `"anthropic"`.
    fn provider(&self) -> &str;

    /// Sends one request and normalises the vendor response.
    async fn generate(&self, request: &GenerationRequest) -> Result<GenResult, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_shared_instruction_and_entry_prompt() {
        let entries =
            crate::parse_entries(r#"[{"id": "A1", "rubric": "Bier", "year": 1734, "entry": "x"}]"#)
                .unwrap();
        let entry = &entries[0];
        let instruction = SystemInstruction::new("Encode as RDF.");
        let params = GenerationParams {
            model: ModelId::new("gpt-4o").unwrap(),
            max_tokens: 4096,
            temperature: 0.0,
        };

        let request = GenerationRequest::for_entry(entry, &instruction, &params);

        assert_eq!(request.system, "Encode as RDF.\n");
        assert_eq!(request.user, entry.to_user_prompt());
        assert_eq!(request.model.as_str(), "gpt-4o");
        assert_eq!(request.max_tokens, 4096);
    }

    #[test]
    fn empty_instruction_still_sends_a_newline() {
        let instruction = SystemInstruction::default();
        assert_eq!(instruction.source_text(), "");
        assert_eq!(instruction.prompt_text(), "\n");
    }
}
