//! batchgen LLM provider adapters.
//!
//! Implements the [`pipeline::TextGenerator`] trait for four vendors:
//! Anthropic, OpenAI, Mistral and Google Gemini. Each adapter owns one HTTP
//! client for the lifetime of the run and performs exactly one request per
//! call. The [`registry`] turns a configured provider name into an adapter.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** All HTTP transport, request formatting and response
//! parsing live here. The `runner` crate sees only [`pipeline::TextGenerator`].

pub mod anthropic;
mod chat_completions;
pub mod gemini;
mod http;
pub mod mistral;
pub mod openai;
pub mod registry;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use http::REQUEST_TIMEOUT;
pub use mistral::MistralProvider;
pub use openai::OpenAiProvider;
pub use registry::{resolve, ProviderKind};
