//! OpenAI chat-completions client.
//!
//! Implements [`chat_core::CompletionClient`] over the non-streaming
//! `/chat/completions` endpoint and classifies every failure into the
//! explicit transient/fatal taxonomy the retry layer expects.

mod api;
mod client;

pub use client::OpenAiClient;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
