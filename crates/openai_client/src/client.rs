use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};

use chat_core::{Completion, CompletionClient, CompletionError, Message};

use crate::api::{ChatCompletionRequest, ChatCompletionResponse};
use crate::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Upstream error bodies can be arbitrarily large; only the head is kept
/// for the operational log.
const ERROR_BODY_SNIPPET: usize = 200;

/// Truncates to at most `max` bytes without splitting a UTF-8 character.
fn truncate_snippet(mut text: String, max: usize) -> String {
    if text.len() <= max {
        return text;
    }
    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text
}

pub struct OpenAiClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, transcript: &[Message]) -> Result<Completion, CompletionError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: transcript,
        };

        debug!(
            "chat completion request | model {} | {} messages",
            self.model,
            transcript.len()
        );

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CompletionError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CompletionError::Upstream {
                status: status.as_u16(),
                message: truncate_snippet(text, ERROR_BODY_SNIPPET),
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        let reply = completion
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                CompletionError::InvalidResponse("response carried no completion text".to_string())
            })?
            .to_string();

        Ok(Completion {
            reply,
            total_tokens: completion.usage.map(|usage| usage.total_tokens),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_snippet_is_untouched() {
        assert_eq!(truncate_snippet("short".to_string(), 200), "short");
    }

    #[test]
    fn snippet_cut_lands_on_a_char_boundary() {
        // 'ł' is two UTF-8 bytes and straddles the cut point.
        let body = format!("{}ł end", "a".repeat(199));
        let snippet = truncate_snippet(body, 200);
        assert_eq!(snippet, "a".repeat(199));
        assert!(snippet.len() <= 200);
    }

    #[test]
    fn ascii_snippet_cuts_at_the_limit() {
        let snippet = truncate_snippet("a".repeat(300), 200);
        assert_eq!(snippet.len(), 200);
    }
}
