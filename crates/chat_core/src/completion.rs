//! Completion-client seam.
//!
//! Outcomes are an explicit tagged type rather than a provider exception
//! hierarchy: the retry layer switches on `is_transient` and nothing else.

use async_trait::async_trait;
use thiserror::Error;

use crate::message::Message;

/// A single assistant completion returned by the upstream service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub reply: String,
    /// Total token usage for the call, when the provider reports it.
    pub total_tokens: Option<u32>,
}

/// Classified failure of one completion call.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Upstream throttled the call (HTTP 429).
    #[error("rate limited by completion service")]
    RateLimited,

    /// Upstream answered with a non-success status other than 429.
    #[error("completion service error: HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The call never reached the service or the connection broke.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered 2xx but the body was not a usable completion.
    #[error("invalid completion response: {0}")]
    InvalidResponse(String),
}

impl CompletionError {
    /// Transient failures are worth retrying after a delay; everything else
    /// terminates the request immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CompletionError::RateLimited | CompletionError::Upstream { .. }
        )
    }
}

/// Capability to turn a transcript into one assistant reply.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, transcript: &[Message]) -> Result<Completion, CompletionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_and_upstream_errors_are_transient() {
        assert!(CompletionError::RateLimited.is_transient());
        assert!(CompletionError::Upstream {
            status: 503,
            message: "overloaded".to_string(),
        }
        .is_transient());
    }

    #[test]
    fn network_and_decode_errors_are_fatal() {
        assert!(!CompletionError::Network("connection refused".to_string()).is_transient());
        assert!(!CompletionError::InvalidResponse("no choices".to_string()).is_transient());
    }
}
