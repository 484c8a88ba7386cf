//! Bounded retry with exponential backoff around the completion call.
//!
//! The invoker is a pure orchestrator: it operates on the transcript
//! snapshot it is handed and never touches shared state, so retry semantics
//! stay composable and testable in isolation.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use thiserror::Error;

use crate::completion::{Completion, CompletionClient, CompletionError};
use crate::message::Message;

/// Backoff configuration. Defaults match the production policy: three
/// attempts with 1.5s and 3.0s waits between them, no wait after the last.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1500),
            multiplier: 2.0,
        }
    }
}

/// Terminal outcome of an invocation that did not produce a completion.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("completion retries exhausted after {attempts} attempts: {last}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        last: CompletionError,
    },

    #[error(transparent)]
    Fatal(CompletionError),
}

/// Calls a [`CompletionClient`] with sequential, bounded retries for
/// transient failures.
pub struct RetryingInvoker {
    client: Arc<dyn CompletionClient>,
    policy: RetryPolicy,
}

impl RetryingInvoker {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self::with_policy(client, RetryPolicy::default())
    }

    pub fn with_policy(client: Arc<dyn CompletionClient>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Obtains one completion for the given transcript snapshot.
    ///
    /// Transient failures sleep for the current delay, double it and retry;
    /// the final transient failure surfaces as `RetryExhausted`. Any
    /// non-transient failure terminates immediately as `Fatal`.
    pub async fn invoke(&self, transcript: &[Message]) -> Result<Completion, InvokeError> {
        let mut delay = self.policy.initial_delay;
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.client.complete(transcript).await {
                Ok(completion) => {
                    info!(
                        "completion succeeded | attempt {}/{} | total_tokens {:?}",
                        attempt, max_attempts, completion.total_tokens
                    );
                    return Ok(completion);
                }
                Err(err) if err.is_transient() => {
                    warn!(
                        "transient completion failure | attempt {}/{} | {}",
                        attempt, max_attempts, err
                    );
                    if attempt == max_attempts {
                        return Err(InvokeError::RetryExhausted {
                            attempts: attempt,
                            last: err,
                        });
                    }
                    tokio::time::sleep(delay).await;
                    delay = delay.mul_f64(self.policy.multiplier);
                }
                Err(err) => {
                    warn!("fatal completion failure | attempt {} | {}", attempt, err);
                    return Err(InvokeError::Fatal(err));
                }
            }
        }

        // max_attempts >= 1 means the loop always returns before this point.
        unreachable!("retry loop must terminate with a result")
    }
}
