//! Core conversation model for the chat relay.
//!
//! Owns the transcript data model, the session store that keys transcripts
//! by conversation, the completion-client seam, and the retrying invoker
//! that absorbs transient upstream failures. No HTTP or provider specifics
//! live here.

pub mod completion;
pub mod message;
pub mod retry;
pub mod transcript;

pub use completion::{Completion, CompletionClient, CompletionError};
pub use message::{Message, Role};
pub use retry::{InvokeError, RetryPolicy, RetryingInvoker};
pub use transcript::{SessionStore, Transcript, TranscriptError};
