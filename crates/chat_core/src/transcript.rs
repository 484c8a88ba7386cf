//! Transcript model and session-keyed store.
//!
//! A transcript always starts with exactly one system message. Mutations are
//! limited to `append`, `rollback_last` and `reset`, which is what lets the
//! request handler guarantee that a failed request never leaves an
//! unanswered user message behind.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::message::{Message, Role};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("message content must not be empty")]
    EmptyContent,
}

/// Ordered message log for one conversation. Element 0 is always the system
/// instruction; it survives every reset and rollback.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    /// Truncates back to the system message only.
    pub fn reset(&mut self) {
        self.messages.truncate(1);
    }

    /// Appends a message. Empty (after trimming) content is rejected so the
    /// transcript never carries blank turns to the completion service.
    pub fn append(&mut self, role: Role, content: impl Into<String>) -> Result<(), TranscriptError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(TranscriptError::EmptyContent);
        }
        self.messages.push(Message::new(role, content));
        Ok(())
    }

    /// Removes the most recently appended message. The system message is
    /// never removed; rolling back a transcript that only holds the system
    /// message is a no-op.
    pub fn rollback_last(&mut self) -> Option<Message> {
        if self.messages.len() <= 1 {
            return None;
        }
        self.messages.pop()
    }

    /// Immutable ordered copy, suitable both for serialization to the caller
    /// and for handing to the completion invoker.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Concurrent map of conversation id to transcript. Each transcript is
/// guarded by its own async mutex so one conversation's upstream call never
/// blocks another conversation; the map guard itself is released before any
/// await point.
#[derive(Clone)]
pub struct SessionStore {
    system_prompt: Arc<str>,
    sessions: Arc<DashMap<String, Arc<Mutex<Transcript>>>>,
}

impl SessionStore {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: Arc::from(system_prompt.into()),
            sessions: Arc::new(DashMap::new()),
        }
    }

    /// Returns the transcript for `id`, creating a fresh one (system message
    /// only) on first use.
    pub fn session(&self, id: &str) -> Arc<Mutex<Transcript>> {
        self.sessions
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Transcript::new(self.system_prompt.as_ref()))))
            .clone()
    }

    /// Resets the transcript for `id` to its initial single-message state.
    pub async fn reset(&self, id: &str) {
        let session = self.session(id);
        session.lock().await.reset();
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
