//! Chat client seam and transport error taxonomy

use crate::types::ChatMessage;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use thiserror::Error;

/// Transport-level failure of a chat call, distinct from content validation.
/// Any of these marks the topic `Failed` without consuming the repair attempt.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat call timed out")]
    Timeout,
    #[error("chat endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

/// Trait for pluggable chat completion backends
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send one message sequence, return the completion text
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError>;
}

/// Scripted client for testing: returns queued replies in order and counts
/// every call, so repair-bound assertions can check the exact call total
pub struct ScriptedChatClient {
    replies: Mutex<VecDeque<Result<String, ChatError>>>,
    calls: AtomicUsize,
}

impl ScriptedChatClient {
    pub fn new(replies: Vec<Result<String, ChatError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Total number of `complete` calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatClient for ScriptedChatClient {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut replies = self
            .replies
            .lock()
            .map_err(|_| ChatError::Transport("script mutex poisoned".to_string()))?;
        replies
            .pop_front()
            .unwrap_or_else(|| Err(ChatError::Transport("script exhausted".to_string())))
    }
}
