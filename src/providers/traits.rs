use async_trait::async_trait;

use super::DispatchError;
use crate::session::Message;

/// One fully-clamped completion request. Parameter validation happens in the
/// dispatcher before this is constructed.
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub messages: &'a [Message],
    pub model: &'a str,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// A chat-completion backend.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// One network attempt, no retries. Returns the assistant reply text.
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, DispatchError>;
}
