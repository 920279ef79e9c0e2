//! Prompt dispatch over a completion provider.
//!
//! The dispatcher owns parameter clamping and the chat turn protocol: the
//! user turn is appended before the network attempt, the assistant turn
//! only after a success. One attempt per dispatch, no retries.

use std::ops::RangeInclusive;

use crate::providers::{CompletionProvider, CompletionRequest, DispatchError};
use crate::session::{Conversation, Message, Role};
use crate::updates::UpdateIndex;

pub const TEMPERATURE_RANGE: RangeInclusive<f64> = 0.1..=1.0;
pub const MAX_TOKENS_RANGE: RangeInclusive<u32> = 500..=4000;

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Chat inputs containing this phrase are answered locally from the update
/// index, skipping the network.
const UPDATES_SHORTCUT: &str = "latest updates";

/// Sampling parameters as requested by the caller. Clamped at dispatch
/// time; callers cannot push out-of-range values to the API.
#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl GenerationParams {
    pub fn clamped(self) -> Self {
        Self {
            temperature: self
                .temperature
                .clamp(*TEMPERATURE_RANGE.start(), *TEMPERATURE_RANGE.end()),
            max_tokens: self
                .max_tokens
                .clamp(*MAX_TOKENS_RANGE.start(), *MAX_TOKENS_RANGE.end()),
        }
    }
}

/// Outcome of one chat turn.
#[derive(Debug)]
pub enum TurnOutcome {
    /// Assistant reply appended to the conversation.
    Reply(String),
    /// Answered locally from the update index, no network call.
    LocalReply(String),
    /// Dispatch failed; the user turn stays, no assistant turn was added.
    Failed(DispatchError),
}

pub struct Dispatcher {
    provider: Box<dyn CompletionProvider>,
    model: String,
}

impl Dispatcher {
    pub fn new(provider: Box<dyn CompletionProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One chat turn: append the user message, then either answer locally
    /// (updates shortcut) or make a single completion attempt. On failure
    /// the conversation keeps the user turn and gains no assistant turn.
    pub async fn chat_turn(
        &self,
        conversation: &mut Conversation,
        input: &str,
        index: &UpdateIndex,
        params: GenerationParams,
    ) -> TurnOutcome {
        conversation.append(Role::User, input);

        if input.to_lowercase().contains(UPDATES_SHORTCUT) {
            let reply = index.latest_highlights();
            conversation.append(Role::Assistant, reply.clone());
            return TurnOutcome::LocalReply(reply);
        }

        let params = params.clamped();
        let request = CompletionRequest {
            messages: conversation.messages(),
            model: &self.model,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        match self.provider.complete(request).await {
            Ok(reply) => {
                conversation.append(Role::Assistant, reply.clone());
                TurnOutcome::Reply(reply)
            }
            Err(error) => {
                tracing::warn!(%error, "chat dispatch failed");
                TurnOutcome::Failed(error)
            }
        }
    }

    /// One-off task dispatch: a system prompt plus one user message, no
    /// conversation state. Returns the reply text.
    pub async fn task(
        &self,
        system_prompt: &str,
        user_content: &str,
        params: GenerationParams,
    ) -> Result<String, DispatchError> {
        let params = params.clamped();
        let messages = [Message::system(system_prompt), Message::user(user_content)];
        let request = CompletionRequest {
            messages: &messages,
            model: &self.model,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };
        self.provider.complete(request).await
    }
}
