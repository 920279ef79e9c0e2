//! Per-session conversation state — priming messages, append-only history.

use crate::credentials::Credential;
use serde::{Deserialize, Serialize};

/// How many trailing messages the chat view renders.
pub const DISPLAY_MESSAGE_LIMIT: usize = 50;

/// Role of a message participant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One conversational turn exchanged with the completion API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only, ordered message log for one user session.
///
/// Every conversation begins with the fixed priming sequence; user and
/// assistant turns are only ever appended after it. Nothing is removed or
/// reordered — `recent` truncates for display only.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Conversation seeded with the fixed system priming plus the greeting.
    pub fn new() -> Self {
        let mut conversation = Self::empty();
        for primer in [
            "You are StreamSage, a specialized AI assistant trained in Streamlit.",
            "StreamSage is powered by the OpenAI GPT-4o-mini model, released on July 18, 2024.",
            "You are trained up to Streamlit Version 1.36.0, released on June 20, 2024.",
            "Refer to conversation history to provide context to your response.",
            "You were created by Madie Laine, an OpenAI Researcher.",
        ] {
            conversation.push(Message::system(primer));
        }
        conversation.push(Message::assistant(
            "Hello! I am StreamSage. How can I assist you with Streamlit today?",
        ));
        conversation
    }

    /// Empty conversation, no priming. Used for one-off task dispatches.
    pub fn empty() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.push(Message {
            role,
            content: content.into(),
        });
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Last `n` messages in original order. Non-destructive.
    pub fn recent(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Everything one user session owns: id, accepted credential, history.
///
/// Passed explicitly to every operation that needs it — there is no
/// module-level session state.
pub struct Session {
    pub id: String,
    pub credential: Credential,
    pub conversation: Conversation,
}

impl Session {
    pub fn new(credential: Credential) -> Self {
        let mut id = uuid::Uuid::new_v4().to_string();
        id.truncate(8);
        Self {
            id,
            credential,
            conversation: Conversation::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priming_precedes_any_user_turn() {
        let conversation = Conversation::new();
        assert_eq!(conversation.len(), 6);
        assert!(conversation.messages()[..5]
            .iter()
            .all(|m| m.role == Role::System));
        assert_eq!(conversation.messages()[5].role, Role::Assistant);
        assert!(conversation.messages()[5].content.contains("StreamSage"));
    }

    #[test]
    fn append_is_strictly_additive() {
        let mut conversation = Conversation::new();
        let before = conversation.messages().to_vec();

        conversation.append(Role::User, "how do I cache data?");

        assert_eq!(conversation.len(), before.len() + 1);
        assert_eq!(&conversation.messages()[..before.len()], &before[..]);
        assert_eq!(
            conversation.last().unwrap().content,
            "how do I cache data?"
        );
    }

    #[test]
    fn recent_returns_at_most_min_n_len() {
        let mut conversation = Conversation::empty();
        for i in 0..4 {
            conversation.append(Role::User, format!("msg {i}"));
        }

        assert_eq!(conversation.recent(2).len(), 2);
        assert_eq!(conversation.recent(10).len(), 4);
        assert_eq!(conversation.recent(0).len(), 0);
    }

    #[test]
    fn recent_preserves_order_and_state() {
        let mut conversation = Conversation::empty();
        conversation.append(Role::User, "first");
        conversation.append(Role::Assistant, "second");
        conversation.append(Role::User, "third");

        let window = conversation.recent(2);
        assert_eq!(window[0].content, "second");
        assert_eq!(window[1].content, "third");

        // recent() must not mutate
        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.messages()[0].content, "first");
    }

    #[test]
    fn role_serialization_is_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
    }

    #[test]
    fn session_id_is_short() {
        let session = Session::new(crate::credentials::validate("sk-unit-test-key").unwrap());
        assert_eq!(session.id.len(), 8);
    }
}
