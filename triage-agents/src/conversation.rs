//! Chat log kept by the client and the wire turns sent to the router.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Number of earlier messages sent along with each new user message.
pub const HISTORY_WINDOW: usize = 5;

/// First message shown in every chat.
pub const GREETING: &str = "Hi! How can I help you today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// Delivery progress of a user message. Ordered, and only ever advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Received,
    Read,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    pub is_medical_request: bool,
    pub is_legal_request: bool,
    pub detected_language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub sender: Sender,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MessageStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            status: Some(MessageStatus::Sent),
            timestamp: Some(Utc::now().timestamp_millis()),
            metadata: None,
        }
    }

    pub fn bot(text: impl Into<String>, metadata: Option<MessageMetadata>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
            status: None,
            timestamp: Some(Utc::now().timestamp_millis()),
            metadata,
        }
    }

    pub fn greeting() -> Self {
        Self {
            sender: Sender::Bot,
            text: GREETING.to_string(),
            status: None,
            timestamp: None,
            metadata: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the `conversation` array on the router endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
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

impl From<&Message> for ConversationTurn {
    fn from(message: &Message) -> Self {
        match message.sender {
            Sender::User => Self::user(message.text.clone()),
            Sender::Bot => Self::assistant(message.text.clone()),
        }
    }
}

/// Append-only message log of one chat session.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_greeting() -> Self {
        Self {
            messages: vec![Message::greeting()],
        }
    }

    /// Appends a message and returns its index.
    pub fn push(&mut self, message: Message) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The last `n` messages as wire turns, oldest first.
    pub fn recent_turns(&self, n: usize) -> Vec<ConversationTurn> {
        let start = self.messages.len().saturating_sub(n);
        self.messages[start..].iter().map(ConversationTurn::from).collect()
    }

    /// Moves a user message forward to `status`. Returns false when the index
    /// is not a user message or the message is already at or past `status`.
    pub fn advance_status(&mut self, index: usize, status: MessageStatus) -> bool {
        match self.messages.get_mut(index) {
            Some(message) if message.sender == Sender::User => match message.status {
                Some(current) if current >= status => false,
                _ => {
                    message.status = Some(status);
                    true
                }
            },
            _ => false,
        }
    }

    /// Advances every user message to `status`; returns how many moved.
    pub fn advance_all(&mut self, status: MessageStatus) -> usize {
        (0..self.messages.len())
            .filter(|&index| self.advance_status(index, status))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_turns_truncates_and_maps_roles() {
        let mut conversation = Conversation::with_greeting();
        for i in 0..4 {
            conversation.push(Message::user(format!("question {i}")));
            conversation.push(Message::bot(format!("answer {i}"), None));
        }

        let turns = conversation.recent_turns(HISTORY_WINDOW);
        assert_eq!(turns.len(), 5);
        assert_eq!(turns[0], ConversationTurn::assistant("answer 1"));
        assert_eq!(turns[4], ConversationTurn::assistant("answer 3"));
        assert_eq!(turns[3], ConversationTurn::user("question 3"));
    }

    #[test]
    fn test_recent_turns_on_short_conversation() {
        let conversation = Conversation::with_greeting();
        assert_eq!(
            conversation.recent_turns(HISTORY_WINDOW),
            vec![ConversationTurn::assistant(GREETING)]
        );
    }

    #[test]
    fn test_status_only_moves_forward() {
        let mut conversation = Conversation::new();
        let idx = conversation.push(Message::user("hello"));

        assert!(conversation.advance_status(idx, MessageStatus::Received));
        assert!(conversation.advance_status(idx, MessageStatus::Read));
        assert!(!conversation.advance_status(idx, MessageStatus::Received));
        assert_eq!(
            conversation.messages()[idx].status,
            Some(MessageStatus::Read)
        );
    }

    #[test]
    fn test_bot_messages_have_no_status() {
        let mut conversation = Conversation::with_greeting();
        assert!(!conversation.advance_status(0, MessageStatus::Read));
        conversation.push(Message::user("one"));
        conversation.push(Message::user("two"));
        assert_eq!(conversation.advance_all(MessageStatus::Read), 2);
        assert_eq!(conversation.messages()[0].status, None);
    }

    #[test]
    fn test_turn_wire_format() {
        let value = serde_json::to_value(ConversationTurn::assistant("hi")).unwrap();
        assert_eq!(value, serde_json::json!({"role": "assistant", "content": "hi"}));
    }
}
