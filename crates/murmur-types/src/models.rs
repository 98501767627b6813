use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub status: bool,
    pub updated_at: DateTime<Utc>,
}

/// Roster entry for a conversation, taken from the external user directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub last_name: String,
    pub avatar: Option<String>,
}

/// A persisted chat message. Only `status` ever changes after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
    pub message_type: String,
    pub attachment_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: bool,
}

/// Delivery state derived from the read receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageState {
    Delivered,
    Read,
}

impl MessageState {
    pub fn from_read_flag(is_read: bool) -> Self {
        if is_read { Self::Read } else { Self::Delivered }
    }
}

/// Canonical representation broadcast to a conversation after a send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
    #[serde(flatten)]
    pub message: Message,
    pub state: MessageState,
}

impl MessageView {
    pub fn delivered(message: Message) -> Self {
        Self {
            message,
            state: MessageState::Delivered,
        }
    }
}

/// One row of conversation history: the message plus the read receipt it was joined with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub message: Message,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub state: MessageState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub participants: Vec<Participant>,
}
