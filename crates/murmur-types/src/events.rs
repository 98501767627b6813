use serde::{Deserialize, Serialize};

use crate::api::{MessagesQuery, SendMessageRequest};
use crate::models::{ConversationSummary, HistoryEntry, MessageView};

/// Events sent FROM client TO server over the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Enter a conversation's broadcast group
    JoinConversation(String),

    /// Post a message into a conversation
    SendMessage(SendMessageRequest),

    /// Page through a conversation's history
    GetConversationMessages(MessagesQuery),

    /// List the caller's conversations with their rosters
    GetUserConversations,
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinConversation(_) => "joinConversation",
            Self::SendMessage(_) => "sendMessage",
            Self::GetConversationMessages(_) => "getConversationMessages",
            Self::GetUserConversations => "getUserConversations",
        }
    }
}

/// Events sent FROM server TO client over the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// A new message was persisted in a conversation the connection joined
    ReceiveMessage(MessageView),

    /// Reply to getConversationMessages
    ConversationMessages { messages: Vec<HistoryEntry> },

    /// Reply to getUserConversations
    UserConversations {
        conversations: Vec<ConversationSummary>,
    },

    /// Any request failure, delivered only to the requesting connection
    ErrorMessage { error: String },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::ErrorMessage {
            error: message.into(),
        }
    }
}
