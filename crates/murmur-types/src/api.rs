use serde::{Deserialize, Serialize};

pub const DEFAULT_MESSAGE_TYPE: &str = "text";
pub const DEFAULT_PAGE_SIZE: u32 = 50;

// -- Messages --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub conversation_id: String,
    pub content: String,
    #[serde(default = "default_message_type")]
    pub message_type: String,
    #[serde(default)]
    pub attachment_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesQuery {
    pub conversation_id: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_message_type() -> String {
    DEFAULT_MESSAGE_TYPE.to_string()
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

// -- Errors --

/// Body of an HTTP-level rejection (handshake failures).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
