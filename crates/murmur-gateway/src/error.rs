use murmur_db::StorageError;
use murmur_types::events::ServerEvent;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    Authorization,
    NotFound,
    Storage,
    Validation,
}

/// Failure of a single gateway request. The display text is what the client
/// sees in `errorMessage`.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("authentication failed")]
    Unauthenticated,

    /// Join refused. Also used when the membership lookup itself failed.
    #[error("you do not have access to this conversation")]
    AccessDenied,

    #[error("you are not a participant of this conversation")]
    NotAParticipant,

    #[error("conversation does not exist")]
    ConversationNotFound,

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("message could not be sent")]
    MessageNotSent(#[source] StorageError),

    #[error("failed to fetch messages")]
    MessagesUnavailable(#[source] StorageError),

    #[error("failed to fetch conversations")]
    ConversationsUnavailable(#[source] StorageError),
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated => ErrorKind::Authentication,
            Self::AccessDenied | Self::NotAParticipant => ErrorKind::Authorization,
            Self::ConversationNotFound => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::MessageNotSent(_)
            | Self::MessagesUnavailable(_)
            | Self::ConversationsUnavailable(_) => ErrorKind::Storage,
        }
    }

    pub fn to_event(&self) -> ServerEvent {
        ServerEvent::error(self.to_string())
    }
}

pub(crate) fn require_conversation_id(conversation_id: &str) -> Result<(), GatewayError> {
    if conversation_id.trim().is_empty() {
        return Err(GatewayError::Validation(
            "conversationId must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_failures_hide_the_cause() {
        let err = GatewayError::MessageNotSent(StorageError::LockPoisoned);
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(
            err.to_event(),
            ServerEvent::error("message could not be sent")
        );
    }

    #[test]
    fn blank_conversation_id_is_invalid() {
        assert!(matches!(
            require_conversation_id("  "),
            Err(GatewayError::Validation(_))
        ));
        assert!(require_conversation_id("c1").is_ok());
    }
}
