use chrono::{SubsecRound, Utc};
use tracing::info;
use uuid::Uuid;

use murmur_types::api::{DEFAULT_MESSAGE_TYPE, MessagesQuery, SendMessageRequest};
use murmur_types::events::ServerEvent;
use murmur_types::models::{HistoryEntry, Message, MessageState, MessageView};

use crate::connection::Session;
use crate::error::{GatewayError, require_conversation_id};
use crate::state::{AppState, with_db};

/// Persist a message with the sender's read receipt and broadcast it to the
/// conversation's group.
///
/// The existence check, the membership check and the write are independent
/// round trips. A membership revoked between the check and the write does not
/// stop the message.
pub async fn send_message(
    state: &AppState,
    session: &Session,
    req: SendMessageRequest,
) -> Result<MessageView, GatewayError> {
    require_conversation_id(&req.conversation_id)?;
    let sender_id = session.user_id().to_string();

    let cid = req.conversation_id.clone();
    let exists = with_db(state, move |db| db.conversation_exists(&cid))
        .await
        .map_err(GatewayError::MessageNotSent)?;
    if !exists {
        return Err(GatewayError::ConversationNotFound);
    }

    let cid = req.conversation_id.clone();
    let uid = sender_id.clone();
    let is_member = with_db(state, move |db| db.is_active_participant(&cid, &uid))
        .await
        .map_err(GatewayError::MessageNotSent)?;
    if !is_member {
        return Err(GatewayError::NotAParticipant);
    }

    // One timestamp for the message and its receipt, at storage precision
    let now = Utc::now().trunc_subsecs(3);
    let message_type = if req.message_type.trim().is_empty() {
        DEFAULT_MESSAGE_TYPE.to_string()
    } else {
        req.message_type
    };

    let message = Message {
        id: Uuid::new_v4().to_string(),
        conversation_id: req.conversation_id,
        sender_id,
        content: req.content,
        message_type,
        attachment_url: req.attachment_url,
        created_at: now,
        updated_at: now,
        status: true,
    };

    let stored = message.clone();
    let status_id = Uuid::new_v4().to_string();
    with_db(state, move |db| db.insert_message(&stored, &status_id))
        .await
        .map_err(GatewayError::MessageNotSent)?;

    let view = MessageView::delivered(message);
    let reached = state
        .dispatcher
        .broadcast_to_group(
            &view.message.conversation_id,
            ServerEvent::ReceiveMessage(view.clone()),
        )
        .await;

    info!(
        "{} posted {} to {} ({} connections)",
        view.message.sender_id, view.message.id, view.message.conversation_id, reached
    );
    Ok(view)
}

/// Page through a conversation's active messages, oldest first.
pub async fn get_conversation_messages(
    state: &AppState,
    session: &Session,
    query: MessagesQuery,
) -> Result<Vec<HistoryEntry>, GatewayError> {
    require_conversation_id(&query.conversation_id)?;

    if state.config.history_requires_membership {
        let cid = query.conversation_id.clone();
        let uid = session.user_id().to_string();
        let is_member = with_db(state, move |db| db.is_active_participant(&cid, &uid))
            .await
            .map_err(GatewayError::MessagesUnavailable)?;
        if !is_member {
            return Err(GatewayError::NotAParticipant);
        }
    }

    let limit = query.limit.min(state.config.max_page_size);
    let offset = query.offset;
    let cid = query.conversation_id;
    let rows = with_db(state, move |db| db.conversation_messages(&cid, limit, offset))
        .await
        .map_err(GatewayError::MessagesUnavailable)?;

    Ok(rows
        .into_iter()
        .map(|row| HistoryEntry {
            state: MessageState::from_read_flag(row.is_read),
            message: row.message,
            is_read: row.is_read,
            read_at: row.read_at,
        })
        .collect())
}
