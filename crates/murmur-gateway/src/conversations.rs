use futures_util::future::try_join_all;

use murmur_db::StorageError;
use murmur_types::models::ConversationSummary;

use crate::connection::Session;
use crate::error::GatewayError;
use crate::state::{AppState, with_db};

/// The caller's active conversations, newest first, each with its active roster.
/// Each roster is its own lookup; any failed lookup fails the whole request.
pub async fn get_user_conversations(
    state: &AppState,
    session: &Session,
) -> Result<Vec<ConversationSummary>, GatewayError> {
    let uid = session.user_id().to_string();
    let conversations = with_db(state, move |db| db.user_conversations(&uid))
        .await
        .map_err(GatewayError::ConversationsUnavailable)?;

    let lookups = conversations.into_iter().map(|conversation| async move {
        let cid = conversation.id.clone();
        let participants = with_db(state, move |db| db.conversation_participants(&cid)).await?;
        Ok::<_, StorageError>(ConversationSummary {
            conversation,
            participants,
        })
    });

    try_join_all(lookups)
        .await
        .map_err(GatewayError::ConversationsUnavailable)
}
