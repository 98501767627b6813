use tracing::{debug, error, info, warn};

use crate::connection::Session;
use crate::error::{GatewayError, require_conversation_id};
use crate::state::{AppState, with_db};

/// Admit the caller's connection to a conversation's broadcast group if the
/// caller is an active participant. Nothing is announced to other members.
pub async fn join_conversation(
    state: &AppState,
    session: &Session,
    conversation_id: String,
) -> Result<(), GatewayError> {
    require_conversation_id(&conversation_id)?;

    let cid = conversation_id.clone();
    let uid = session.user_id().to_string();
    let is_member = match with_db(state, move |db| db.is_active_participant(&cid, &uid)).await {
        Ok(is_member) => is_member,
        Err(e) => {
            // Lookup failures are reported to the caller as a plain denial
            error!(
                "Membership lookup for {} in {} failed: {}",
                session.user_id(),
                conversation_id,
                e
            );
            return Err(GatewayError::AccessDenied);
        }
    };

    if !is_member {
        warn!(
            "{} denied access to conversation {}",
            session.user_id(),
            conversation_id
        );
        return Err(GatewayError::AccessDenied);
    }

    if state
        .dispatcher
        .join_group(&conversation_id, session.conn_id)
        .await
    {
        info!(
            "{} (conn {}) joined conversation {}",
            session.user_id(),
            session.conn_id,
            conversation_id
        );
    } else {
        debug!(
            "Connection {} closed before joining {}",
            session.conn_id, conversation_id
        );
    }

    Ok(())
}
