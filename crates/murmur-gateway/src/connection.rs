use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use murmur_types::events::{ClientEvent, ServerEvent};

use crate::dispatcher::{ConnId, Dispatcher};
use crate::error::{ErrorKind, GatewayError};
use crate::identity::Identity;
use crate::state::AppState;
use crate::{channels, conversations, messages};

/// Consecutive unanswered pings before the connection is dropped.
const MAX_MISSED_HEARTBEATS: u8 = 2;

/// One authenticated connection as seen by the request handlers.
#[derive(Debug, Clone)]
pub struct Session {
    pub conn_id: ConnId,
    pub identity: Identity,
}

impl Session {
    /// Register a new connection with the dispatcher.
    pub async fn open(
        dispatcher: &Dispatcher,
        identity: Identity,
    ) -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (conn_id, rx) = dispatcher.register_connection(identity.user_id()).await;
        (Self { conn_id, identity }, rx)
    }

    pub fn user_id(&self) -> &str {
        self.identity.user_id()
    }
}

/// Serve an upgraded websocket until either side goes away.
pub async fn handle_connection(socket: WebSocket, state: AppState, identity: Identity) {
    let (session, events_rx) = Session::open(&state.dispatcher, identity).await;
    info!(
        "{} connected to gateway (conn {})",
        session.user_id(),
        session.conn_id
    );

    let (sender, receiver) = socket.split();
    run_connection_loop(sender, receiver, state.clone(), session.clone(), events_rx).await;

    // In-flight handlers keep running; only group membership ends here
    state.dispatcher.unregister_connection(session.conn_id).await;
    info!(
        "{} disconnected from gateway (conn {})",
        session.user_id(),
        session.conn_id
    );
}

async fn run_connection_loop(
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
    mut receiver: futures_util::stream::SplitStream<WebSocket>,
    state: AppState,
    session: Session,
    mut events_rx: mpsc::UnboundedReceiver<ServerEvent>,
) {
    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();
    let heartbeat_interval = state.config.heartbeat_interval;

    // Forward queued events -> client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(heartbeat_interval);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                event = events_rx.recv() => {
                    let Some(event) = event else { break };
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            error!("Failed to encode outbound event: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= MAX_MISSED_HEARTBEATS {
                            warn!("Heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Read events from client; each one is handled in its own task
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientEvent>(text.as_str()) {
                    Ok(event) => {
                        tokio::spawn(dispatch(state.clone(), session.clone(), event));
                    }
                    Err(e) => {
                        let raw: String = text.as_str().chars().take(200).collect();
                        warn!("{} bad event: {} -- raw: {}", session.user_id(), e, raw);
                        let err = GatewayError::Validation(e.to_string());
                        state
                            .dispatcher
                            .send_to_connection(session.conn_id, err.to_event())
                            .await;
                    }
                },
                Message::Binary(_) => {
                    let err = GatewayError::Validation("binary frames are not supported".into());
                    state
                        .dispatcher
                        .send_to_connection(session.conn_id, err.to_event())
                        .await;
                }
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

/// Handle one client event. Replies and errors go to the requesting
/// connection only; message broadcasts go through the conversation group.
pub async fn dispatch(state: AppState, session: Session, event: ClientEvent) {
    let name = event.name();
    debug!("{} (conn {}) -> {}", session.user_id(), session.conn_id, name);

    let outcome = match event {
        ClientEvent::JoinConversation(conversation_id) => {
            channels::join_conversation(&state, &session, conversation_id)
                .await
                .map(|()| None)
        }
        ClientEvent::SendMessage(req) => messages::send_message(&state, &session, req)
            .await
            .map(|_| None),
        ClientEvent::GetConversationMessages(query) => {
            messages::get_conversation_messages(&state, &session, query)
                .await
                .map(|messages| Some(ServerEvent::ConversationMessages { messages }))
        }
        ClientEvent::GetUserConversations => {
            conversations::get_user_conversations(&state, &session)
                .await
                .map(|conversations| Some(ServerEvent::UserConversations { conversations }))
        }
    };

    let reply = match outcome {
        Ok(reply) => reply,
        Err(err) => {
            if err.kind() == ErrorKind::Storage {
                error!("{} failed for {}: {:?}", name, session.user_id(), err);
            } else {
                warn!("{} rejected for {}: {}", name, session.user_id(), err);
            }
            Some(err.to_event())
        }
    };

    if let Some(event) = reply {
        state
            .dispatcher
            .send_to_connection(session.conn_id, event)
            .await;
    }
}
