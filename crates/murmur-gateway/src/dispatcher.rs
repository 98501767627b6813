use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tracing::debug;
use uuid::Uuid;

use murmur_types::events::ServerEvent;

/// Identifies one live websocket. A user may hold several.
pub type ConnId = Uuid;

struct ConnectionEntry {
    user_id: String,
    tx: mpsc::UnboundedSender<ServerEvent>,
}

/// Tracks connected clients and the per-conversation broadcast groups.
#[derive(Clone, Default)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

#[derive(Default)]
struct DispatcherInner {
    /// Outbound queue per connection: conn_id -> entry
    connections: RwLock<HashMap<ConnId, ConnectionEntry>>,

    /// Broadcast groups: conversation_id -> joined connections
    groups: RwLock<HashMap<String, HashSet<ConnId>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection's outbound queue. Returns (conn_id, receiver).
    pub async fn register_connection(
        &self,
        user_id: &str,
    ) -> (ConnId, mpsc::UnboundedReceiver<ServerEvent>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.connections.write().await.insert(
            conn_id,
            ConnectionEntry {
                user_id: user_id.to_string(),
                tx,
            },
        );
        (conn_id, rx)
    }

    /// Drop a connection and remove it from every broadcast group.
    pub async fn unregister_connection(&self, conn_id: ConnId) {
        let removed = self.inner.connections.write().await.remove(&conn_id);

        let mut groups = self.inner.groups.write().await;
        groups.retain(|_, members| {
            members.remove(&conn_id);
            !members.is_empty()
        });

        if let Some(entry) = removed {
            debug!("Unregistered connection {} of {}", conn_id, entry.user_id);
        }
    }

    /// Queue an event for one connection. False if it is gone.
    pub async fn send_to_connection(&self, conn_id: ConnId, event: ServerEvent) -> bool {
        let connections = self.inner.connections.read().await;
        connections
            .get(&conn_id)
            .is_some_and(|entry| entry.tx.send(event).is_ok())
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.connections.read().await.len()
    }

    /// Add a connection to a conversation's group. False if the connection
    /// is no longer registered.
    pub(crate) async fn join_group(&self, conversation_id: &str, conn_id: ConnId) -> bool {
        // Held across the insert; unregister removes the connection before cleaning groups
        let connections = self.inner.connections.read().await;
        if !connections.contains_key(&conn_id) {
            return false;
        }

        self.inner
            .groups
            .write()
            .await
            .entry(conversation_id.to_string())
            .or_default()
            .insert(conn_id);
        true
    }

    /// Hand an event to every connection currently in the group. Returns how
    /// many queues accepted it.
    pub(crate) async fn broadcast_to_group(
        &self,
        conversation_id: &str,
        event: ServerEvent,
    ) -> usize {
        let members: Vec<ConnId> = match self.inner.groups.read().await.get(conversation_id) {
            Some(members) => members.iter().copied().collect(),
            None => return 0,
        };

        let connections = self.inner.connections.read().await;
        members
            .iter()
            .filter_map(|conn_id| connections.get(conn_id))
            .filter(|entry| entry.tx.send(event.clone()).is_ok())
            .count()
    }

    #[cfg(test)]
    pub(crate) async fn group_members(&self, conversation_id: &str) -> HashSet<ConnId> {
        self.inner
            .groups
            .read()
            .await
            .get(conversation_id)
            .cloned()
            .unwrap_or_default()
    }
}
