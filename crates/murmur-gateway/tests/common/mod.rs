#![allow(dead_code)]

use murmur_db::{Database, Statement};
use murmur_gateway::connection::Session;
use murmur_gateway::identity::Identity;
use murmur_gateway::{AppState, AppStateInner, GatewayConfig};
use murmur_types::events::ServerEvent;
use tokio::sync::mpsc::UnboundedReceiver;

/// u1 and u3 are active in c1, u4 was removed from it. u1 and u2 share c2.
/// c-closed is inactive.
const SEED: &[&str] = &[
    "INSERT INTO User (id, name, lastName, avatar) VALUES ('u1', 'Ana', 'Ruiz', 'https://img/u1.png')",
    "INSERT INTO User (id, name, lastName, avatar) VALUES ('u2', 'Ben', 'Ortiz', NULL)",
    "INSERT INTO User (id, name, lastName, avatar) VALUES ('u3', 'Cai', 'Lund', NULL)",
    "INSERT INTO User (id, name, lastName, avatar) VALUES ('u4', 'Dee', 'Moss', NULL)",
    "INSERT INTO Conversation (id, status, updatedAt) VALUES ('c1', 1, '2026-10-01T10:00:00.000Z')",
    "INSERT INTO Conversation (id, status, updatedAt) VALUES ('c2', 1, '2026-10-05T10:00:00.000Z')",
    "INSERT INTO Conversation (id, status, updatedAt) VALUES ('c-closed', 0, '2026-10-09T10:00:00.000Z')",
    "INSERT INTO ConversationParticipant (conversationId, userId, status) VALUES ('c1', 'u1', 1)",
    "INSERT INTO ConversationParticipant (conversationId, userId, status) VALUES ('c1', 'u3', 1)",
    "INSERT INTO ConversationParticipant (conversationId, userId, status) VALUES ('c1', 'u4', 0)",
    "INSERT INTO ConversationParticipant (conversationId, userId, status) VALUES ('c2', 'u1', 1)",
    "INSERT INTO ConversationParticipant (conversationId, userId, status) VALUES ('c2', 'u2', 1)",
    "INSERT INTO ConversationParticipant (conversationId, userId, status) VALUES ('c-closed', 'u1', 1)",
];

pub fn seeded_state(config: GatewayConfig) -> AppState {
    let db = Database::open_in_memory().unwrap();
    for sql in SEED {
        db.execute(&Statement::new(*sql)).unwrap();
    }
    AppStateInner::new(db, config)
}

pub fn state() -> AppState {
    seeded_state(GatewayConfig::default())
}

pub async fn connect(state: &AppState, user_id: &str) -> (Session, UnboundedReceiver<ServerEvent>) {
    Session::open(&state.dispatcher, Identity::from_token(user_id).unwrap()).await
}

pub fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn exec(state: &AppState, sql: &str) {
    state.db.execute(&Statement::new(sql)).unwrap();
}

pub fn count(state: &AppState, table: &str) -> i64 {
    let rows = state
        .db
        .execute(&Statement::new(format!("SELECT COUNT(*) AS n FROM {table}")))
        .unwrap();
    rows.first().unwrap().get("n").unwrap()
}
