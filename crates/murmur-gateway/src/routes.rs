use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};

use crate::connection;
use crate::identity::Identity;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/gateway", get(ws_upgrade))
        .route("/health", get(health))
        .with_state(state)
}

/// Identity is extracted before the upgrade, so a missing token is refused
/// with 401 and never reaches the connection loop.
async fn ws_upgrade(
    State(state): State<AppState>,
    identity: Identity,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| connection::handle_connection(socket, state, identity))
}

async fn health() -> &'static str {
    "ok"
}
