mod common;

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tower::ServiceExt;

use murmur_gateway::routes::router;
use murmur_gateway::AppState;
use murmur_types::events::ServerEvent;
use murmur_types::models::MessageState;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    addr
}

async fn open(addr: SocketAddr, token: &str) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}/gateway?token={token}"))
        .await
        .unwrap();
    ws
}

async fn emit(ws: &mut Client, event: serde_json::Value) {
    ws.send(Message::text(event.to_string())).await.unwrap();
}

async fn next_event(ws: &mut Client) -> ServerEvent {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str::<ServerEvent>(text.as_str()).unwrap();
                }
                Some(Ok(_)) => continue,
                other => panic!("socket ended: {:?}", other),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

#[tokio::test]
async fn handshake_without_token_is_401() {
    let app = router(common::state());

    let response = app
        .oneshot(Request::get("/gateway").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({"error": "authentication failed"}));
}

#[tokio::test]
async fn blank_bearer_is_401() {
    let app = router(common::state());

    let response = app
        .oneshot(
            Request::get("/gateway")
                .header(header::AUTHORIZATION, "Bearer ")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_answers_ok() {
    let response = router(common::state())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn websocket_refused_without_token() {
    let addr = serve(common::state()).await;
    assert!(connect_async(format!("ws://{addr}/gateway")).await.is_err());
}

#[tokio::test]
async fn live_conversation_over_websocket() {
    let state = common::state();
    let addr = serve(state.clone()).await;

    let mut alice = open(addr, "u1").await;
    let mut carl = open(addr, "u3").await;

    emit(&mut alice, json!({"type": "joinConversation", "data": "c1"})).await;
    emit(&mut carl, json!({"type": "joinConversation", "data": "c1"})).await;

    // Joins are silent; give them time to land before sending
    tokio::time::sleep(Duration::from_millis(300)).await;

    emit(
        &mut alice,
        json!({"type": "sendMessage", "data": {"conversationId": "c1", "content": "hi"}}),
    )
    .await;

    let ServerEvent::ReceiveMessage(for_alice) = next_event(&mut alice).await else {
        panic!("alice expected receiveMessage");
    };
    let ServerEvent::ReceiveMessage(for_carl) = next_event(&mut carl).await else {
        panic!("carl expected receiveMessage");
    };
    assert_eq!(for_alice, for_carl);
    assert_eq!(for_alice.message.content, "hi");
    assert_eq!(for_alice.state, MessageState::Delivered);

    emit(
        &mut carl,
        json!({"type": "getConversationMessages", "data": {"conversationId": "c1"}}),
    )
    .await;
    let ServerEvent::ConversationMessages { messages } = next_event(&mut carl).await else {
        panic!("carl expected conversationMessages");
    };
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message.id, for_alice.message.id);

    alice.close(None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(state.dispatcher.connection_count().await, 1);
}

#[tokio::test]
async fn malformed_frame_keeps_connection_open() {
    let addr = serve(common::state()).await;
    let mut alice = open(addr, "u1").await;

    alice.send(Message::text("{not json".to_string())).await.unwrap();
    let ServerEvent::ErrorMessage { error } = next_event(&mut alice).await else {
        panic!("expected errorMessage");
    };
    assert!(error.starts_with("invalid request"), "{}", error);

    emit(&mut alice, json!({"type": "getUserConversations"})).await;
    assert!(matches!(
        next_event(&mut alice).await,
        ServerEvent::UserConversations { .. }
    ));
}
