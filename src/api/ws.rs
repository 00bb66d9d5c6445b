//! WebSocket endpoints: listener upgrade and producer send

use std::sync::Arc;

use axum::{
    extract::{ws::WebSocket, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use log::info;
use serde_json::json;

use super::{ApiError, AppState};
use crate::hub::{keepalive, Connection};
use crate::types::Message;

/// GET /ws/listen - upgrade and hold the listener connection open
pub async fn listen_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Own one listener from registration to teardown.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sink, stream) = socket.split();
    let conn = Arc::new(Connection::new(sink, state.keepalive.write_deadline));
    conn.mark_active();
    let id = conn.id();

    state.hub.register(Arc::clone(&conn)).await;

    let reason = keepalive::run(&conn, stream, &state.keepalive).await;
    info!("[WS] client {} leaving: {}", id, reason);

    // Idempotent: the hub may already have dropped this connection after a
    // failed fan-out write.
    state.hub.unregister(id).await;
}

/// POST /ws/send - validate and submit a message for broadcast
pub async fn send_handler(
    State(state): State<Arc<AppState>>,
    Json(message): Json<Message>,
) -> Response {
    if !message.is_valid() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError::bad_request("Message cannot be empty")),
        )
            .into_response();
    }

    state.hub.broadcast(message).await;
    (
        StatusCode::OK,
        Json(json!({"status": "Message successfully sent"})),
    )
        .into_response()
}
