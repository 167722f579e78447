//! WebSocket route handler.

use crate::state::AppState;
use crate::websocket::handle_websocket;
use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// GET /ws
///
/// A request that cannot be upgraded never reaches the relay: nothing is
/// registered and no reader is started.
pub async fn upgrade(
    State(state): State<Arc<AppState>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    match ws {
        Ok(ws) => ws
            .on_failed_upgrade(|e| {
                tracing::warn!(target: "relay::ws", "WebSocket upgrade failed: {}", e);
            })
            .on_upgrade(move |socket| handle_connection(socket, state)),
        Err(rejection) => {
            tracing::warn!(target: "relay::ws", "Rejected WebSocket upgrade: {}", rejection);
            rejection.into_response()
        }
    }
}

async fn handle_connection(socket: WebSocket, state: Arc<AppState>) {
    if let Err(e) = handle_websocket(socket, state).await {
        tracing::error!(target: "relay::ws", "WebSocket error: {}", e);
    }
}
