//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::connection::run_connection;
use crate::app_state::AppState;

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
///
/// The session is opened in the hub before the connect handler runs, so a
/// broadcast that sees the new registry entry can already queue to it. If
/// the registry write fails the upgrade is refused with `500`.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let id = state.hub.issue();
    let outbound = state.hub.register(id.clone());

    let ack = state.lifecycle.connect(&id).await;
    if !ack.is_success() {
        state.hub.unregister(&id);
        return (StatusCode::INTERNAL_SERVER_ERROR, ack.body).into_response();
    }

    let hub = Arc::clone(&state.hub);
    let lifecycle = state.lifecycle.clone();
    ws.on_upgrade(move |socket| run_connection(socket, id, outbound, hub, lifecycle))
}
