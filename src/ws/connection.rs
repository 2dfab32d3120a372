//! Per-session read/write loop.
//!
//! Forwards payloads queued in the [`ConnectionHub`] to the socket and
//! watches the socket for closure. When the loop ends the session leaves
//! the hub and the disconnect handler runs.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use crate::domain::ConnectionId;
use crate::service::LifecycleService;
use crate::transport::ConnectionHub;
use crate::transport::hub::SessionReceiver;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Writes every payload queued for `id` as a text frame.
/// - Reads client frames only to detect closure; client messages carry no
///   commands.
pub async fn run_connection(
    socket: WebSocket,
    id: ConnectionId,
    mut outbound: SessionReceiver,
    hub: Arc<ConnectionHub>,
    lifecycle: LifecycleService,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            // Incoming frame from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %id, error = %e, "ws read error");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
            // Payload queued by a broadcast
            payload = outbound.recv() => {
                let Some(payload) = payload else {
                    // Session was replaced or unregistered.
                    break;
                };
                if ws_tx.send(Message::text(payload)).await.is_err() {
                    break;
                }
            }
        }
    }

    hub.unregister(&id);
    // Failures are logged by the handler; a stale entry is pruned by the
    // next broadcast.
    let _ = lifecycle.disconnect(&id).await;
    tracing::debug!(connection_id = %id, "ws connection closed");
}
