//! Connection endpoints: lifecycle triggers, registry size, management send.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{ConnectionCountResponse, LifecycleRequest, LifecycleResponse};
use crate::app_state::AppState;
use crate::domain::ConnectionId;
use crate::error::{ErrorResponse, GatewayError, SendError};
use crate::transport::Transport;

fn lifecycle_reply(response: LifecycleResponse) -> impl IntoResponse {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response))
}

/// `POST /connections/connect` — Register a session opened by an external transport.
#[utoipa::path(
    post,
    path = "/api/v1/connections/connect",
    tag = "Connections",
    summary = "Connect trigger",
    request_body = LifecycleRequest,
    responses(
        (status = 200, description = "Connection registered", body = LifecycleResponse),
        (status = 500, description = "Registry unavailable", body = LifecycleResponse),
    )
)]
pub async fn connect(
    State(state): State<AppState>,
    Json(req): Json<LifecycleRequest>,
) -> impl IntoResponse {
    lifecycle_reply(state.lifecycle.connect(&req.connection_id).await)
}

/// `POST /connections/disconnect` — Remove a session closed by an external transport.
#[utoipa::path(
    post,
    path = "/api/v1/connections/disconnect",
    tag = "Connections",
    summary = "Disconnect trigger",
    request_body = LifecycleRequest,
    responses(
        (status = 200, description = "Connection removed", body = LifecycleResponse),
        (status = 500, description = "Registry unavailable", body = LifecycleResponse),
    )
)]
pub async fn disconnect(
    State(state): State<AppState>,
    Json(req): Json<LifecycleRequest>,
) -> impl IntoResponse {
    lifecycle_reply(state.lifecycle.disconnect(&req.connection_id).await)
}

/// `GET /connections` — Number of registered connections.
///
/// # Errors
///
/// Returns [`GatewayError::StoreUnavailable`] if the registry cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/connections",
    tag = "Connections",
    summary = "Registry size",
    responses(
        (status = 200, description = "Registered connection count", body = ConnectionCountResponse),
        (status = 500, description = "Registry unavailable", body = ErrorResponse),
    )
)]
pub async fn count(
    State(state): State<AppState>,
) -> Result<Json<ConnectionCountResponse>, GatewayError> {
    let count = state.lifecycle.registry().len().await?;
    Ok(Json(ConnectionCountResponse { count }))
}

/// `POST /@connections/{connection_id}` — Push a payload to a local session.
///
/// Answers `410 Gone` when a session issued here is no longer open, which
/// remote broadcasters treat as the signal to prune. A payload that is not
/// UTF-8 text is rejected with `400`.
#[utoipa::path(
    post,
    path = "/@connections/{connection_id}",
    tag = "Connections",
    summary = "Post to connection",
    params(("connection_id" = String, Path, description = "Session id")),
    request_body(content = String, content_type = "application/json"),
    responses(
        (status = 200, description = "Payload queued for the session"),
        (status = 400, description = "Payload is not UTF-8 text"),
        (status = 410, description = "Session no longer exists"),
        (status = 500, description = "Session is not held by this gateway"),
    )
)]
pub async fn post_to_connection(
    State(state): State<AppState>,
    Path(connection_id): Path<String>,
    body: Bytes,
) -> StatusCode {
    let id = ConnectionId::from(connection_id);
    let Ok(payload) = std::str::from_utf8(&body) else {
        tracing::debug!(connection_id = %id, "rejected non UTF-8 payload");
        return StatusCode::BAD_REQUEST;
    };
    match state.hub.send(&id, payload).await {
        Ok(()) => StatusCode::OK,
        Err(SendError::RecipientGone) => StatusCode::GONE,
        Err(SendError::DeliveryFailed(e)) => {
            tracing::warn!(connection_id = %id, error = %e, "management send failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Connection routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/connections", get(count))
        .route("/connections/connect", post(connect))
        .route("/connections/disconnect", post(disconnect))
}

/// Management routes mounted at the root level.
pub fn management_routes() -> Router<AppState> {
    Router::new().route("/@connections/{connection_id}", post(post_to_connection))
}
