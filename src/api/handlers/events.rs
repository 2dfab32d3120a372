//! Bus ingest: producers outside this process publish records here.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{PutEventsRequest, PutEventsResponse, PutEventsResultEntry};
use crate::app_state::AppState;
use crate::domain::BusEvent;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /events` — Publish records onto the event bus.
///
/// Entries are handled independently; an entry addressed to another bus is
/// reported as failed without affecting the rest.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] if `entries` is empty.
#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Publish bus records",
    description = "Accepts a batch of records. Records whose source and detail type match the broadcast rule are fanned out to every connected client.",
    request_body = PutEventsRequest,
    responses(
        (status = 200, description = "Per-entry results", body = PutEventsResponse),
        (status = 400, description = "Empty batch", body = ErrorResponse),
    )
)]
pub async fn put_events(
    State(state): State<AppState>,
    Json(req): Json<PutEventsRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    if req.entries.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "entries must not be empty".to_string(),
        ));
    }

    let mut failed_entry_count = 0;
    let mut entries = Vec::with_capacity(req.entries.len());
    for entry in req.entries {
        if entry.event_bus_name != state.event_bus.name() {
            failed_entry_count += 1;
            entries.push(PutEventsResultEntry {
                event_id: None,
                error_code: Some("UnknownEventBus".to_string()),
                error_message: Some(format!("unknown event bus: {}", entry.event_bus_name)),
            });
            continue;
        }

        let event = BusEvent::from(entry);
        let event_id = event.id;
        let receivers = state.event_bus.publish(event);
        tracing::debug!(%event_id, receivers, "bus record ingested");
        entries.push(PutEventsResultEntry {
            event_id: Some(event_id),
            ..PutEventsResultEntry::default()
        });
    }

    Ok(Json(PutEventsResponse {
        failed_entry_count,
        entries,
    }))
}

/// Event routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/events", post(put_events))
}
