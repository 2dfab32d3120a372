//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; health and the
//! connection management endpoint live at the root.

pub mod dto;
pub mod handlers;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
        .merge(handlers::connections::management_routes())
}

/// OpenAPI document for the REST surface.
#[cfg(feature = "swagger-ui")]
#[derive(Debug, utoipa::OpenApi)]
#[openapi(
    paths(
        handlers::system::health_handler,
        handlers::events::put_events,
        handlers::connections::connect,
        handlers::connections::disconnect,
        handlers::connections::count,
        handlers::connections::post_to_connection,
    ),
    components(schemas(
        dto::PutEventsEntry,
        dto::PutEventsRequest,
        dto::PutEventsResponse,
        dto::PutEventsResultEntry,
        dto::LifecycleRequest,
        dto::LifecycleResponse,
        dto::ConnectionCountResponse,
        crate::domain::StatusEvent,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "Events", description = "Event bus ingest"),
        (name = "Connections", description = "Connection lifecycle and management"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;
