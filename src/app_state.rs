//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::service::LifecycleService;
use crate::transport::ConnectionHub;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Connect/disconnect handlers over the registry.
    pub lifecycle: LifecycleService,
    /// Bus that ingested records are published to.
    pub event_bus: EventBus,
    /// Sessions accepted by this process at `/ws`.
    pub hub: Arc<ConnectionHub>,
}
