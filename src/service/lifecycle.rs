//! Connect and disconnect handlers.
//!
//! Thin triggers over the registry. A connect failure rejects the client's
//! connection attempt; a disconnect failure is only logged by the caller,
//! since broadcast pruning removes the entry later anyway.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ConnectionId;
use crate::registry::ConnectionRegistry;

/// Acknowledgement returned to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleResponse {
    /// `200` on success, `500` when the registry could not be updated.
    pub status_code: u16,
    /// Short description for the transport's logs.
    pub body: String,
}

impl LifecycleResponse {
    /// Builds a response with the given status and body.
    #[must_use]
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
        }
    }

    /// Returns `true` for a 2xx status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status_code >= 200 && self.status_code < 300
    }
}

/// Registry writes triggered by transport lifecycle signals.
#[derive(Debug, Clone)]
pub struct LifecycleService {
    registry: Arc<dyn ConnectionRegistry>,
}

impl LifecycleService {
    /// Creates the handlers over `registry`.
    #[must_use]
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the underlying registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<dyn ConnectionRegistry> {
        &self.registry
    }

    /// Registers a newly opened session.
    pub async fn connect(&self, id: &ConnectionId) -> LifecycleResponse {
        tracing::info!(connection_id = %id, "connected");
        match self.registry.put(id).await {
            Ok(()) => LifecycleResponse::new(200, "Connected"),
            Err(e) => {
                tracing::error!(connection_id = %id, error = %e, "connect failed");
                LifecycleResponse::new(500, "Connection failed")
            }
        }
    }

    /// Removes a closed session.
    pub async fn disconnect(&self, id: &ConnectionId) -> LifecycleResponse {
        tracing::info!(connection_id = %id, "disconnected");
        match self.registry.delete(id).await {
            Ok(()) => LifecycleResponse::new(200, "Disconnected"),
            Err(e) => {
                tracing::error!(connection_id = %id, error = %e, "disconnect failed");
                LifecycleResponse::new(500, "Disconnection failed")
            }
        }
    }
}
