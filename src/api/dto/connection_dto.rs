//! Connection lifecycle DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ConnectionId;

pub use crate::service::lifecycle::LifecycleResponse;

/// Lifecycle trigger sent by a transport on connect or disconnect.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LifecycleRequest {
    /// Transport-assigned session id.
    pub connection_id: ConnectionId,
}

/// Response body of `GET /api/v1/connections`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConnectionCountResponse {
    /// Number of registered connections.
    pub count: usize,
}
