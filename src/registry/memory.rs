//! Process-local registry backend.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::ConnectionRegistry;
use crate::domain::ConnectionId;
use crate::error::GatewayError;

/// In-memory [`ConnectionRegistry`].
///
/// A single `RwLock<HashSet<_>>`: scans take the read lock and clone, so
/// the returned set is a snapshot. This backend never fails.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    connections: RwLock<HashSet<ConnectionId>>,
}

impl MemoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `id` is currently registered.
    pub async fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.read().await.contains(id)
    }
}

#[async_trait]
impl ConnectionRegistry for MemoryRegistry {
    async fn put(&self, id: &ConnectionId) -> Result<(), GatewayError> {
        self.connections.write().await.insert(id.clone());
        Ok(())
    }

    async fn delete(&self, id: &ConnectionId) -> Result<(), GatewayError> {
        self.connections.write().await.remove(id);
        Ok(())
    }

    async fn scan(&self) -> Result<HashSet<ConnectionId>, GatewayError> {
        Ok(self.connections.read().await.clone())
    }

    async fn len(&self) -> Result<usize, GatewayError> {
        Ok(self.connections.read().await.len())
    }
}
