//! Connection registry: the set of currently connected session ids.
//!
//! The registry is the only shared mutable state in the gateway. Every
//! write is idempotent, so independent callers (connect, disconnect and
//! broadcast pruning) never need to coordinate.
//!
//! Two backends implement [`ConnectionRegistry`]:
//!
//! - [`MemoryRegistry`]: process-local, used when persistence is disabled.
//! - [`PostgresRegistry`]: one `sqlx` table keyed by `connection_id`.

pub mod memory;
pub mod postgres;

use std::collections::HashSet;
use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::ConnectionId;
use crate::error::GatewayError;

pub use memory::MemoryRegistry;
pub use postgres::PostgresRegistry;

/// Durable store of connected session ids.
///
/// Implementations must be safe to call concurrently from independent
/// tasks. Any failure to reach the backing store is reported as
/// [`GatewayError::StoreUnavailable`].
#[async_trait]
pub trait ConnectionRegistry: Send + Sync + Debug {
    /// Inserts `id`. Inserting an id that is already present is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] if the store cannot be reached.
    async fn put(&self, id: &ConnectionId) -> Result<(), GatewayError>;

    /// Removes `id`. Removing an absent id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] if the store cannot be reached.
    async fn delete(&self, id: &ConnectionId) -> Result<(), GatewayError>;

    /// Returns a point-in-time snapshot of every registered id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] if the store cannot be reached.
    async fn scan(&self) -> Result<HashSet<ConnectionId>, GatewayError>;

    /// Number of registered ids.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] if the store cannot be reached.
    async fn len(&self) -> Result<usize, GatewayError> {
        Ok(self.scan().await?.len())
    }
}
