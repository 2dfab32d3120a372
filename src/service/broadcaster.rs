//! Broadcast engine: fan one bus event out to every registered connection.
//!
//! Each call to [`Broadcaster::broadcast`] is an independent invocation:
//!
//! 1. scan the registry (abort on failure, never send to a partial set);
//! 2. build one [`Envelope`] and serialize it once;
//! 3. push it to every connection concurrently and join all attempts;
//! 4. prune connections the transport confirms are gone, keep the rest.
//!
//! Pruning is idempotent, so a redelivered event is safe to broadcast again.

use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;

use crate::domain::{BusEvent, ConnectionId, Envelope, decode_detail};
use crate::error::{GatewayError, SendError};
use crate::registry::ConnectionRegistry;
use crate::transport::Transport;

/// How a single connection's delivery attempt was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The transport accepted the payload.
    Delivered,
    /// The recipient was gone and its registry entry was deleted.
    Pruned,
    /// Delivery failed for another reason; the entry was kept.
    Retained,
}

/// Tally of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    /// Connections in the registry snapshot.
    pub attempted: usize,
    /// Successful deliveries.
    pub delivered: usize,
    /// Stale connections removed from the registry.
    pub pruned: usize,
    /// Failed deliveries whose connection was kept.
    pub failed: usize,
}

impl BroadcastReport {
    fn record(&mut self, outcome: DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Delivered => self.delivered += 1,
            DeliveryOutcome::Pruned => self.pruned += 1,
            DeliveryOutcome::Retained => self.failed += 1,
        }
    }
}

/// Stateless fan-out engine over a registry and a transport.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    registry: Arc<dyn ConnectionRegistry>,
    transport: Arc<dyn Transport>,
}

impl Broadcaster {
    /// Creates a broadcaster.
    #[must_use]
    pub fn new(registry: Arc<dyn ConnectionRegistry>, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Broadcasts `event` to every registered connection.
    ///
    /// Succeeds once every delivery attempt has been classified, whatever
    /// the individual outcomes.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::StoreUnavailable`] if the registry scan fails,
    /// in which case nothing is sent, and [`GatewayError::Internal`] if the
    /// envelope cannot be serialized.
    pub async fn broadcast(&self, event: &BusEvent) -> Result<BroadcastReport, GatewayError> {
        let connections = self.registry.scan().await.inspect_err(|e| {
            tracing::error!(event_id = %event.id, error = %e, "registry scan failed, broadcast aborted");
        })?;

        let envelope = Envelope::now(decode_detail(&event.detail));
        let payload =
            serde_json::to_string(&envelope).map_err(|e| GatewayError::Internal(e.to_string()))?;

        let attempts = connections.iter().map(|id| self.deliver(id, &payload));
        let outcomes = join_all(attempts).await;

        let mut report = BroadcastReport {
            attempted: connections.len(),
            ..BroadcastReport::default()
        };
        for outcome in outcomes {
            report.record(outcome);
        }

        tracing::info!(
            event_id = %event.id,
            attempted = report.attempted,
            delivered = report.delivered,
            pruned = report.pruned,
            failed = report.failed,
            "broadcast completed"
        );
        Ok(report)
    }

    /// Pushes `payload` to one connection and classifies the result.
    async fn deliver(&self, id: &ConnectionId, payload: &str) -> DeliveryOutcome {
        match self.transport.send(id, payload).await {
            Ok(()) => DeliveryOutcome::Delivered,
            Err(SendError::RecipientGone) => match self.registry.delete(id).await {
                Ok(()) => {
                    tracing::info!(connection_id = %id, "stale connection pruned");
                    DeliveryOutcome::Pruned
                }
                Err(e) => {
                    tracing::error!(connection_id = %id, error = %e, "failed to prune stale connection");
                    DeliveryOutcome::Retained
                }
            },
            Err(e @ SendError::DeliveryFailed(_)) => {
                tracing::warn!(connection_id = %id, error = %e, "failed to post to connection");
                DeliveryOutcome::Retained
            }
        }
    }
}
