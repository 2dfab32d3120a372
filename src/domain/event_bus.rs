//! In-process event bus.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel of
//! [`BusEvent`]s. Producers publish through it (directly, or via the HTTP
//! ingest endpoint) and the [`crate::service::Dispatcher`] subscribes to
//! route matching records to the broadcaster.

use std::fmt;

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::BusEvent;
use crate::error::GatewayError;

/// Hands bus records to an event bus.
#[async_trait]
pub trait EventPublisher: Send + Sync + fmt::Debug {
    /// Publishes one record.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EventPublishFailed`] if the bus does not
    /// accept the record.
    async fn publish(&self, event: BusEvent) -> Result<(), GatewayError>;
}

/// Broadcast bus for [`BusEvent`]s.
///
/// Backed by a `tokio::broadcast` channel with a configurable capacity
/// (default 10 000). When the ring buffer is full, the oldest events are
/// dropped for lagging receivers.
#[derive(Debug, Clone)]
pub struct EventBus {
    name: String,
    sender: broadcast::Sender<BusEvent>,
}

impl EventBus {
    /// Creates a new named `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            name: name.into(),
            sender,
        }
    }

    /// Name producers must address records to.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event.
    /// If there are no active receivers, the event is silently dropped.
    pub fn publish(&self, event: BusEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a new receiver that will receive all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl EventPublisher for EventBus {
    async fn publish(&self, event: BusEvent) -> Result<(), GatewayError> {
        if event.event_bus_name != self.name {
            return Err(GatewayError::EventPublishFailed(format!(
                "unknown event bus: {}",
                event.event_bus_name
            )));
        }
        let receivers = Self::publish(self, event);
        tracing::trace!(receivers, "bus event published");
        Ok(())
    }
}
