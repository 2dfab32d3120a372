//! Routes bus records to the broadcaster.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::Broadcaster;
use crate::domain::{BusEvent, EventBus, EventRule};

/// Subscribes to the [`EventBus`] and starts one broadcast per routed record.
///
/// Every matching record is handled by its own spawned task, so a slow
/// broadcast never delays the next one and no state is shared between
/// invocations.
///
/// The in-process bus never redelivers: a record whose broadcast aborts
/// (the registry scan failed) is dropped after a warning. Delivery from
/// this dispatcher is at most once.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    rule: EventRule,
    broadcaster: Broadcaster,
}

impl Dispatcher {
    /// Creates a dispatcher routing records that match `rule`.
    #[must_use]
    pub fn new(rule: EventRule, broadcaster: Broadcaster) -> Self {
        Self { rule, broadcaster }
    }

    /// Subscribes to `bus` and runs the dispatch loop in the background.
    ///
    /// The subscription is taken before this returns, so records published
    /// afterwards are never missed.
    #[must_use]
    pub fn spawn(self, bus: &EventBus) -> JoinHandle<()> {
        let rx = bus.subscribe();
        tokio::spawn(self.run(rx))
    }

    /// Consumes records until the bus closes.
    pub async fn run(self, mut rx: broadcast::Receiver<BusEvent>) {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    self.dispatch(event);
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "dispatcher lagged behind event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("event bus closed, dispatcher stopped");
    }

    /// Spawns a broadcast for `event` if it matches the rule.
    ///
    /// Returns the spawned task, or `None` for an unrouted record.
    pub fn dispatch(&self, event: BusEvent) -> Option<JoinHandle<()>> {
        if !self.rule.matches(&event) {
            tracing::debug!(
                event_id = %event.id,
                source = %event.source,
                detail_type = %event.detail_type,
                "bus event not routed"
            );
            return None;
        }

        let broadcaster = self.broadcaster.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = broadcaster.broadcast(&event).await {
                tracing::warn!(
                    event_id = %event.id,
                    error = %e,
                    "bus event dropped without redelivery"
                );
            }
        }))
    }
}
