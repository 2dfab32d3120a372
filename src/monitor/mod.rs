//! Event producer adapter: wraps a unit of work with status events.
//!
//! [`Monitor::wrap`] turns a handler `f(event, ctx)` into a [`Monitored`]
//! handler that publishes a `start` status event before running `f` and a
//! `finished` event after it returns `Ok`. When `f` fails, its error is
//! returned unchanged and no `finished` event is published; consumers read
//! the missing `finished` as an unclean termination.
//!
//! The [`InstanceId`] identifies the long-lived worker process. Create it
//! once at startup and hand it to every [`InvocationContext`].

pub mod publisher;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::domain::{BusEvent, STATUS_UPDATE, Status, StatusEvent};
use crate::error::GatewayError;

pub use crate::domain::{EventPublisher, InstanceId, InvocationContext};
pub use publisher::HttpEventPublisher;

/// Message attached to `start` events.
pub const STARTED_MESSAGE: &str = "handler started";
/// Message attached to `finished` events.
pub const FINISHED_MESSAGE: &str = "handler finished";

/// Failure of a monitored invocation.
///
/// Keeps "the work failed" and "monitoring failed" apart.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError<E> {
    /// The wrapped handler returned an error; carried unchanged.
    #[error("work failed: {0}")]
    Work(E),

    /// A status event could not be published.
    #[error(transparent)]
    Publish(GatewayError),
}

impl<E> MonitorError<E> {
    /// Returns the handler's own error, if that is what failed.
    pub fn into_work(self) -> Option<E> {
        match self {
            Self::Work(e) => Some(e),
            Self::Publish(_) => None,
        }
    }
}

/// Publishes status events for invocations on one bus.
#[derive(Debug, Clone)]
pub struct Monitor {
    publisher: Arc<dyn EventPublisher>,
    source: String,
    event_bus_name: String,
}

impl Monitor {
    /// Creates a monitor that tags events with `source` and addresses them
    /// to `event_bus_name`.
    #[must_use]
    pub fn new(
        publisher: Arc<dyn EventPublisher>,
        source: impl Into<String>,
        event_bus_name: impl Into<String>,
    ) -> Self {
        Self {
            publisher,
            source: source.into(),
            event_bus_name: event_bus_name.into(),
        }
    }

    /// Publishes one status event for the invocation in `ctx`.
    ///
    /// The detail is the JSON-encoded event, carried as a string.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EventPublishFailed`] if encoding or
    /// publishing fails.
    pub async fn send_status(
        &self,
        ctx: &InvocationContext,
        status: Status,
        message: &str,
    ) -> Result<(), GatewayError> {
        let event = StatusEvent::new(ctx, status, message);
        let detail = serde_json::to_string(&event)
            .map_err(|e| GatewayError::EventPublishFailed(e.to_string()))?;
        let record = BusEvent::new(
            self.source.as_str(),
            STATUS_UPDATE,
            serde_json::Value::String(detail),
            self.event_bus_name.as_str(),
        );
        self.publisher.publish(record).await?;
        tracing::debug!(
            request_id = %ctx.request_id,
            instance_id = %ctx.instance_id,
            status = %event.status,
            "status event published"
        );
        Ok(())
    }

    /// Runs `work` between a `start` and a `finished` status event.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Publish`] if either event cannot be published
    /// and [`MonitorError::Work`] if `work` fails, in which case no
    /// `finished` event is sent.
    pub async fn run<T, E, Fut>(
        &self,
        ctx: &InvocationContext,
        work: Fut,
    ) -> Result<T, MonitorError<E>>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        self.send_status(ctx, Status::Start, STARTED_MESSAGE)
            .await
            .map_err(MonitorError::Publish)?;

        let output = work.await.map_err(MonitorError::Work)?;

        self.send_status(ctx, Status::Finished, FINISHED_MESSAGE)
            .await
            .map_err(MonitorError::Publish)?;
        Ok(output)
    }

    /// Wraps `handler` so every call is monitored.
    #[must_use]
    pub fn wrap<H>(self, handler: H) -> Monitored<H> {
        Monitored {
            monitor: self,
            handler,
        }
    }
}

/// A handler wrapped by [`Monitor::wrap`].
pub struct Monitored<H> {
    monitor: Monitor,
    handler: H,
}

impl<H> fmt::Debug for Monitored<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitored")
            .field("monitor", &self.monitor)
            .finish_non_exhaustive()
    }
}

impl<H> Monitored<H> {
    /// Invokes the wrapped handler with `event` under `ctx`.
    ///
    /// # Errors
    ///
    /// See [`Monitor::run`].
    pub async fn call<Ev, T, E, Fut>(
        &self,
        event: Ev,
        ctx: InvocationContext,
    ) -> Result<T, MonitorError<E>>
    where
        H: Fn(Ev, InvocationContext) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let work = (self.handler)(event, ctx.clone());
        self.monitor.run(&ctx, work).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingPublisher {
        events: Mutex<Vec<BusEvent>>,
        fail: bool,
    }

    impl RecordingPublisher {
        fn failing() -> Self {
            Self {
                events: Mutex::default(),
                fail: true,
            }
        }

        fn statuses(&self) -> Vec<StatusEvent> {
            let events = self.events.lock().map(|e| e.clone()).unwrap_or_default();
            events
                .iter()
                .filter_map(|e| e.detail.as_str())
                .filter_map(|s| serde_json::from_str(s).ok())
                .collect()
        }
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish(&self, event: BusEvent) -> Result<(), GatewayError> {
            if self.fail {
                return Err(GatewayError::EventPublishFailed("bus down".to_string()));
            }
            if let Ok(mut events) = self.events.lock() {
                events.push(event);
            }
            Ok(())
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    struct WorkError(&'static str);

    fn monitor(publisher: &Arc<RecordingPublisher>) -> Monitor {
        let publisher: Arc<dyn EventPublisher> = Arc::clone(publisher) as Arc<dyn EventPublisher>;
        Monitor::new(publisher, "monitor-worker", "monitor-events")
    }

    #[tokio::test]
    async fn success_publishes_start_then_finished() {
        let publisher = Arc::new(RecordingPublisher::default());
        let handler = monitor(&publisher)
            .wrap(|n: u32, _ctx: InvocationContext| async move { Ok::<_, WorkError>(n * 2) });
        let ctx = InvocationContext::new("r1", InstanceId::generate());

        let result = handler.call(21, ctx.clone()).await;
        assert!(matches!(result, Ok(42)));

        let statuses = publisher.statuses();
        assert_eq!(statuses.len(), 2);
        let [start, finished] = statuses.as_slice() else {
            panic!("expected two events");
        };
        assert_eq!(start.status, Status::Start);
        assert_eq!(finished.status, Status::Finished);
        assert_eq!(start.request_id, "r1");
        assert_eq!(start.instance_id, ctx.instance_id.to_string());
        assert_eq!(finished.message, FINISHED_MESSAGE);
    }

    #[tokio::test]
    async fn failure_publishes_only_start_and_propagates_error() {
        let publisher = Arc::new(RecordingPublisher::default());
        let handler = monitor(&publisher).wrap(|_: (), _ctx: InvocationContext| async move {
            Err::<(), _>(WorkError("boom"))
        });

        let result = handler
            .call((), InvocationContext::new("r2", InstanceId::generate()))
            .await;
        let Err(MonitorError::Work(err)) = result else {
            panic!("expected work failure");
        };
        assert_eq!(err, WorkError("boom"));

        let statuses = publisher.statuses();
        assert_eq!(statuses.len(), 1);
        assert!(statuses.iter().all(|s| s.status == Status::Start));
    }

    #[tokio::test]
    async fn publish_failure_is_distinct_and_skips_work() {
        let publisher = Arc::new(RecordingPublisher::failing());
        let ran = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&ran);
        let handler = monitor(&publisher).wrap(move |_: (), _ctx: InvocationContext| {
            let flag = Arc::clone(&flag);
            async move {
                if let Ok(mut ran) = flag.lock() {
                    *ran = true;
                }
                Ok::<_, WorkError>(())
            }
        });

        let result = handler
            .call((), InvocationContext::fresh(InstanceId::generate()))
            .await;
        assert!(matches!(
            result,
            Err(MonitorError::Publish(GatewayError::EventPublishFailed(_)))
        ));
        assert!(!ran.lock().map(|r| *r).unwrap_or(true));
    }

    #[tokio::test]
    async fn instance_id_is_stable_across_invocations() {
        let publisher = Arc::new(RecordingPublisher::default());
        let handler = monitor(&publisher)
            .wrap(|_: (), _ctx: InvocationContext| async move { Ok::<_, WorkError>(()) });
        let instance = InstanceId::generate();

        for _ in 0..2 {
            let _ = handler.call((), InvocationContext::fresh(instance)).await;
        }

        let statuses = publisher.statuses();
        assert_eq!(statuses.len(), 4);
        assert!(statuses.iter().all(|s| s.instance_id == instance.to_string()));
        let first = statuses.first().map(|s| s.request_id.clone());
        let last = statuses.last().map(|s| s.request_id.clone());
        assert_ne!(first, last);
    }

    #[tokio::test]
    async fn records_are_status_updates_with_string_detail() {
        let publisher = Arc::new(RecordingPublisher::default());
        let ctx = InvocationContext::new("r3", InstanceId::generate());
        let result = monitor(&publisher)
            .send_status(&ctx, Status::Start, STARTED_MESSAGE)
            .await;
        assert!(result.is_ok());

        let events = publisher.events.lock().map(|e| e.clone()).unwrap_or_default();
        let Some(record) = events.first() else {
            panic!("expected a record");
        };
        assert_eq!(record.detail_type, STATUS_UPDATE);
        assert_eq!(record.source, "monitor-worker");
        assert_eq!(record.event_bus_name, "monitor-events");
        assert!(record.detail.is_string());
    }
}
