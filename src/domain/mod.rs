//! Domain layer: connection identity, invocation identity, status events,
//! bus records and their wire format, and the in-process event bus.

pub mod bus_event;
pub mod connection_id;
pub mod envelope;
pub mod event_bus;
pub mod invocation;
pub mod put_events;
pub mod status_event;

pub use bus_event::{BusEvent, EventRule, STATUS_UPDATE};
pub use connection_id::ConnectionId;
pub use envelope::{Envelope, decode_detail};
pub use event_bus::{EventBus, EventPublisher};
pub use invocation::{InstanceId, InvocationContext};
pub use status_event::{Status, StatusEvent};
