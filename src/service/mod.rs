//! Service layer: broadcast engine, bus dispatcher, lifecycle handlers.

pub mod broadcaster;
pub mod dispatcher;
pub mod lifecycle;

pub use broadcaster::{BroadcastReport, Broadcaster, DeliveryOutcome};
pub use dispatcher::Dispatcher;
pub use lifecycle::{LifecycleResponse, LifecycleService};
