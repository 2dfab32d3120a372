//! # worker-monitor
//!
//! WebSocket gateway that pushes background worker status events to every
//! connected client, without polling.
//!
//! Workers wrap their unit of work with a [`monitor::Monitor`], which
//! publishes `start` and `finished` status events onto the event bus. The
//! [`service::Dispatcher`] routes each matching bus record to the
//! [`service::Broadcaster`], which scans the connection registry, pushes one
//! envelope to every connection concurrently, and prunes connections the
//! transport reports as gone.
//!
//! ## Architecture
//!
//! ```text
//! Workers (monitor::Monitor)
//!     │  POST /api/v1/events or in-process
//!     ├── EventBus (domain/)
//!     │
//!     ├── Dispatcher ── Broadcaster (service/)
//!     │                     │
//!     │        ┌────────────┴────────────┐
//!     │   ConnectionRegistry        Transport
//!     │   (memory | PostgreSQL)     (ConnectionHub | ManagementClient)
//!     │        ▲                         │
//!     ├── LifecycleService ◄── WS Handler (ws/) ◄── Clients
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod monitor;
pub mod registry;
pub mod service;
pub mod transport;
pub mod ws;
