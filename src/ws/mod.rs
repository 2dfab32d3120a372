//! WebSocket transport: upgrade handling and per-session loops.
//!
//! The endpoint at `/ws` accepts clients, assigns each a
//! [`crate::domain::ConnectionId`], and pushes broadcast envelopes to it.

pub mod connection;
pub mod handler;
