//! Transport seam: pushing bytes to a client session.
//!
//! The broadcaster only needs one primitive from the transport, a send to
//! a connection id that tells "recipient gone" apart from other failures.
//!
//! - [`ConnectionHub`] serves sessions accepted by this process at `/ws`.
//! - [`ManagementClient`] posts to an external gateway's
//!   `/@connections/{id}` management endpoint.

pub mod hub;
pub mod management;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::ConnectionId;
use crate::error::SendError;

pub use hub::ConnectionHub;
pub use management::ManagementClient;

/// Message-send primitive of a bidirectional session transport.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Pushes `payload` to the session identified by `id`.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::RecipientGone`] only when the transport confirms
    /// the session no longer exists, and [`SendError::DeliveryFailed`] for
    /// every other failure.
    async fn send(&self, id: &ConnectionId, payload: &str) -> Result<(), SendError>;
}
