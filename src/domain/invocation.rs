//! Identity of a monitored invocation.
//!
//! The [`InstanceId`] identifies the long-lived worker process. Create it
//! once at startup and hand it to every [`InvocationContext`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one long-lived worker process.
///
/// Generated once when the process starts and read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(uuid::Uuid);

impl InstanceId {
    /// Creates a new random instance id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-invocation context handed to a monitored handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    /// Unique id of this invocation.
    pub request_id: String,
    /// Process that runs the invocation.
    pub instance_id: InstanceId,
}

impl InvocationContext {
    /// Creates a context for the given request on `instance_id`.
    #[must_use]
    pub fn new(request_id: impl Into<String>, instance_id: InstanceId) -> Self {
        Self {
            request_id: request_id.into(),
            instance_id,
        }
    }

    /// Creates a context with a fresh UUID v4 request id.
    #[must_use]
    pub fn fresh(instance_id: InstanceId) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), instance_id)
    }
}
