//! Status events emitted around a monitored unit of work.
//!
//! A [`StatusEvent`] is produced by a worker's monitor and carried
//! to the broadcaster inside a [`super::BusEvent`]. Field names on the wire
//! keep the `snake_case` form clients already consume.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::InvocationContext;

/// Lifecycle state reported by a status event.
///
/// Serialized as a lowercase string. Unknown values are kept verbatim in
/// [`Status::Other`] so new producer states pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    /// The unit of work is about to run.
    Start,
    /// The unit of work returned normally.
    Finished,
    /// Any other producer-defined state.
    Other(String),
}

impl Status {
    /// Returns the wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Start => "start",
            Self::Finished => "finished",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        match s.as_str() {
            "start" => Self::Start,
            "finished" => Self::Finished,
            _ => Self::Other(s),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        match status {
            Status::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One state transition of a monitored invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusEvent {
    /// Long-lived worker process that handled the invocation.
    #[serde(rename = "lambda_instance_id")]
    pub instance_id: String,
    /// Unique id of the invocation.
    pub request_id: String,
    /// Reported state.
    #[schema(value_type = String, example = "start")]
    pub status: Status,
    /// Human-readable description.
    pub message: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
}

impl StatusEvent {
    /// Builds an event for the given invocation, stamped with the current time.
    #[must_use]
    pub fn new(ctx: &InvocationContext, status: Status, message: impl Into<String>) -> Self {
        Self {
            instance_id: ctx.instance_id.to_string(),
            request_id: ctx.request_id.clone(),
            status,
            message: message.into(),
            timestamp: Utc::now().timestamp(),
        }
    }
}
