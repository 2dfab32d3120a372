//! Wire payload pushed to every connected client.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Broadcast envelope: one per inbound event, sent to every connection.
///
/// `timestamp` is the broadcast time, not the time the event was produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Broadcast time (RFC 3339).
    pub timestamp: DateTime<Utc>,
    /// Decoded event payload.
    pub event_detail: Value,
}

impl Envelope {
    /// Wraps a decoded payload, stamped with the current time.
    #[must_use]
    pub fn now(event_detail: Value) -> Self {
        Self {
            timestamp: Utc::now(),
            event_detail,
        }
    }
}

/// Decodes a bus record's `detail` into the payload clients receive.
///
/// A string detail is parsed as JSON; if parsing fails the raw string is
/// used verbatim. Any other value passes through unchanged, and a missing
/// (`null`) detail becomes an empty object.
#[must_use]
pub fn decode_detail(detail: &Value) -> Value {
    match detail {
        Value::String(raw) => match serde_json::from_str(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(error = %e, "event detail is not JSON, forwarding raw string");
                Value::String(raw.clone())
            }
        },
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other.clone(),
    }
}
