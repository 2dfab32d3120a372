//! Records carried on the event bus and the rule that routes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Detail type attached to every status event a monitor publishes.
pub const STATUS_UPDATE: &str = "status-update";

/// One record on the event bus.
///
/// `id` and `time` are assigned when the record enters the bus; the other
/// fields come from the producer. `detail` is either a JSON object or a
/// JSON-encoded string, depending on the producer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BusEvent {
    /// Bus-assigned record id.
    pub id: uuid::Uuid,
    /// Time the record entered the bus.
    pub time: DateTime<Utc>,
    /// Producer tag.
    pub source: String,
    /// Kind of record, e.g. [`STATUS_UPDATE`].
    pub detail_type: String,
    /// Producer payload.
    #[schema(value_type = Object)]
    pub detail: serde_json::Value,
    /// Name of the bus the record was addressed to.
    pub event_bus_name: String,
}

impl BusEvent {
    /// Stamps a new record with a fresh id and the current time.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        detail_type: impl Into<String>,
        detail: serde_json::Value,
        event_bus_name: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            time: Utc::now(),
            source: source.into(),
            detail_type: detail_type.into(),
            detail,
            event_bus_name: event_bus_name.into(),
        }
    }
}

/// Filter deciding which bus records reach the broadcaster.
///
/// A record matches when both its `source` and its `detail_type` equal the
/// rule's values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRule {
    source: String,
    detail_type: String,
}

impl EventRule {
    /// Creates a rule for the given source and detail type.
    #[must_use]
    pub fn new(source: impl Into<String>, detail_type: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            detail_type: detail_type.into(),
        }
    }

    /// Rule for status updates from `source`.
    #[must_use]
    pub fn status_updates(source: impl Into<String>) -> Self {
        Self::new(source, STATUS_UPDATE)
    }

    /// Returns `true` if the record should be routed to the broadcaster.
    #[must_use]
    pub fn matches(&self, event: &BusEvent) -> bool {
        event.source == self.source && event.detail_type == self.detail_type
    }
}
