//! Wire format of a bus ingest batch (`POST /api/v1/events`).
//!
//! Shared by the ingest handler and the HTTP event publisher.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::BusEvent;

/// One record submitted by a producer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PutEventsEntry {
    /// Producer tag, matched against the broadcast rule.
    pub source: String,
    /// Kind of record, e.g. `"status-update"`.
    pub detail_type: String,
    /// JSON object or JSON-encoded string.
    #[schema(value_type = Object)]
    #[serde(default)]
    pub detail: serde_json::Value,
    /// Bus the record is addressed to.
    pub event_bus_name: String,
}

impl From<BusEvent> for PutEventsEntry {
    fn from(event: BusEvent) -> Self {
        Self {
            source: event.source,
            detail_type: event.detail_type,
            detail: event.detail,
            event_bus_name: event.event_bus_name,
        }
    }
}

impl From<PutEventsEntry> for BusEvent {
    fn from(entry: PutEventsEntry) -> Self {
        Self::new(
            entry.source,
            entry.detail_type,
            entry.detail,
            entry.event_bus_name,
        )
    }
}

/// Request body of `POST /api/v1/events`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PutEventsRequest {
    /// Records to publish, processed independently.
    pub entries: Vec<PutEventsEntry>,
}

/// Per-entry result, in request order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PutEventsResultEntry {
    /// Bus-assigned id of an accepted record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<uuid::Uuid>,
    /// Machine-readable reason of a rejected record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Human-readable reason of a rejected record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Response body of `POST /api/v1/events`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PutEventsResponse {
    /// Number of rejected entries.
    pub failed_entry_count: usize,
    /// One result per submitted entry.
    pub entries: Vec<PutEventsResultEntry>,
}
