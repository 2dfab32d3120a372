//! HTTP publisher for a remote gateway's bus ingest endpoint.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::put_events::{PutEventsEntry, PutEventsRequest, PutEventsResponse};
use crate::domain::{BusEvent, EventPublisher};
use crate::error::GatewayError;

/// [`EventPublisher`] that posts records to `{endpoint}/api/v1/events`.
///
/// Transport errors, non-2xx responses and rejected entries all surface as
/// [`GatewayError::EventPublishFailed`].
#[derive(Debug, Clone)]
pub struct HttpEventPublisher {
    client: reqwest::Client,
    url: String,
}

impl HttpEventPublisher {
    /// Creates a publisher for the gateway at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns a [`reqwest::Error`] if the HTTP client cannot be built.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: format!("{}/api/v1/events", endpoint.trim_end_matches('/')),
        })
    }

    /// Ingest URL records are posted to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EventPublisher for HttpEventPublisher {
    async fn publish(&self, event: BusEvent) -> Result<(), GatewayError> {
        let request = PutEventsRequest {
            entries: vec![PutEventsEntry::from(event)],
        };
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::EventPublishFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| GatewayError::EventPublishFailed(e.to_string()))?;

        let body: PutEventsResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::EventPublishFailed(e.to_string()))?;
        if body.failed_entry_count > 0 {
            let reason = body
                .entries
                .into_iter()
                .find_map(|entry| entry.error_message)
                .unwrap_or_else(|| "entry rejected".to_string());
            return Err(GatewayError::EventPublishFailed(reason));
        }
        Ok(())
    }
}
