//! HTTP client for an external gateway's connection management API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};

use super::Transport;
use crate::domain::ConnectionId;
use crate::error::{GatewayError, SendError};

/// [`Transport`] that posts to `{endpoint}/@connections/{id}`.
///
/// `410 Gone` is the only response treated as a confirmed dead session.
/// Timeouts, connect errors and every other status are
/// [`SendError::DeliveryFailed`], so a live client is never pruned on an
/// ambiguous failure.
///
/// The connection id is sent as a single percent-encoded path segment, so
/// ids containing `/`, `?` or `#` address the right resource.
#[derive(Debug, Clone)]
pub struct ManagementClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl ManagementClient {
    /// Creates a client for `endpoint` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if `endpoint` is not an
    /// absolute base URL, and [`GatewayError::Internal`] if the HTTP client
    /// cannot be built.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| GatewayError::InvalidRequest(format!("transport endpoint: {e}")))?;
        if endpoint.cannot_be_a_base() {
            return Err(GatewayError::InvalidRequest(format!(
                "transport endpoint is not a base URL: {endpoint}"
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Internal(e.to_string()))?;
        Ok(Self { client, endpoint })
    }

    /// URL of the management resource for `id`.
    #[must_use]
    pub fn connection_url(&self, id: &ConnectionId) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("@connections")
                .push(id.as_str());
        }
        url
    }
}

/// Maps a management API response status to a send outcome.
pub(crate) fn classify_status(status: StatusCode) -> Result<(), SendError> {
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::GONE {
        Err(SendError::RecipientGone)
    } else {
        Err(SendError::DeliveryFailed(format!(
            "management endpoint returned {status}"
        )))
    }
}

#[async_trait]
impl Transport for ManagementClient {
    async fn send(&self, id: &ConnectionId, payload: &str) -> Result<(), SendError> {
        let response = self
            .client
            .post(self.connection_url(id))
            .body(payload.to_string())
            .send()
            .await
            .map_err(|e| SendError::DeliveryFailed(e.to_string()))?;
        classify_status(response.status())
    }
}
