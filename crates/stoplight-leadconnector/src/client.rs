//! LeadConnector API client.

use std::sync::Arc;

use reqwest::{Client, Response, StatusCode};
use stoplight_core::{FetchError, Record, ReqwestErrorExt};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::config::StoplightConfig;

/// Resource collections the connector pulls, in fetch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Calendars,
    Contacts,
    Opportunities,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Calendars,
        ResourceKind::Contacts,
        ResourceKind::Opportunities,
    ];

    /// Endpoint path relative to the API base URL.
    pub fn path(self) -> &'static str {
        match self {
            ResourceKind::Calendars => "/calendars/",
            ResourceKind::Contacts => "/contacts/",
            ResourceKind::Opportunities => "/opportunities/",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Calendars => "calendars",
            ResourceKind::Contacts => "contacts",
            ResourceKind::Opportunities => "opportunities",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Authenticated transport shared by the prober and the resource fetchers.
///
/// Cloning is cheap; clones share the connection pool and cancel token.
#[derive(Clone)]
pub struct LeadConnectorClient {
    client: Client,
    config: Arc<StoplightConfig>,
    cancel: CancellationToken,
}

impl LeadConnectorClient {
    pub fn new(config: Arc<StoplightConfig>, cancel: CancellationToken) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            cancel,
        })
    }

    pub fn config(&self) -> &StoplightConfig {
        &self.config
    }

    /// Issue one authenticated GET. Cancellation wins over a pending response.
    async fn get(&self, path: &str) -> Result<Response, FetchError> {
        let url = format!("{}{}", self.config.base_url, path);

        let request = self
            .client
            .get(&url)
            .header("Authorization", &self.config.access_token)
            .header("Version", &self.config.api_version)
            .send();

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::debug!("Request to {} cancelled", path);
                Err(FetchError::Cancelled)
            }
            result = request => result.map_err(ReqwestErrorExt::into_fetch_error),
        }
    }

    /// Read the full body, still honouring cancellation.
    async fn body(&self, response: Response) -> Result<Vec<u8>, FetchError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(FetchError::Cancelled),
            result = response.bytes() => result
                .map(|b| b.to_vec())
                .map_err(ReqwestErrorExt::into_fetch_error),
        }
    }

    /// Fetch one resource collection as returned by the API.
    ///
    /// Only the first page is read; no query parameters are sent.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch(&self, kind: ResourceKind) -> Result<Vec<Record>, FetchError> {
        let response = self.get(kind.path()).await?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!("{} request returned status {}", kind, status);
            return Err(FetchError::UpstreamStatus {
                resource: kind.name().to_string(),
                status: status.as_u16(),
            });
        }

        let body = self.body(response).await?;
        let records: Vec<Record> =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
                resource: kind.name().to_string(),
                message: e.to_string(),
            })?;

        tracing::debug!("Fetched {} {}", records.len(), kind);
        Ok(records)
    }

    /// Fetch the calendar named by the configured calendar id.
    ///
    /// Returns the raw status and body so the prober can classify them.
    /// The body is only read on status 200; any other status comes back
    /// with an empty body.
    #[instrument(skip(self), fields(calendar_id = %self.config.calendar_id), level = "info")]
    pub async fn get_calendar(&self) -> Result<(StatusCode, Vec<u8>), FetchError> {
        let path = format!(
            "/calendars/{}",
            urlencoding::encode(&self.config.calendar_id)
        );
        let response = self.get(&path).await?;
        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!("calendar request returned status {}", status);
            return Ok((status, Vec::new()));
        }

        let body = self.body(response).await?;
        Ok((status, body))
    }
}
