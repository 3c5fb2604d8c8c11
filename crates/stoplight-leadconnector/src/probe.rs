//! Connectivity test that runs without a driver instance.

use std::sync::Arc;

use reqwest::StatusCode;
use stoplight_core::{ConnectionError, FetchError};
use tokio_util::sync::CancellationToken;

use crate::client::LeadConnectorClient;
use crate::config::StoplightConfig;

const SERVICE: &str = "LeadConnector";

/// Validate `raw` and confirm the configured calendar can be read.
///
/// Succeeds only on status 200 with a non-empty JSON object body.
/// `cancel` aborts the request in flight.
pub async fn test_connection(
    raw: &serde_json::Value,
    cancel: CancellationToken,
) -> Result<(), ConnectionError> {
    let config = Arc::new(StoplightConfig::from_value(raw)?);
    probe(config, cancel).await
}

pub async fn probe(
    config: Arc<StoplightConfig>,
    cancel: CancellationToken,
) -> Result<(), ConnectionError> {
    let client = LeadConnectorClient::new(config, cancel).map_err(transport)?;
    let (status, body) = client.get_calendar().await.map_err(transport)?;

    if status != StatusCode::OK {
        return Err(ConnectionError::Status {
            service: SERVICE.to_string(),
            status: status.as_u16(),
        });
    }

    check_calendar_body(&body)?;
    tracing::info!("{} connection test passed", SERVICE);
    Ok(())
}

fn check_calendar_body(body: &[u8]) -> Result<(), ConnectionError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| ConnectionError::Malformed {
            service: SERVICE.to_string(),
            message: e.to_string(),
        })?;

    match value {
        serde_json::Value::Null => Err(empty()),
        serde_json::Value::Object(map) if map.is_empty() => Err(empty()),
        serde_json::Value::Object(_) => Ok(()),
        other => Err(ConnectionError::Malformed {
            service: SERVICE.to_string(),
            message: format!("expected a JSON object, got {}", kind_of(&other)),
        }),
    }
}

fn empty() -> ConnectionError {
    ConnectionError::EmptyResponse {
        service: SERVICE.to_string(),
    }
}

fn transport(err: FetchError) -> ConnectionError {
    match err {
        FetchError::Cancelled => ConnectionError::Cancelled {
            service: SERVICE.to_string(),
        },
        err => ConnectionError::Transport {
            service: SERVICE.to_string(),
            message: err.to_string(),
        },
    }
}

fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
