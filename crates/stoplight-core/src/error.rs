//! Centralized error types for Stoplight connectors.
//!
//! This module provides a typed error hierarchy that:
//! - Separates configuration, connectivity, fetch and load failures
//! - Provides short operator-facing messages via `user_message()`
//! - Preserves upstream detail (status codes, decode messages) for logging

use thiserror::Error;

/// Top-level error returned by drivers and the registry.
///
/// Every failure in a fetch-and-load cycle is convertible to this type.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Connection test failed: {0}")]
    Connection(#[from] ConnectionError),

    #[error("No driver registered for source type: {0}")]
    UnknownSourceType(String),

    #[error("Unknown source: {0}")]
    UnknownSource(String),
}

impl DriverError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DriverError::Config(e) => e.user_message(),
            DriverError::Fetch(e) => e.user_message(),
            DriverError::Load(e) => e.user_message(),
            DriverError::Connection(e) => e.user_message(),
            DriverError::UnknownSourceType(_) => "This source type is not supported.",
            DriverError::UnknownSource(_) => "No source with that id is configured.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration file not found.",
            ConfigError::ParseError(_) => "Configuration is malformed. Check your settings.",
            ConfigError::MissingSetting(_) => "A required setting is missing. Check your settings.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
        }
    }
}

/// Failures of a single authenticated resource request.
///
/// `Transport`, `Timeout` and `Cancelled` all mean the request never produced
/// a usable response. None of these are retried.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Request cancelled")]
    Cancelled,

    #[error("Upstream returned status code {status} for {resource}")]
    UpstreamStatus { resource: String, status: u16 },

    #[error("Failed to decode {resource} response: {message}")]
    Decode { resource: String, message: String },
}

impl FetchError {
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "Unable to reach the API. Check your connection.",
            FetchError::Timeout => "The request timed out.",
            FetchError::Cancelled => "The sync was cancelled.",
            FetchError::UpstreamStatus { status, .. } if *status == 401 || *status == 403 => {
                "The API rejected the credentials. Check the access token."
            }
            FetchError::UpstreamStatus { status, .. } if *status >= 500 => {
                "The API is experiencing issues. Please try again later."
            }
            FetchError::UpstreamStatus { .. } => "The API request failed.",
            FetchError::Decode { .. } => "The API returned an unexpected response.",
        }
    }

    /// Numeric HTTP status for upstream status failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::UpstreamStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the request failed before any response arrived.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FetchError::Transport(_) | FetchError::Timeout | FetchError::Cancelled
        )
    }
}

/// Errors reported by a connectivity probe.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{service} request failed: {message}")]
    Transport { service: String, message: String },

    #[error("{service} returned status code {status}")]
    Status { service: String, status: u16 },

    #[error("{service} returned empty response")]
    EmptyResponse { service: String },

    #[error("{service} returned malformed response: {message}")]
    Malformed { service: String, message: String },

    #[error("{service} connection test cancelled")]
    Cancelled { service: String },
}

impl ConnectionError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConnectionError::Config(e) => e.user_message(),
            ConnectionError::Transport { .. } => "Unable to reach the API. Check your connection.",
            ConnectionError::Status { status, .. } if *status == 401 || *status == 403 => {
                "The API rejected the credentials. Check the access token."
            }
            ConnectionError::Status { .. } => "The API refused the connection test.",
            ConnectionError::EmptyResponse { .. } => "The API returned no data for the calendar.",
            ConnectionError::Malformed { .. } => "The API returned an unexpected response.",
            ConnectionError::Cancelled { .. } => "The connection test was cancelled.",
        }
    }
}

/// Errors raised by an objects loader.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Load rejected: {0}")]
    Rejected(String),
}

impl LoadError {
    pub fn user_message(&self) -> &'static str {
        match self {
            LoadError::Io(_) => "Writing the fetched data failed.",
            LoadError::Serialize(_) => "The fetched data could not be serialized.",
            LoadError::Rejected(_) => "The destination rejected the fetched data.",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_fetch_error(self) -> FetchError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_fetch_error(self) -> FetchError {
        if self.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Transport(self.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_error_conversion() {
        let fetch_err = FetchError::UpstreamStatus {
            resource: "contacts".into(),
            status: 500,
        };
        let driver_err: DriverError = fetch_err.into();
        assert!(matches!(
            driver_err,
            DriverError::Fetch(FetchError::UpstreamStatus { status: 500, .. })
        ));
    }

    #[test]
    fn test_user_message_propagation() {
        let err = DriverError::Fetch(FetchError::UpstreamStatus {
            resource: "calendars".into(),
            status: 401,
        });
        assert_eq!(
            err.user_message(),
            "The API rejected the credentials. Check the access token."
        );
    }

    #[test]
    fn test_status_surfaces_in_message() {
        let err = FetchError::UpstreamStatus {
            resource: "contacts".into(),
            status: 503,
        };
        assert_eq!(err.status(), Some(503));
        assert!(err.to_string().contains("503"));
        assert!(!err.is_transport());
    }

    #[test]
    fn test_transport_classification() {
        assert!(FetchError::Cancelled.is_transport());
        assert!(FetchError::Timeout.is_transport());
        assert!(FetchError::Transport("dns".into()).is_transport());
        assert_eq!(FetchError::Timeout.status(), None);
    }

    #[test]
    fn test_connection_error_messages() {
        let err = ConnectionError::Status {
            service: "LeadConnector".into(),
            status: 401,
        };
        assert_eq!(err.to_string(), "LeadConnector returned status code 401");

        let err = ConnectionError::EmptyResponse {
            service: "LeadConnector".into(),
        };
        assert_eq!(err.to_string(), "LeadConnector returned empty response");
    }

    #[test]
    fn test_config_error_is_transparent_in_probe() {
        let err: ConnectionError = ConfigError::MissingSetting("access_token".into()).into();
        assert_eq!(err.to_string(), "Missing required setting: access_token");
    }
}
