//! Shared contracts for Stoplight source connectors.
//!
//! Defines the driver and loader interfaces, the explicit driver registry,
//! configuration loading and the error hierarchy used by every connector.

pub mod app;
pub mod config;
pub mod driver;
pub mod error;
pub mod loader;
pub mod registry;

pub use app::App;
pub use config::{Config, SourceConfig, ValidationResult};
pub use driver::{Collection, Driver, ObjectBatch, ObjectsLoader, Record, TimeInterval};
pub use error::{ConfigError, ConnectionError, DriverError, FetchError, LoadError, ReqwestErrorExt};
pub use loader::NdjsonLoader;
pub use registry::{DriverProvider, DriverRegistry};

/// Initialize logging
pub fn init_logging() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))?;

    tracing::debug!("Stoplight logging initialized");
    Ok(())
}
