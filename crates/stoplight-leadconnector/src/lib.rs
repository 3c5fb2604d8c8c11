//! LeadConnector (HighLevel) source connector for Stoplight.
//!
//! Pulls calendars, contacts and opportunities and hands them to an
//! objects loader. Each sync is a full, single-page fetch.

pub mod client;
pub mod config;
pub mod driver;
pub mod probe;

use std::sync::Arc;

use async_trait::async_trait;
use stoplight_core::{
    Collection, ConnectionError, Driver, DriverError, DriverProvider, DriverRegistry, SourceConfig,
};
use tokio_util::sync::CancellationToken;

pub use client::{LeadConnectorClient, ResourceKind};
pub use config::{FetchMode, StoplightConfig};
pub use driver::{StoplightDriver, REFRESH_WINDOW};
pub use probe::test_connection;

/// Source type this connector registers under.
pub const SOURCE_TYPE: &str = "stoplight";

#[derive(Debug, Default, Clone, Copy)]
pub struct StoplightProvider;

#[async_trait]
impl DriverProvider for StoplightProvider {
    fn source_type(&self) -> &str {
        SOURCE_TYPE
    }

    fn create(
        &self,
        source: &SourceConfig,
        collection: Collection,
        cancel: CancellationToken,
    ) -> Result<Box<dyn Driver>, DriverError> {
        let driver = StoplightDriver::from_value(&source.config, collection, cancel)?;
        Ok(Box::new(driver))
    }

    async fn test_connection(
        &self,
        source: &SourceConfig,
        cancel: CancellationToken,
    ) -> Result<(), ConnectionError> {
        probe::test_connection(&source.config, cancel).await
    }
}

/// Add this connector to `registry`.
pub fn register(registry: &mut DriverRegistry) {
    registry.register(Arc::new(StoplightProvider));
}
