//! Driver registry - maps source types to the providers that build them.
//!
//! Built once at startup and passed by reference; there is no global table.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::SourceConfig;
use crate::driver::{Collection, Driver};
use crate::error::{ConnectionError, DriverError};

/// Factory pair for one source type: driver construction plus a
/// connectivity test that needs no driver instance.
#[async_trait]
pub trait DriverProvider: Send + Sync {
    /// Identifier matched against `SourceConfig::source_type`.
    fn source_type(&self) -> &str;

    /// Build a driver. `cancel` aborts in-flight requests of that driver.
    fn create(
        &self,
        source: &SourceConfig,
        collection: Collection,
        cancel: CancellationToken,
    ) -> Result<Box<dyn Driver>, DriverError>;

    /// Validate credentials and reachability. `cancel` aborts the request.
    async fn test_connection(
        &self,
        source: &SourceConfig,
        cancel: CancellationToken,
    ) -> Result<(), ConnectionError>;
}

#[derive(Default, Clone)]
pub struct DriverRegistry {
    providers: HashMap<String, Arc<dyn DriverProvider>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its source type, replacing any earlier one.
    pub fn register(&mut self, provider: Arc<dyn DriverProvider>) {
        let source_type = provider.source_type().to_string();
        tracing::info!("Registering driver: {}", source_type);
        if self.providers.insert(source_type.clone(), provider).is_some() {
            tracing::warn!("Driver {} registered twice, keeping the latest", source_type);
        }
    }

    pub fn get(&self, source_type: &str) -> Result<Arc<dyn DriverProvider>, DriverError> {
        self.providers
            .get(source_type)
            .cloned()
            .ok_or_else(|| DriverError::UnknownSourceType(source_type.to_string()))
    }

    pub fn contains(&self, source_type: &str) -> bool {
        self.providers.contains_key(source_type)
    }

    /// Registered source types, sorted.
    pub fn source_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Build the driver for `source` using its registered provider.
    pub fn create_driver(
        &self,
        source: &SourceConfig,
        cancel: CancellationToken,
    ) -> Result<Box<dyn Driver>, DriverError> {
        let provider = self.get(&source.source_type)?;
        provider.create(source, source.collection.clone(), cancel)
    }

    /// Run the connectivity test registered for `source`'s type.
    pub async fn test_connection(
        &self,
        source: &SourceConfig,
        cancel: CancellationToken,
    ) -> Result<(), DriverError> {
        let provider = self.get(&source.source_type)?;
        provider.test_connection(source, cancel).await?;
        Ok(())
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("source_types", &self.source_types())
            .finish()
    }
}
