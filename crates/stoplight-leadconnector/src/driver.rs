//! Stoplight driver: pulls calendars, contacts and opportunities from
//! LeadConnector and hands them to the loader together.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use stoplight_core::{
    Collection, Driver, DriverError, FetchError, ObjectBatch, ObjectsLoader, Record, TimeInterval,
};
use tokio_util::sync::CancellationToken;

use crate::client::{LeadConnectorClient, ResourceKind};
use crate::config::{FetchMode, StoplightConfig};

/// Advisory refresh window reported to schedulers.
pub const REFRESH_WINDOW: Duration = Duration::from_secs(31 * 24 * 60 * 60);

pub struct StoplightDriver {
    client: LeadConnectorClient,
    config: Arc<StoplightConfig>,
    collection: Collection,
}

impl StoplightDriver {
    pub fn new(
        config: StoplightConfig,
        collection: Collection,
        cancel: CancellationToken,
    ) -> Result<Self, DriverError> {
        let config = Arc::new(config);
        let client = LeadConnectorClient::new(config.clone(), cancel)?;

        Ok(Self {
            client,
            config,
            collection,
        })
    }

    /// Build from an untyped configuration payload.
    pub fn from_value(
        raw: &serde_json::Value,
        collection: Collection,
        cancel: CancellationToken,
    ) -> Result<Self, DriverError> {
        let config = StoplightConfig::from_value(raw)?;
        Self::new(config, collection, cancel)
    }

    pub fn config(&self) -> &StoplightConfig {
        &self.config
    }

    async fn fetch_sequential(&self) -> Result<[Vec<Record>; 3], FetchError> {
        tracing::debug!("Fetching calendars");
        let calendars = self.client.fetch(ResourceKind::Calendars).await?;

        tracing::debug!("Fetching contacts");
        let contacts = self.client.fetch(ResourceKind::Contacts).await?;

        tracing::debug!("Fetching opportunities");
        let opportunities = self.client.fetch(ResourceKind::Opportunities).await?;

        Ok([calendars, contacts, opportunities])
    }

    /// `try_join!` drops the remaining requests as soon as one fails.
    async fn fetch_concurrent(&self) -> Result<[Vec<Record>; 3], FetchError> {
        tracing::debug!("Fetching all resources concurrently");
        let (calendars, contacts, opportunities) = tokio::try_join!(
            self.client.fetch(ResourceKind::Calendars),
            self.client.fetch(ResourceKind::Contacts),
            self.client.fetch(ResourceKind::Opportunities),
        )?;

        Ok([calendars, contacts, opportunities])
    }
}

#[async_trait]
impl Driver for StoplightDriver {
    fn table_name(&self) -> String {
        self.collection.table_name().to_string()
    }

    fn meta_key(&self) -> String {
        format!("{}_{}", self.collection.name, self.table_name())
    }

    fn refresh_window(&self) -> Duration {
        REFRESH_WINDOW
    }

    fn replace_tables(&self) -> bool {
        false
    }

    // The interval is passed through to the loader only; requests are not filtered by it.
    async fn get_objects_for(
        &self,
        interval: &TimeInterval,
        loader: &dyn ObjectsLoader,
    ) -> Result<(), DriverError> {
        let fetched = match self.config.fetch_mode {
            FetchMode::Sequential => self.fetch_sequential().await,
            FetchMode::Concurrent => self.fetch_concurrent().await,
        };

        let fetched = fetched.inspect_err(|e| {
            tracing::warn!("Fetch for {} failed, nothing loaded: {}", self.meta_key(), e);
        })?;

        let batches: Vec<ObjectBatch> = ResourceKind::ALL
            .into_iter()
            .zip(fetched)
            .map(|(kind, records)| ObjectBatch::new(kind.name(), records))
            .collect();

        tracing::info!(
            "Fetched {} calendars, {} contacts, {} opportunities for {}",
            batches[0].len(),
            batches[1].len(),
            batches[2].len(),
            self.meta_key()
        );

        tracing::debug!("Loading {} batches for {}", batches.len(), interval);
        loader.load(interval, batches).await.inspect_err(|e| {
            tracing::warn!("Load for {} failed: {}", self.meta_key(), e);
        })?;

        Ok(())
    }
}
