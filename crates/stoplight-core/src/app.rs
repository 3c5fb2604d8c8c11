use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::driver::{ObjectsLoader, TimeInterval};
use crate::{Config, ConfigError, DriverError, DriverRegistry, SourceConfig};

/// Resolves configured sources against the driver registry
pub struct App {
    config: Config,
    registry: DriverRegistry,
    cancel: CancellationToken,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config, registry: DriverRegistry) -> Self {
        tracing::info!(
            "Application ready with {} sources and drivers {:?}",
            config.sources.len(),
            registry.source_types()
        );

        Self {
            config,
            registry,
            cancel: CancellationToken::new(),
        }
    }

    /// Token cancelling every driver created by this app
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    /// Get list of all configured sources
    pub fn sources(&self) -> &[SourceConfig] {
        &self.config.sources
    }

    fn source(&self, id: &str) -> Result<&SourceConfig, DriverError> {
        self.config
            .source(id)
            .ok_or_else(|| DriverError::UnknownSource(id.to_string()))
    }

    /// Run the connectivity test for one source
    pub async fn test_source(&self, id: &str) -> Result<(), DriverError> {
        let source = self.source(id)?;
        tracing::info!("Testing connection for source {} ({})", id, source.source_type);
        self.registry
            .test_connection(source, self.cancel.child_token())
            .await
    }

    /// Fetch every object of one source and hand them to `loader`
    ///
    /// `end` defaults to now and `start` to the driver's refresh window before `end`.
    pub async fn sync_source(
        &self,
        id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        loader: &dyn ObjectsLoader,
    ) -> Result<TimeInterval, DriverError> {
        let source = self.source(id)?;
        let driver = self.registry.create_driver(source, self.cancel.child_token())?;

        let end = end.unwrap_or_else(Utc::now);
        let interval = match start {
            Some(start) => TimeInterval::new(start, end),
            None => TimeInterval::ending_at(end, driver.refresh_window()),
        };
        if interval.start > interval.end {
            return Err(ConfigError::Invalid(format!(
                "interval start is after end: {}",
                interval
            ))
            .into());
        }

        tracing::info!(
            "Syncing source {} into {} for {}",
            id,
            driver.table_name(),
            interval
        );
        driver.get_objects_for(&interval, loader).await?;
        tracing::info!("Source {} synced ({})", id, driver.meta_key());

        Ok(interval)
    }
}
