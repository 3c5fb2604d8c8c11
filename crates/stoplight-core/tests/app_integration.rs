//! Integration tests for App source resolution and the NDJSON loader.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use stoplight_core::{
    App, Collection, Config, ConnectionError, Driver, DriverError, DriverProvider, DriverRegistry,
    NdjsonLoader, ObjectBatch, ObjectsLoader, Record, SourceConfig, TimeInterval,
};
use tokio_util::sync::CancellationToken;

const WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Driver emitting one fixed record per batch name.
struct FixedDriver {
    collection: Collection,
    batches: Vec<&'static str>,
}

#[async_trait]
impl Driver for FixedDriver {
    fn table_name(&self) -> String {
        self.collection.table_name().to_string()
    }

    fn meta_key(&self) -> String {
        format!("{}_{}", self.collection.name, self.table_name())
    }

    fn refresh_window(&self) -> Duration {
        WINDOW
    }

    fn replace_tables(&self) -> bool {
        false
    }

    async fn get_objects_for(
        &self,
        interval: &TimeInterval,
        loader: &dyn ObjectsLoader,
    ) -> Result<(), DriverError> {
        let batches = self
            .batches
            .iter()
            .map(|name| {
                let mut record = Record::new();
                record.insert("kind".into(), serde_json::Value::String(name.to_string()));
                ObjectBatch::new(*name, vec![record])
            })
            .collect();
        loader.load(interval, batches).await?;
        Ok(())
    }
}

struct FixedProvider;

#[async_trait]
impl DriverProvider for FixedProvider {
    fn source_type(&self) -> &str {
        "fixed"
    }

    fn create(
        &self,
        _source: &SourceConfig,
        collection: Collection,
        _cancel: CancellationToken,
    ) -> Result<Box<dyn Driver>, DriverError> {
        Ok(Box::new(FixedDriver {
            collection,
            batches: vec!["calendars", "contacts"],
        }))
    }

    async fn test_connection(
        &self,
        source: &SourceConfig,
        cancel: CancellationToken,
    ) -> Result<(), ConnectionError> {
        if cancel.is_cancelled() {
            return Err(ConnectionError::Cancelled {
                service: "fixed".into(),
            });
        }
        if source.config.get("reachable").and_then(|v| v.as_bool()) == Some(true) {
            Ok(())
        } else {
            Err(ConnectionError::EmptyResponse {
                service: "fixed".into(),
            })
        }
    }
}

fn app(output_dir: &std::path::Path) -> App {
    let config = Config::from_toml(&format!(
        r#"
output_dir = "{}"

[[sources]]
id = "up"
type = "fixed"
collection = {{ name = "leads", table_name = "leads_table" }}
config = {{ reachable = true }}

[[sources]]
id = "down"
type = "fixed"
collection = {{ name = "leads" }}

[[sources]]
id = "orphan"
type = "nobody"
collection = {{ name = "x" }}
"#,
        output_dir.display()
    ))
    .unwrap();

    let mut registry = DriverRegistry::new();
    registry.register(Arc::new(FixedProvider));
    App::new(config, registry)
}

#[tokio::test]
async fn test_connection_per_source() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    assert_eq!(app.sources().len(), 3);
    app.test_source("up").await.unwrap();

    let err = app.test_source("down").await.unwrap_err();
    assert!(matches!(
        err,
        DriverError::Connection(ConnectionError::EmptyResponse { .. })
    ));

    let err = app.test_source("orphan").await.unwrap_err();
    assert!(matches!(err, DriverError::UnknownSourceType(t) if t == "nobody"));

    let err = app.test_source("ghost").await.unwrap_err();
    assert!(matches!(err, DriverError::UnknownSource(s) if s == "ghost"));
}

#[tokio::test]
async fn test_connection_sees_app_cancellation() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    app.cancel_token().cancel();
    let err = app.test_source("up").await.unwrap_err();
    assert!(matches!(
        err,
        DriverError::Connection(ConnectionError::Cancelled { .. })
    ));
}

#[tokio::test]
async fn test_sync_writes_ndjson() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());
    let loader = NdjsonLoader::new(&app.config().output_dir, "leads_table");

    let interval = app.sync_source("up", None, None, &loader).await.unwrap();
    assert_eq!(interval.end - interval.start, chrono::Duration::days(7));

    let calendars =
        std::fs::read_to_string(dir.path().join("leads_table/calendars.ndjson")).unwrap();
    assert_eq!(calendars.trim(), r#"{"kind":"calendars"}"#);
    assert!(dir.path().join("leads_table/contacts.ndjson").exists());
}

#[tokio::test]
async fn test_sync_keeps_explicit_interval() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());
    let loader = NdjsonLoader::new(dir.path(), "leads");

    let requested = TimeInterval::ending_at(chrono::Utc::now(), Duration::from_secs(60));
    let used = app
        .sync_source("down", Some(requested.start), Some(requested.end), &loader)
        .await
        .unwrap();
    assert_eq!(used, requested);
}

#[tokio::test]
async fn test_sync_rejects_inverted_interval() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());
    let loader = NdjsonLoader::new(dir.path(), "leads");

    let now = chrono::Utc::now();
    let err = app
        .sync_source("up", Some(now), Some(now - chrono::Duration::hours(1)), &loader)
        .await
        .unwrap_err();
    assert!(matches!(err, DriverError::Config(_)));
    assert!(!dir.path().join("leads").exists());
}
