//! Driver and loader contracts shared by every source connector.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DriverError, LoadError};

/// One upstream object. Field names and types are whatever the API returns.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Time interval a refresh was requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Interval of `window` length ending at `end`.
    pub fn ending_at(end: DateTime<Utc>, window: Duration) -> Self {
        let window = chrono::Duration::from_std(window).unwrap_or(chrono::Duration::zero());
        Self {
            start: end - window,
            end,
        }
    }
}

impl std::fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Destination collection a driver writes into. Owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Logical collection name
    pub name: String,

    /// Physical table name; falls back to `name` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
}

impl Collection {
    pub fn new(name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_name: Some(table_name.into()),
        }
    }

    pub fn table_name(&self) -> &str {
        match self.table_name.as_deref() {
            Some(table) if !table.is_empty() => table,
            _ => &self.name,
        }
    }
}

/// A named sequence of records handed to the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectBatch {
    pub name: String,
    pub records: Vec<Record>,
}

impl ObjectBatch {
    pub fn new(name: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Persists fetched objects into the downstream store.
#[async_trait]
pub trait ObjectsLoader: Send + Sync {
    /// Receives every batch of one fetch cycle in a single call.
    async fn load(&self, interval: &TimeInterval, batches: Vec<ObjectBatch>)
        -> Result<(), LoadError>;
}

/// Source driver interface.
///
/// Drivers hold no mutable state between calls; each `get_objects_for`
/// re-fetches everything from the origin.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Physical table name of the destination collection.
    fn table_name(&self) -> String;

    /// Key used for refresh bookkeeping.
    fn meta_key(&self) -> String;

    /// How far back a scheduler should consider data stale.
    fn refresh_window(&self) -> Duration;

    /// Whether loaded data replaces the destination table wholesale.
    fn replace_tables(&self) -> bool;

    /// Fetches every resource and hands the results to `loader` in one call.
    ///
    /// Nothing is loaded unless every fetch succeeds.
    async fn get_objects_for(
        &self,
        interval: &TimeInterval,
        loader: &dyn ObjectsLoader,
    ) -> Result<(), DriverError>;
}
