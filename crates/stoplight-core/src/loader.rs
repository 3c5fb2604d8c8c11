//! Newline-delimited JSON objects loader.
//!
//! Appends each batch to `<root>/<table>/<batch name>.ndjson`, one record per line.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::driver::{ObjectBatch, ObjectsLoader, TimeInterval};
use crate::error::LoadError;

#[derive(Debug, Clone)]
pub struct NdjsonLoader {
    root: PathBuf,
    table: String,
}

impl NdjsonLoader {
    pub fn new(root: impl Into<PathBuf>, table: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            table: table.into(),
        }
    }

    /// Directory this loader writes into.
    pub fn table_dir(&self) -> PathBuf {
        self.root.join(&self.table)
    }

    fn batch_path(&self, batch: &str) -> PathBuf {
        self.table_dir().join(format!("{}.ndjson", batch))
    }

    async fn append(path: &Path, batch: &ObjectBatch) -> Result<(), LoadError> {
        let mut buf = Vec::new();
        for record in &batch.records {
            serde_json::to_writer(&mut buf, record)?;
            buf.push(b'\n');
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(&buf).await?;
        file.flush().await?;
        Ok(())
    }
}

/// True when `name` stays inside its parent directory once joined to it.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(|c: char| c == '/' || c == '\\')
}

#[async_trait]
impl ObjectsLoader for NdjsonLoader {
    async fn load(
        &self,
        interval: &TimeInterval,
        batches: Vec<ObjectBatch>,
    ) -> Result<(), LoadError> {
        if !is_plain_file_name(&self.table) {
            return Err(LoadError::Rejected(format!(
                "invalid table name: {:?}",
                self.table
            )));
        }
        for batch in &batches {
            if !is_plain_file_name(&batch.name) {
                return Err(LoadError::Rejected(format!(
                    "invalid batch name: {:?}",
                    batch.name
                )));
            }
        }

        tokio::fs::create_dir_all(self.table_dir()).await?;

        for batch in &batches {
            let path = self.batch_path(&batch.name);
            Self::append(&path, batch).await?;
            tracing::info!(
                "Loaded {} {} records for {} into {}",
                batch.len(),
                batch.name,
                interval,
                path.display()
            );
        }

        Ok(())
    }
}
