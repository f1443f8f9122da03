//! Record store adapters.
//!
//! [`JsonlRecordStore`] appends one JSON object per line to a log file in the
//! data directory. Records are never rewritten.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use buddy_core::chat::store::RecordStore;
use buddy_types::error::StoreError;
use buddy_types::record::StoredRecord;

/// Append-only JSON-lines log of extracted records.
pub struct JsonlRecordStore {
    path: PathBuf,
    // Serializes appends from concurrent turns.
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonlRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for JsonlRecordStore {
    async fn save(&self, record: &StoredRecord) -> Result<(), StoreError> {
        let mut line =
            serde_json::to_string(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Io(e.to_string()))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        file.flush().await.map_err(|e| StoreError::Io(e.to_string()))?;

        tracing::debug!(record_id = %record.id, kind = %record.kind, "record appended");
        Ok(())
    }
}
