// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The on-disk failure journal.
//!
//! One JSON file per failed event, kept outside the main store so a
//! store outage does not also break recovery tracking. Exhausted records
//! move to a `dead_letter/` subdirectory for manual inspection and are
//! never retried automatically again.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use wahook_core::event::RawEvent;
use wahook_core::time::now_rfc3339;
use wahook_core::types::FailedEventRecord;
use wahook_core::WahookError;

const DEAD_LETTER_DIR: &str = "dead_letter";

fn io_err(context: &str, e: std::io::Error) -> WahookError {
    WahookError::Internal(format!("journal {context}: {e}"))
}

#[derive(Debug, Clone)]
pub struct FailureJournal {
    dir: PathBuf,
}

impl FailureJournal {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dead_letter_dir(&self) -> PathBuf {
        self.dir.join(DEAD_LETTER_DIR)
    }

    /// Create the journal and dead-letter directories.
    pub async fn ensure_dirs(&self) -> Result<(), WahookError> {
        tokio::fs::create_dir_all(self.dead_letter_dir())
            .await
            .map_err(|e| io_err("create dirs", e))
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Persist a failed delivery with `retry_count = 0`.
    pub async fn capture(
        &self,
        raw: &RawEvent,
        error: &WahookError,
    ) -> Result<FailedEventRecord, WahookError> {
        let record = FailedEventRecord {
            id: Uuid::new_v4().to_string(),
            timestamp: now_rfc3339(),
            instance_id: raw.instance_id.clone(),
            event_type: raw.event.clone(),
            payload: raw.payload.clone(),
            sender: raw.sender.clone(),
            error: error.to_string(),
            retry_count: 0,
            last_retry_at: None,
        };
        self.write_record(&self.record_path(&record.id), &record)
            .await?;
        tracing::warn!(
            id = %record.id,
            event = %record.event_type,
            error = %record.error,
            "captured failed event to journal"
        );
        Ok(record)
    }

    /// All pending records, oldest capture first.
    pub async fn pending(&self) -> Result<Vec<FailedEventRecord>, WahookError> {
        let mut records = self.read_dir_records(&self.dir).await?;
        records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(records)
    }

    /// Records that exhausted their retries, for manual inspection.
    pub async fn dead_letters(&self) -> Result<Vec<FailedEventRecord>, WahookError> {
        self.read_dir_records(&self.dead_letter_dir()).await
    }

    /// Rewrite a record after a failed retry attempt.
    pub async fn update(&self, record: &FailedEventRecord) -> Result<(), WahookError> {
        self.write_record(&self.record_path(&record.id), record)
            .await
    }

    /// Remove a record after successful replay.
    pub async fn delete(&self, id: &str) -> Result<(), WahookError> {
        tokio::fs::remove_file(self.record_path(id))
            .await
            .map_err(|e| io_err("delete", e))
    }

    /// Move a record to the dead-letter partition.
    pub async fn dead_letter(&self, record: &FailedEventRecord) -> Result<(), WahookError> {
        let target = self.dead_letter_dir().join(format!("{}.json", record.id));
        self.write_record(&target, record).await?;
        tokio::fs::remove_file(self.record_path(&record.id))
            .await
            .map_err(|e| io_err("dead-letter move", e))?;
        tracing::error!(
            id = %record.id,
            event = %record.event_type,
            retries = record.retry_count,
            "event exhausted retries, moved to dead letter"
        );
        Ok(())
    }

    async fn write_record(
        &self,
        path: &Path,
        record: &FailedEventRecord,
    ) -> Result<(), WahookError> {
        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| WahookError::Internal(format!("journal serialize: {e}")))?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| io_err("write", e))
    }

    async fn read_dir_records(&self, dir: &Path) -> Result<Vec<FailedEventRecord>, WahookError> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err("read dir", e)),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_err("read dir", e))? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable journal file");
                    continue;
                }
            };
            match serde_json::from_slice::<FailedEventRecord>(&bytes) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping corrupt journal file");
                }
            }
        }
        Ok(records)
    }
}
