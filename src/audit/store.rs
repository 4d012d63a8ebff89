//! Persistence collaborators for audit records

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::AuditRecord;

/// Failure reported by an audit store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("audit store unavailable: {0}")]
    Unavailable(String),

    #[error("audit record rejected: {0}")]
    Rejected(String),

    #[error("audit store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize audit record: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable destination for structured audit records
///
/// Transient and permanent failures are treated alike by the caller: the
/// record is given up and the failure is written to the text log.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Persist one record and return its id
    async fn insert_audit_record(&self, record: AuditRecord) -> Result<i64, StoreError>;
}

/// Appends each record as one JSON object per line
#[derive(Debug)]
pub struct JsonlAuditStore {
    path: PathBuf,
    /// Id of the last stored record
    last_id: Mutex<i64>,
}

#[derive(Serialize)]
struct StoredRecord<'a> {
    id: i64,
    #[serde(flatten)]
    record: &'a AuditRecord,
}

impl JsonlAuditStore {
    /// Open (or prepare) the store file. Ids continue after existing lines.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context("Failed to create audit store directory")?;
        }

        let existing = if path.exists() {
            let content =
                std::fs::read_to_string(&path).context("Failed to read audit store file")?;
            content.lines().filter(|l| !l.trim().is_empty()).count() as i64
        } else {
            0
        };

        tracing::debug!(path = %path.display(), existing, "Opened audit store");

        Ok(Self {
            path,
            last_id: Mutex::new(existing),
        })
    }

    /// Get the path to the store file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditStore for JsonlAuditStore {
    async fn insert_audit_record(&self, record: AuditRecord) -> Result<i64, StoreError> {
        let mut last_id = self.last_id.lock().await;
        let id = *last_id + 1;

        let mut line = serde_json::to_string(&StoredRecord {
            id,
            record: &record,
        })?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        *last_id = id;
        Ok(id)
    }
}
