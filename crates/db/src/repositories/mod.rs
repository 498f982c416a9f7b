use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use kronos_core::EventRecord;

pub mod memory;
pub mod timestamp_log;

pub use memory::InMemoryTimestampLogRepository;
pub use timestamp_log::SqlTimestampLogRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// A persisted record as read back: the flat field map the record was stored
/// with, plus storage metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredEvent {
    pub id: i64,
    pub recorded_at: DateTime<Utc>,
    pub values: BTreeMap<String, String>,
}

#[async_trait]
pub trait TimestampLogRepository: Send + Sync {
    /// Appends one row and returns its id. Never deduplicates.
    async fn insert(&self, record: &EventRecord) -> Result<i64, RepositoryError>;

    /// Newest first.
    async fn list_recent(&self, limit: u32) -> Result<Vec<StoredEvent>, RepositoryError>;
}
