use chrono::Utc;
use tokio::sync::RwLock;

use kronos_core::EventRecord;

use super::{RepositoryError, StoredEvent, TimestampLogRepository};

#[derive(Default)]
pub struct InMemoryTimestampLogRepository {
    rows: RwLock<Vec<StoredEvent>>,
}

impl InMemoryTimestampLogRepository {
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl TimestampLogRepository for InMemoryTimestampLogRepository {
    async fn insert(&self, record: &EventRecord) -> Result<i64, RepositoryError> {
        let mut rows = self.rows.write().await;
        let id = i64::try_from(rows.len())
            .map_err(|error| RepositoryError::Decode(error.to_string()))?
            + 1;
        rows.push(StoredEvent { id, recorded_at: Utc::now(), values: record.to_flat_map() });
        Ok(id)
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<StoredEvent>, RepositoryError> {
        let rows = self.rows.read().await;
        Ok(rows.iter().rev().take(limit as usize).cloned().collect())
    }
}
