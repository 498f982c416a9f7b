use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::Row;

use kronos_core::domain::event::{
    CANONICAL_TIMESTAMP_KEY, REQUEST_TIMESTAMP_HEADER, SLACK_FORM_FIELDS,
};
use kronos_core::EventRecord;

use super::{RepositoryError, StoredEvent, TimestampLogRepository};
use crate::DbPool;

const REQUEST_TIMESTAMP_COLUMN: &str = "x_slack_request_timestamp";

pub struct SqlTimestampLogRepository {
    pool: DbPool,
}

impl SqlTimestampLogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Fields outside the fixed Slack column set, stored as a JSON object so no
/// input field is lost.
fn extra_fields_json(record: &EventRecord) -> Result<String, RepositoryError> {
    let extras: BTreeMap<&str, &str> = record
        .fields
        .iter()
        .filter(|(key, _)| !SLACK_FORM_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();
    serde_json::to_string(&extras).map_err(|error| RepositoryError::Decode(error.to_string()))
}

fn row_to_stored(row: &sqlx::sqlite::SqliteRow) -> Result<StoredEvent, RepositoryError> {
    let decode = |error: sqlx::Error| RepositoryError::Decode(error.to_string());

    let id: i64 = row.try_get("id").map_err(decode)?;
    let request_timestamp: String = row.try_get(REQUEST_TIMESTAMP_COLUMN).map_err(decode)?;
    let timestamp: String = row.try_get(CANONICAL_TIMESTAMP_KEY).map_err(decode)?;
    let extra_fields: String = row.try_get("extra_fields").map_err(decode)?;
    let recorded_at_str: String = row.try_get("recorded_at").map_err(decode)?;

    let mut values: BTreeMap<String, String> = serde_json::from_str(&extra_fields)
        .map_err(|error| RepositoryError::Decode(format!("extra_fields: {error}")))?;
    for column in SLACK_FORM_FIELDS {
        let value: Option<String> = row.try_get(column).map_err(decode)?;
        if let Some(value) = value {
            values.insert(column.to_string(), value);
        }
    }
    values.insert(REQUEST_TIMESTAMP_HEADER.to_string(), request_timestamp);
    values.insert(CANONICAL_TIMESTAMP_KEY.to_string(), timestamp);

    let recorded_at = DateTime::parse_from_rfc3339(&recorded_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("recorded_at: {error}")))?;

    Ok(StoredEvent { id, recorded_at, values })
}

#[async_trait::async_trait]
impl TimestampLogRepository for SqlTimestampLogRepository {
    async fn insert(&self, record: &EventRecord) -> Result<i64, RepositoryError> {
        let extra_fields = extra_fields_json(record)?;

        let mut query = sqlx::query(
            "INSERT INTO slack_timestamp (x_slack_request_timestamp,
                                          token, team_id, team_domain, channel_id, channel_name,
                                          user_id, user_name, command, text, api_app_id,
                                          is_enterprise_install, response_url, trigger_id,
                                          extra_fields, timestamp, recorded_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.request_timestamp);
        for column in SLACK_FORM_FIELDS {
            query = query.bind(record.field(column));
        }
        let result = query
            .bind(extra_fields)
            .bind(record.timestamp.as_str())
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<StoredEvent>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, x_slack_request_timestamp,
                    token, team_id, team_domain, channel_id, channel_name,
                    user_id, user_name, command, text, api_app_id,
                    is_enterprise_install, response_url, trigger_id,
                    extra_fields, timestamp, recorded_at
             FROM slack_timestamp
             ORDER BY id DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_stored).collect::<Result<Vec<_>, _>>()
    }
}
