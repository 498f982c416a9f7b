use sqlx::migrate::{MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// True once the timestamp log table exists.
pub async fn schema_ready(pool: &DbPool) -> Result<bool, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'slack_timestamp'",
    )
    .fetch_one(pool)
    .await?;
    Ok(count == 1)
}

#[cfg(test)]
mod tests {
    use super::{run_pending, schema_ready};
    use crate::connect_with_settings;

    const MANAGED_SCHEMA_OBJECTS: &[&str] =
        &["slack_timestamp", "idx_slack_timestamp_user_id", "idx_slack_timestamp_timestamp"];

    #[tokio::test]
    async fn migrations_create_timestamp_table_and_indexes() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
        run_pending(&pool).await.expect("migrations");

        for name in MANAGED_SCHEMA_OBJECTS {
            let (count,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE name = ?")
                    .bind(name)
                    .fetch_one(&pool)
                    .await
                    .expect("schema query");
            assert_eq!(count, 1, "`{name}` should exist after migration");
        }

        pool.close().await;
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");

        assert!(!schema_ready(&pool).await.expect("probe"));
        run_pending(&pool).await.expect("first run");
        run_pending(&pool).await.expect("second run should be a no-op");
        assert!(schema_ready(&pool).await.expect("probe"));

        pool.close().await;
    }
}
