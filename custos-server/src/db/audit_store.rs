use async_trait::async_trait;
use chrono::{DateTime, Utc};
use custos_core::{
    AuditEvent, CoreError, Result,
    ports::AuditRepository,
};
use serde_json::Value;
use sqlx::PgPool;

use super::storage_err;

/// PostgreSQL-backed implementation of the `AuditRepository` port.
///
/// Expects a `user_logs` table with `user_id text`, `event text`,
/// `data jsonb`, `created_at`, `updated_at`, `deleted_at`.
#[derive(Clone, Debug)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AuditRow {
    user_id: String,
    event: String,
    data: Option<Value>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<AuditRow> for AuditEvent {
    type Error = CoreError;

    fn try_from(row: AuditRow) -> Result<Self> {
        Ok(AuditEvent {
            user_id: row.user_id,
            event: row.event.parse()?,
            data: row.data.unwrap_or(Value::Null),
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn create(&self, event: &AuditEvent) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_logs (user_id, event, data, created_at, updated_at, deleted_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&event.user_id)
        .bind(event.event.as_str())
        .bind(&event.data)
        .bind(event.created_at)
        .bind(event.updated_at)
        .bind(event.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }

    async fn find(&self, page: u32, page_size: u32) -> Result<(Vec<AuditEvent>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_logs")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;

        let rows: Vec<AuditRow> = sqlx::query_as(
            "SELECT user_id, event, data, created_at, updated_at, deleted_at FROM user_logs \
             ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(i64::from(page_size))
        .bind(i64::from(page.saturating_sub(1)) * i64::from(page_size))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        let events = rows
            .into_iter()
            .map(AuditEvent::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok((events, total))
    }
}
