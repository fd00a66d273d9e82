use async_trait::async_trait;
use chrono::{DateTime, Utc};
use custos_core::{
    CoreError, Result, User,
    ports::{UserLookup, UserRepository},
};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;
use uuid::Uuid;

use super::storage_err;

pub async fn connect_postgres(database_url: &str) -> anyhow::Result<PgPool> {
    info!("connecting to Postgres");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("connected to Postgres");
    Ok(pool)
}

/// PostgreSQL-backed implementation of the `UserRepository` port.
///
/// Expects a `users` table with `id uuid primary key`, `name`, `email`
/// (unique), `password_hash`, `created_at`, `updated_at`.
#[derive(Clone, Debug)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";

fn create_err(error: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &error {
        if db_err.is_unique_violation() {
            return CoreError::Conflict("Email already exists".to_string());
        }
    }
    storage_err(error)
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(create_err)?;

        Ok(())
    }

    async fn find(
        &self,
        search: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<User>, i64)> {
        let like = search.map(|term| format!("%{term}%"));

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE ($1::text IS NULL OR name LIKE $1)")
                .bind(&like)
                .fetch_one(&self.pool)
                .await
                .map_err(storage_err)?;

        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE ($1::text IS NULL OR name LIKE $1) \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(&like)
        .bind(i64::from(page_size))
        .bind(i64::from(page.saturating_sub(1)) * i64::from(page_size))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok((rows.into_iter().map(User::from).collect(), total))
    }

    async fn get_by(&self, lookup: &UserLookup) -> Result<User> {
        let by_id = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let by_email = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        let query = match lookup {
            UserLookup::Id(id) => sqlx::query_as(&by_id).bind(*id),
            UserLookup::Email(email) => sqlx::query_as(&by_email).bind(email.clone()),
        };

        let row: Option<UserRow> = query
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;

        row.map(User::from)
            .ok_or_else(|| CoreError::NotFound(format!("user with {lookup} not found")))
    }

    async fn update(&self, user: &User) -> Result<()> {
        let result = sqlx::query(
            "UPDATE users SET name = $2, email = $3, password_hash = $4, updated_at = $5 \
             WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(create_err)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!(
                "user with id {} not found",
                user.id
            )));
        }

        Ok(())
    }

    async fn delete_by(&self, lookup: &UserLookup) -> Result<()> {
        let query = match lookup {
            UserLookup::Id(id) => sqlx::query("DELETE FROM users WHERE id = $1").bind(*id),
            UserLookup::Email(email) => {
                sqlx::query("DELETE FROM users WHERE email = $1").bind(email.clone())
            }
        };

        let result = query.execute(&self.pool).await.map_err(storage_err)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("user with {lookup} not found")));
        }

        Ok(())
    }
}
