//! Populates the user table with deterministic sample accounts.
//!
//! Every seeded account shares the password `password`. Accounts that
//! already exist are left untouched, so the seeder is safe to re-run.

use chrono::Utc;
use custos_core::CoreError;
use custos_core::User;
use custos_core::ports::{UserLookup, UserRepository};
use custos_server::auth::password;
use custos_server::db::postgres::{PostgresUserRepository, connect_postgres};
use custos_server::infra::config::Config;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use uuid::Uuid;

const SEED_USER_COUNT: u32 = 100;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let pool = connect_postgres(&config.database_url).await?;
    let users = PostgresUserRepository::new(pool.clone());

    // All seeded accounts share one password, so hash once.
    let password_hash = password::hash("password")?;

    let mut created = 0;
    for i in 1..=SEED_USER_COUNT {
        let email = format!("user{i}@gmail.com");

        match users.get_by(&UserLookup::Email(email.clone())).await {
            Ok(_) => continue,
            Err(CoreError::NotFound(_)) => {}
            Err(error) => return Err(error.into()),
        }

        let now = Utc::now();
        users
            .create(&User {
                id: Uuid::new_v4(),
                name: format!("User {i}"),
                email,
                password_hash: password_hash.clone(),
                created_at: now,
                updated_at: now,
            })
            .await?;
        created += 1;
    }

    pool.close().await;
    info!(created, total = SEED_USER_COUNT, "seeding complete");
    Ok(())
}
