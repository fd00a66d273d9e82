pub mod audit_store;
pub mod postgres;
pub mod redis_bus;

use custos_core::CoreError;

/// Maps sqlx failures onto the core taxonomy: connection-level problems are
/// transient, everything else is internal.
pub(crate) fn storage_err(error: sqlx::Error) -> CoreError {
    match error {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            CoreError::Unavailable(format!("database unavailable: {error}"))
        }
        other => CoreError::Internal(format!("database error: {other}")),
    }
}
