use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Wrong email/password or an invalid token. Deliberately carries no
    /// detail about which check failed.
    #[error("invalid credential")]
    InvalidCredential,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Per-field request validation failures, keyed by field name.
    #[error("validation failed")]
    Validation(BTreeMap<String, String>),

    #[error("dependency unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Single-field validation failure, mostly useful in tests and adapters.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.into(), message.into());
        CoreError::Validation(fields)
    }
}
