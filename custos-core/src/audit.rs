use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of user-visible action recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEventKind {
    #[serde(rename = "user:read")]
    Read,
    #[serde(rename = "user:created")]
    Created,
    #[serde(rename = "user:updated")]
    Updated,
    #[serde(rename = "user:deleted")]
    Deleted,
}

impl std::str::FromStr for AuditEventKind {
    type Err = crate::error::CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user:read" => Ok(AuditEventKind::Read),
            "user:created" => Ok(AuditEventKind::Created),
            "user:updated" => Ok(AuditEventKind::Updated),
            "user:deleted" => Ok(AuditEventKind::Deleted),
            other => Err(crate::error::CoreError::Internal(format!(
                "unknown audit event kind: {other}"
            ))),
        }
    }
}

impl AuditEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventKind::Read => "user:read",
            AuditEventKind::Created => "user:created",
            AuditEventKind::Updated => "user:updated",
            AuditEventKind::Deleted => "user:deleted",
        }
    }
}

/// A record of a read/write action performed by an authenticated user.
/// Created by a handler at the moment an action succeeds and never mutated
/// afterwards; ownership moves to the pub/sub channel on publish and to the
/// audit store once consumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Subject identifier of the acting user (string form of its UUID).
    pub user_id: String,
    pub event: AuditEventKind,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl AuditEvent {
    pub fn now(user_id: impl Into<String>, event: AuditEventKind, data: Value) -> Self {
        Self {
            user_id: user_id.into(),
            event,
            data,
            created_at: Utc::now(),
            updated_at: None,
            deleted_at: None,
        }
    }
}

/// Query parameters for the paginated audit listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListAuditQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl crate::user::Validate for ListAuditQuery {
    // Out-of-range pagination values are clamped, not rejected.
    fn validate(&self) -> crate::error::Result<()> {
        Ok(())
    }
}

impl ListAuditQuery {
    pub fn pagination(&self) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self
            .page_size
            .unwrap_or(crate::user::DEFAULT_PAGE_SIZE)
            .clamp(1, crate::user::MAX_PAGE_SIZE);
        (page, page_size)
    }
}
