use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use uuid::Uuid;

use crate::audit::AuditEvent;
use crate::error::Result;
use crate::user::User;

/// Typed lookup key for single-user operations. Replaces a stringly
/// column-name API so no SQL is ever built from caller-supplied strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
    Id(Uuid),
    Email(String),
}

impl fmt::Display for UserLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserLookup::Id(id) => write!(f, "id {id}"),
            UserLookup::Email(email) => write!(f, "email {email}"),
        }
    }
}

/// Persistent store for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<()>;

    /// Page of users matching an optional name-substring search, newest
    /// first, plus the total match count.
    async fn find(
        &self,
        search: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<User>, i64)>;

    async fn get_by(&self, lookup: &UserLookup) -> Result<User>;

    async fn update(&self, user: &User) -> Result<()>;

    async fn delete_by(&self, lookup: &UserLookup) -> Result<()>;
}

/// Durable store for consumed audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn create(&self, event: &AuditEvent) -> Result<()>;

    /// Page of events, newest first, plus the total count.
    async fn find(&self, page: u32, page_size: u32) -> Result<(Vec<AuditEvent>, i64)>;
}

/// Raw payload stream produced by a subscription. Ends when the underlying
/// channel closes.
pub type EventStream = Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>;

/// Named at-most-once pub/sub channel. Publishing is best effort: there is
/// no delivery guarantee and no redelivery if no subscriber is listening.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<()>;

    async fn subscribe(&self, channel: &str) -> Result<EventStream>;
}
