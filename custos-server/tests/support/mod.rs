//! In-memory implementations of the storage and event-bus ports plus request
//! helpers shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, header};
use axum::response::Response;
use chrono::Utc;
use custos_core::{
    AuditEvent, CoreError, Result, User,
    ports::{AuditRepository, EventBus, EventStream, UserLookup, UserRepository},
};
use custos_server::audit::publisher::AuditPublisher;
use custos_server::auth::jwt::TokenService;
use custos_server::auth::password;
use custos_server::infra::app_state::AppState;
use custos_server::infra::config::Config;
use futures_util::StreamExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: String::new(),
        redis_url: String::new(),
        user_log_channel: "user_log_channel".to_string(),
        access_token_key: "test-access-secret".to_string(),
        access_token_ttl_secs: 3600,
        refresh_token_key: "test-refresh-secret".to_string(),
        refresh_token_ttl_secs: 86400,
        cors_allowed_origins: Vec::new(),
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.iter().any(|existing| existing.email == user.email) {
            return Err(CoreError::Conflict("Email already exists".to_string()));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn find(
        &self,
        search: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<User>, i64)> {
        let users = self.users.read().await;
        let mut matches: Vec<User> = users
            .iter()
            .filter(|user| search.is_none_or(|term| user.name.contains(term)))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matches.len() as i64;
        let start = ((page - 1) * page_size) as usize;
        let items = matches
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();
        Ok((items, total))
    }

    async fn get_by(&self, lookup: &UserLookup) -> Result<User> {
        self.users
            .read()
            .await
            .iter()
            .find(|user| matches(user, lookup))
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("user with {lookup} not found")))
    }

    async fn update(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        if users
            .iter()
            .any(|existing| existing.email == user.email && existing.id != user.id)
        {
            return Err(CoreError::Conflict("Email already exists".to_string()));
        }
        match users.iter_mut().find(|existing| existing.id == user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(CoreError::NotFound(format!(
                "user with id {} not found",
                user.id
            ))),
        }
    }

    async fn delete_by(&self, lookup: &UserLookup) -> Result<()> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|user| !matches(user, lookup));
        if users.len() == before {
            return Err(CoreError::NotFound(format!("user with {lookup} not found")));
        }
        Ok(())
    }
}

fn matches(user: &User, lookup: &UserLookup) -> bool {
    match lookup {
        UserLookup::Id(id) => user.id == *id,
        UserLookup::Email(email) => &user.email == email,
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAuditRepository {
    events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryAuditRepository {
    pub async fn all(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn create(&self, event: &AuditEvent) -> Result<()> {
        self.events.write().await.push(event.clone());
        Ok(())
    }

    async fn find(&self, page: u32, page_size: u32) -> Result<(Vec<AuditEvent>, i64)> {
        let events = self.events.read().await;
        let mut sorted: Vec<AuditEvent> = events.clone();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = sorted.len() as i64;
        let start = ((page - 1) * page_size) as usize;
        let items = sorted
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();
        Ok((items, total))
    }
}

/// Broadcast-channel stand-in for Redis pub/sub with the same at-most-once
/// contract: publishing with no subscriber silently drops the message.
#[derive(Debug, Default)]
pub struct InMemoryEventBus {
    channels: Mutex<HashMap<String, broadcast::Sender<Vec<u8>>>>,
}

impl InMemoryEventBus {
    pub async fn has_subscribers(&self, channel: &str) -> bool {
        self.channels
            .lock()
            .await
            .get(channel)
            .is_some_and(|sender| sender.receiver_count() > 0)
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<()> {
        let channels = self.channels.lock().await;
        if let Some(sender) = channels.get(channel) {
            let _ = sender.send(payload);
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<EventStream> {
        let mut channels = self.channels.lock().await;
        let sender = channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(64).0);
        let stream =
            BroadcastStream::new(sender.subscribe()).filter_map(|item| async move { item.ok() });
        Ok(Box::pin(stream))
    }
}

pub struct TestContext {
    pub state: AppState,
    pub users: Arc<InMemoryUserRepository>,
    pub audit_store: Arc<InMemoryAuditRepository>,
    pub bus: Arc<InMemoryEventBus>,
}

impl std::fmt::Debug for TestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestContext").finish_non_exhaustive()
    }
}

pub fn setup_test_state() -> TestContext {
    let config = Arc::new(test_config());
    let users = Arc::new(InMemoryUserRepository::default());
    let audit_store = Arc::new(InMemoryAuditRepository::default());
    let bus = Arc::new(InMemoryEventBus::default());

    let state = AppState {
        config: config.clone(),
        users: users.clone(),
        audit_logs: audit_store.clone(),
        tokens: Arc::new(TokenService::new(&config)),
        audit: AuditPublisher::new(bus.clone(), config.user_log_channel.clone()),
    };

    TestContext {
        state,
        users,
        audit_store,
        bus,
    }
}

pub async fn seed_user(ctx: &TestContext, name: &str, email: &str, pass: &str) -> User {
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        password_hash: password::hash(pass).unwrap(),
        created_at: now,
        updated_at: now,
    };
    ctx.users.create(&user).await.unwrap();
    user
}

pub fn test_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn test_request_json<T: Serialize>(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: &T,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub async fn parse_json_response<T: DeserializeOwned>(response: Response) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
