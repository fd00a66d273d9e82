use async_trait::async_trait;
use custos_core::{
    CoreError, Result,
    ports::{EventBus, EventStream},
};
use futures_util::StreamExt;
use redis::{AsyncCommands, aio::ConnectionManager};
use tracing::info;

/// Redis pub/sub adapter for the audit channel.
///
/// Publishing goes through a shared, internally reconnecting
/// `ConnectionManager`; each subscription opens its own pub/sub connection
/// (the protocol requires a dedicated one).
#[derive(Clone)]
pub struct RedisEventBus {
    client: redis::Client,
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisEventBus").finish_non_exhaustive()
    }
}

impl RedisEventBus {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        info!("connecting to Redis");

        let client = redis::Client::open(redis_url)
            .map_err(|e| CoreError::Unavailable(format!("failed to create Redis client: {e}")))?;

        let conn = ConnectionManager::new(client.clone())
            .await
            .map_err(|e| CoreError::Unavailable(format!("failed to connect to Redis: {e}")))?;

        info!("connected to Redis");
        Ok(Self { client, conn })
    }
}

#[async_trait]
impl EventBus for RedisEventBus {
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(channel, payload)
            .await
            .map_err(|e| CoreError::Unavailable(format!("Redis PUBLISH failed: {e}")))
    }

    async fn subscribe(&self, channel: &str) -> Result<EventStream> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| CoreError::Unavailable(format!("failed to open Redis pub/sub: {e}")))?;

        pubsub
            .subscribe(channel)
            .await
            .map_err(|e| CoreError::Unavailable(format!("Redis SUBSCRIBE failed: {e}")))?;

        let stream = pubsub
            .into_on_message()
            .map(|message| message.get_payload_bytes().to_vec());

        Ok(Box::pin(stream))
    }
}
