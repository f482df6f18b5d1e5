use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use tokio::sync::RwLock;
use tracing::info;

use super::CacheBackend;
use crate::error::{CatalogError, Result};

pub struct RedisCacheBackend {
    client: redis::Client,
    conn: RwLock<Option<ConnectionManager>>,
}

impl fmt::Debug for RedisCacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCacheBackend")
            .field("connection", &"ConnectionManager")
            .finish()
    }
}

impl RedisCacheBackend {
    /// Validates the URL only; the connection is opened by `connect`.
    pub fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).map_err(|e| {
            CatalogError::CacheUnavailable(format!("Failed to create Redis client: {e}"))
        })?;
        Ok(Self {
            client,
            conn: RwLock::new(None),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        self.conn.read().await.clone().ok_or_else(|| {
            CatalogError::CacheUnavailable("Redis connection not established".into())
        })
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn connect(&self) -> Result<()> {
        let mut guard = self.conn.write().await;
        let mut conn = match guard.as_ref() {
            Some(existing) => existing.clone(),
            None => {
                info!("Connecting to Redis cache");
                ConnectionManager::new(self.client.clone()).await.map_err(|e| {
                    CatalogError::CacheUnavailable(format!("Failed to connect to Redis: {e}"))
                })?
            }
        };

        redis::cmd("PING")
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| CatalogError::CacheUnavailable(format!("Redis PING failed: {e}")))?;

        *guard = Some(conn);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(|e| CatalogError::CacheUnavailable(format!("Redis GET failed: {e}")))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
            .await
            .map_err(|e| CatalogError::CacheUnavailable(format!("Redis SETEX failed: {e}")))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        let removed: i64 = conn
            .del(key)
            .await
            .map_err(|e| CatalogError::CacheUnavailable(format!("Redis DEL failed: {e}")))?;
        Ok(removed > 0)
    }
}
