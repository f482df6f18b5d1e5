//! Response cache store.
//!
//! [`CacheStore`] never fails a caller. Every operation is bounded by a
//! command timeout and collapses to "absent" or `false` when the backend is
//! unreachable. Connectivity is tracked by a small state machine:
//!
//! ```text
//! Connecting --ok--> Ready --error--> Down --reconnect ok--> Ready
//!     |                                 |
//!     +--retries exhausted--> Abandoned <+--retries exhausted
//! ```
//!
//! Only `Ready` serves operations. `Abandoned` is terminal: the process keeps
//! running with caching disabled.

pub mod keys;
pub mod memory;
pub mod redis_backend;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use crate::error::Result;

pub use keys::CacheKeys;
pub use memory::MemoryCacheBackend;
pub use redis_backend::RedisCacheBackend;

/// Raw string key/value backend. Errors are reported, never absorbed; the
/// store decides what an error means for availability.
#[async_trait]
pub trait CacheBackend: Send + Sync + fmt::Debug {
    /// Establish, or re-establish, the connection.
    async fn connect(&self) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<bool>;
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub default_ttl: Duration,
    pub command_timeout: Duration,
    pub connect_timeout: Duration,
    /// Reconnect attempts after the first failure before giving up.
    pub connect_retries: u32,
    pub backoff_step: Duration,
    pub backoff_cap: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600),
            command_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(1),
            connect_retries: 3,
            backoff_step: Duration::from_millis(200),
            backoff_cap: Duration::from_secs(1),
        }
    }
}

impl CacheSettings {
    /// Linear backoff, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_step.saturating_mul(attempt).min(self.backoff_cap)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HealthState {
    Connecting = 0,
    Ready = 1,
    Down = 2,
    Abandoned = 3,
}

impl HealthState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => HealthState::Connecting,
            1 => HealthState::Ready,
            2 => HealthState::Down,
            _ => HealthState::Abandoned,
        }
    }
}

struct CacheInner {
    backend: Option<Arc<dyn CacheBackend>>,
    settings: CacheSettings,
    state: AtomicU8,
    reconnecting: AtomicBool,
}

#[derive(Clone)]
pub struct CacheStore {
    inner: Arc<CacheInner>,
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("backend", &self.inner.backend)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl CacheStore {
    /// A store with no backend. Every read misses and every write is refused.
    pub fn disabled() -> Self {
        Self::build(None, CacheSettings::default(), HealthState::Abandoned)
    }

    /// Connect `backend` with bounded retries. Never fails: if the backend
    /// cannot be reached the returned store is abandoned and caching is off.
    pub async fn connect(
        backend: Arc<dyn CacheBackend>,
        settings: CacheSettings,
    ) -> Self {
        let store = Self::build(Some(backend), settings, HealthState::Connecting);
        if store.try_connect_with_retries(true).await {
            info!("Cache backend connected");
        } else {
            warn!(
                retries = store.inner.settings.connect_retries,
                "Cache backend unreachable; continuing with caching disabled"
            );
        }
        store
    }

    fn build(
        backend: Option<Arc<dyn CacheBackend>>,
        settings: CacheSettings,
        state: HealthState,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                backend,
                settings,
                state: AtomicU8::new(state as u8),
                reconnecting: AtomicBool::new(false),
            }),
        }
    }

    pub fn state(&self) -> HealthState {
        HealthState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    pub fn is_available(&self) -> bool {
        self.state() == HealthState::Ready
    }

    pub fn default_ttl(&self) -> Duration {
        self.inner.settings.default_ttl
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let backend = self.ready_backend()?;
        debug!("Cache GET: {}", key);

        match tokio::time::timeout(
            self.inner.settings.command_timeout,
            backend.get(key),
        )
        .await
        {
            Ok(Ok(Some(value))) => {
                debug!("Cache HIT: {}", key);
                Some(value)
            }
            Ok(Ok(None)) => {
                debug!("Cache MISS: {}", key);
                None
            }
            Ok(Err(err)) => {
                self.mark_down(&format!("GET failed: {err}"));
                None
            }
            Err(_) => {
                self.mark_down("GET timed out");
                None
            }
        }
    }

    pub async fn set(&self, key: &str, value: String, ttl: Duration) -> bool {
        let Some(backend) = self.ready_backend() else {
            return false;
        };
        debug!("Cache SET: {} (TTL: {:?})", key, ttl);

        match tokio::time::timeout(
            self.inner.settings.command_timeout,
            backend.set(key, value, ttl),
        )
        .await
        {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                self.mark_down(&format!("SET failed: {err}"));
                false
            }
            Err(_) => {
                self.mark_down("SET timed out");
                false
            }
        }
    }

    pub async fn delete(&self, key: &str) -> bool {
        let Some(backend) = self.ready_backend() else {
            return false;
        };
        debug!("Cache DELETE: {}", key);

        match tokio::time::timeout(
            self.inner.settings.command_timeout,
            backend.delete(key),
        )
        .await
        {
            Ok(Ok(removed)) => removed,
            Ok(Err(err)) => {
                self.mark_down(&format!("DEL failed: {err}"));
                false
            }
            Err(_) => {
                self.mark_down("DEL timed out");
                false
            }
        }
    }

    pub async fn exists(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    /// Undecodable entries count as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                debug!("Cache entry {} is not valid JSON ({}); treating as miss", key, err);
                None
            }
        }
    }

    pub async fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> bool {
        let ttl = ttl.unwrap_or(self.inner.settings.default_ttl);
        match serde_json::to_string(value) {
            Ok(json) => self.set(key, json, ttl).await,
            Err(err) => {
                warn!("Failed to serialize cache value for {}: {}", key, err);
                false
            }
        }
    }

    fn ready_backend(&self) -> Option<Arc<dyn CacheBackend>> {
        if !self.is_available() {
            return None;
        }
        self.inner.backend.clone()
    }

    fn set_state(&self, state: HealthState) {
        self.inner.state.store(state as u8, Ordering::Release);
    }

    /// Ready -> Down, then reconnect in the background. Callers never wait
    /// for the reconnect.
    fn mark_down(&self, reason: &str) {
        let was_ready = self
            .inner
            .state
            .compare_exchange(
                HealthState::Ready as u8,
                HealthState::Down as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if !was_ready {
            return;
        }
        warn!(reason, "Cache backend marked unavailable");

        if self.inner.reconnecting.swap(true, Ordering::AcqRel) {
            return;
        }
        let store = self.clone();
        tokio::spawn(async move {
            store.try_connect_with_retries(false).await;
            store.inner.reconnecting.store(false, Ordering::Release);
        });
    }

    async fn try_connect_with_retries(&self, immediate_first: bool) -> bool {
        let Some(backend) = self.inner.backend.clone() else {
            self.set_state(HealthState::Abandoned);
            return false;
        };
        let settings = &self.inner.settings;

        // The initial connect gets one attempt up front; a reconnect waits
        // before its first attempt since the backend just failed.
        let first = if immediate_first { 0 } else { 1 };
        for attempt in first..=settings.connect_retries {
            if attempt > 0 {
                tokio::time::sleep(settings.backoff(attempt)).await;
            }
            match tokio::time::timeout(settings.connect_timeout, backend.connect()).await {
                Ok(Ok(())) => {
                    self.set_state(HealthState::Ready);
                    if attempt > 0 {
                        info!(attempt, "Cache backend reconnected");
                    }
                    return true;
                }
                Ok(Err(err)) => {
                    debug!(attempt, "Cache connect attempt failed: {}", err);
                }
                Err(_) => {
                    debug!(attempt, "Cache connect attempt timed out");
                }
            }
        }

        self.set_state(HealthState::Abandoned);
        warn!("Cache reconnect retries exhausted; caching disabled");
        false
    }
}
