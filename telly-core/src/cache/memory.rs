use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use super::CacheBackend;
use crate::error::{CatalogError, Result};

/// In-process backend with TTL expiry. Used for tests and single-node
/// development; `set_offline` simulates an outage.
#[derive(Debug, Default)]
pub struct MemoryCacheBackend {
    entries: DashMap<String, (String, Instant)>,
    offline: AtomicBool,
    connect_attempts: AtomicUsize,
}

impl MemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Release);
    }

    pub fn connect_attempts(&self) -> usize {
        self.connect_attempts.load(Ordering::Acquire)
    }

    /// Live entries, ignoring the offline switch.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.value().1 > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.value().1 > Instant::now())
    }

    fn check(&self) -> Result<()> {
        if self.offline.load(Ordering::Acquire) {
            return Err(CatalogError::CacheUnavailable(
                "memory backend offline".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn connect(&self) -> Result<()> {
        self.connect_attempts.fetch_add(1, Ordering::AcqRel);
        self.check()
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check()?;
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.value().1 > now => {
                return Ok(Some(entry.value().0.clone()));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        self.check()?;
        self.entries
            .insert(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.check()?;
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, (_, expires))| expires > Instant::now()))
    }
}
