//! In-process backend with per-key expiry.

use anyhow::Result;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::{BoxFuture, CacheBackend, StagedDel, StagedSet};

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process backend. Expired entries are dropped lazily, and a commit holds the
/// lock for the whole batch.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn insert(entries: &mut HashMap<String, Entry>, key: &str, value: &str, ttl: Duration) {
    let now = Instant::now();
    entries.retain(|_, entry| entry.live(now));
    entries.insert(
        key.to_string(),
        Entry {
            value: value.to_string(),
            expires_at: now + ttl,
        },
    );
}

impl CacheBackend for MemoryCache {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>>> {
        Box::pin(async move {
            let entries = self.entries.lock().await;
            let now = Instant::now();
            Ok(entries
                .get(key)
                .filter(|entry| entry.live(now))
                .map(|entry| entry.value.clone()))
        })
    }

    fn set<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
        ttl: Duration,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut entries = self.entries.lock().await;
            insert(&mut entries, key, value, ttl);
            Ok(())
        })
    }

    fn del<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.entries.lock().await.remove(key);
            Ok(())
        })
    }

    fn get_del<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>>> {
        Box::pin(async move {
            let mut entries = self.entries.lock().await;
            let now = Instant::now();
            Ok(entries
                .remove(key)
                .filter(|entry| entry.live(now))
                .map(|entry| entry.value))
        })
    }

    fn keys<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, Result<Vec<String>>> {
        Box::pin(async move {
            let entries = self.entries.lock().await;
            let now = Instant::now();
            let mut keys: Vec<String> = entries
                .iter()
                .filter(|(key, entry)| key.starts_with(prefix) && entry.live(now))
                .map(|(key, _)| key.clone())
                .collect();
            keys.sort();
            Ok(keys)
        })
    }

    fn commit<'a>(
        &'a self,
        sets: &'a [StagedSet],
        dels: &'a [StagedDel],
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut entries = self.entries.lock().await;
            for set in sets {
                insert(&mut entries, &set.key, &set.value, set.ttl);
            }
            for del in dels {
                entries.remove(&del.key);
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entries_expire() -> Result<()> {
        let cache = MemoryCache::new();
        cache.set("k", "v", Duration::from_millis(20)).await?;
        assert_eq!(cache.get("k").await?.as_deref(), Some("v"));

        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(cache.get("k").await?, None);
        assert_eq!(cache.get_del("k").await?, None);
        assert!(cache.keys("").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn set_overwrites_and_get_del_removes() -> Result<()> {
        let cache = MemoryCache::new();
        cache.set("k", "first", Duration::from_secs(60)).await?;
        cache.set("k", "second", Duration::from_secs(60)).await?;

        assert_eq!(cache.get_del("k").await?.as_deref(), Some("second"));
        assert_eq!(cache.get("k").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn keys_filter_by_prefix() -> Result<()> {
        let cache = MemoryCache::new();
        cache.set("session:b", "1", Duration::from_secs(60)).await?;
        cache.set("session:a", "1", Duration::from_secs(60)).await?;
        cache.set("auth:a", "1", Duration::from_secs(60)).await?;

        assert_eq!(
            cache.keys("session:").await?,
            vec!["session:a".to_string(), "session:b".to_string()]
        );
        Ok(())
    }
}
