//! Cache port.
//!
//! Every piece of auth state lives in one external key/value store with native
//! per-key expiry. `CacheBackend` is the raw port; `Store<T>` is the typed view used
//! for each entity (namespaced as `<prefix>:<id>`), and `Transaction` applies a batch
//! of staged writes and deletes as one all-or-nothing unit.
//!
//! Backends:
//! - `RedisCache`: Redis, with `MULTI`/`EXEC` for commits.
//! - `MemoryCache`: in-process map, used by tests and local runs.

mod config;
mod memory;
mod redis;
mod store;

pub use self::config::{CacheConfig, CacheEndpoint};
pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;
pub use self::store::{Entity, Store};

use anyhow::Result;
use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Raw key/value operations a backing store must provide.
///
/// Missing keys are `Ok(None)`; mapping that to a not-found error is the job of
/// `Store<T>`.
pub trait CacheBackend: Send + Sync {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>>>;

    fn set<'a>(&'a self, key: &'a str, value: &'a str, ttl: Duration)
        -> BoxFuture<'a, Result<()>>;

    fn del<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<()>>;

    /// Read and remove a key in one step.
    fn get_del<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>>>;

    /// Full keys of every live entry starting with `prefix`.
    fn keys<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, Result<Vec<String>>>;

    /// Apply all `sets`, then all `dels`, atomically.
    fn commit<'a>(
        &'a self,
        sets: &'a [StagedSet],
        dels: &'a [StagedDel],
    ) -> BoxFuture<'a, Result<()>>;
}

/// A write staged for a later `Transaction::commit`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedSet {
    pub key: String,
    pub value: String,
    pub ttl: Duration,
}

/// A delete staged for a later `Transaction::commit`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedDel {
    pub key: String,
}

/// Commits staged commands from any number of stores against one backend.
#[derive(Clone)]
pub struct Transaction {
    backend: Arc<dyn CacheBackend>,
}

impl Transaction {
    #[must_use]
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Apply every staged command or none of them.
    ///
    /// # Errors
    ///
    /// Returns `Unknown` if the backend rejects the batch.
    pub async fn commit(
        &self,
        sets: Vec<StagedSet>,
        dels: Vec<StagedDel>,
    ) -> crate::error::Result<()> {
        if sets.is_empty() && dels.is_empty() {
            return Ok(());
        }
        self.backend.commit(&sets, &dels).await?;
        Ok(())
    }
}

/// TTL in whole milliseconds, never below one so the entry always expires.
pub(crate) fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}
