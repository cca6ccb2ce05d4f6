//! Typed, prefix-namespaced view over a `CacheBackend`.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::{marker::PhantomData, sync::Arc, time::Duration};

use super::{CacheBackend, StagedDel, StagedSet};
use crate::error::{Error, Result};

/// A value object that lives in the cache under `<PREFIX>:<key_id>`.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const PREFIX: &'static str;
    /// Used in not-found and validation messages.
    const NAME: &'static str;

    fn key_id(&self) -> String;
    fn issued_at(&self) -> DateTime<Utc>;
    fn expires_at(&self) -> DateTime<Utc>;

    /// # Errors
    ///
    /// Returns `Validation` if the entity expires at or before it was issued.
    fn validate(&self) -> Result<()> {
        if self.expires_at() <= self.issued_at() {
            return Err(Error::validation(format!(
                "{} must expire after it is issued",
                Self::NAME
            )));
        }
        Ok(())
    }

    /// Cache lifetime: the full issued-to-expiry window.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the window is empty or does not fit a `Duration`.
    fn ttl(&self) -> Result<Duration> {
        self.validate()?;
        (self.expires_at() - self.issued_at())
            .to_std()
            .map_err(|_| Error::validation(format!("{} lifetime out of range", Self::NAME)))
    }
}

pub struct Store<T> {
    backend: Arc<dyn CacheBackend>,
    entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            entity: PhantomData,
        }
    }
}

impl<T: Entity> Store<T> {
    #[must_use]
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            entity: PhantomData,
        }
    }

    #[must_use]
    pub fn key(id: &str) -> String {
        format!("{}:{id}", T::PREFIX)
    }

    /// # Errors
    ///
    /// `NotFound` if the key is absent or expired, `Unknown` on backend or decode
    /// failures, `Validation` if the stored entity is inconsistent.
    pub async fn get(&self, id: &str) -> Result<T> {
        let raw = self.backend.get(&Self::key(id)).await?;
        decode(raw)
    }

    /// # Errors
    ///
    /// `Validation` if the entity has no positive lifetime, `Unknown` on backend
    /// failures.
    pub async fn set(&self, entity: &T) -> Result<()> {
        let staged = self.create_set_cmd(entity)?;
        self.backend
            .set(&staged.key, &staged.value, staged.ttl)
            .await?;
        Ok(())
    }

    /// Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// `Unknown` on backend failures.
    pub async fn del(&self, id: &str) -> Result<()> {
        self.backend.del(&Self::key(id)).await?;
        Ok(())
    }

    /// Read and remove in one backend round trip.
    ///
    /// # Errors
    ///
    /// Same as [`Store::get`].
    pub async fn get_del(&self, id: &str) -> Result<T> {
        let raw = self.backend.get_del(&Self::key(id)).await?;
        decode(raw)
    }

    /// Keys of every live entity in this store, with or without the `<prefix>:` part.
    ///
    /// # Errors
    ///
    /// `Unknown` on backend failures.
    pub async fn keys(&self, with_prefix: bool) -> Result<Vec<String>> {
        let prefix = Self::key("");
        let keys = self.backend.keys(&prefix).await?;
        if with_prefix {
            return Ok(keys);
        }
        Ok(keys
            .into_iter()
            .filter_map(|key| key.strip_prefix(&prefix).map(ToString::to_string))
            .collect())
    }

    /// # Errors
    ///
    /// `Validation` if the entity has no positive lifetime, `Unknown` if it cannot be
    /// serialized.
    pub fn create_set_cmd(&self, entity: &T) -> Result<StagedSet> {
        let ttl = entity.ttl()?;
        let value = serde_json::to_string(entity)
            .with_context(|| format!("failed to encode {}", T::NAME))?;
        Ok(StagedSet {
            key: Self::key(&entity.key_id()),
            value,
            ttl,
        })
    }

    #[must_use]
    pub fn create_del_cmd(&self, id: &str) -> StagedDel {
        StagedDel { key: Self::key(id) }
    }
}

fn decode<T: Entity>(raw: Option<String>) -> Result<T> {
    let raw = raw.ok_or(Error::NotFound(T::NAME))?;
    let entity: T = serde_json::from_str(&raw)
        .with_context(|| format!("failed to decode cached {}", T::NAME))?;
    entity.validate()?;
    Ok(entity)
}
