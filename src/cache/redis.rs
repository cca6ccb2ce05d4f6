//! Redis backend over a multiplexed `ConnectionManager`.

use ::redis::{
    aio::ConnectionManager, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo,
};
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, instrument};

use super::{ttl_millis, BoxFuture, CacheBackend, CacheConfig, CacheEndpoint, StagedDel, StagedSet};

/// Redis backend. `ConnectionManager` reconnects on its own and is cheap to clone,
/// so every call works on its own handle.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    /// Open a managed connection to the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is invalid or unreachable.
    #[instrument(skip(config), fields(cache = %config))]
    pub async fn connect(config: &CacheConfig) -> Result<Self> {
        let client = Client::open(connection_info(config)?)
            .with_context(|| format!("invalid cache configuration: {config}"))?;
        let connection = ConnectionManager::new(client)
            .await
            .with_context(|| format!("failed to connect to cache at {config}"))?;
        debug!("cache connection established");
        Ok(Self { connection })
    }
}

fn connection_info(config: &CacheConfig) -> Result<ConnectionInfo> {
    match config.endpoint() {
        CacheEndpoint::Url(url) => {
            ::redis::IntoConnectionInfo::into_connection_info(url.as_str())
                .context("invalid cache URL")
        }
        CacheEndpoint::Address { host, port } => Ok(ConnectionInfo {
            addr: ConnectionAddr::Tcp(host.clone(), *port),
            redis: RedisConnectionInfo::default(),
        }),
    }
}

impl CacheBackend for RedisCache {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>>> {
        Box::pin(async move {
            let mut connection = self.connection.clone();
            let value: Option<String> = ::redis::cmd("GET")
                .arg(key)
                .query_async(&mut connection)
                .await
                .with_context(|| format!("cache GET {key} failed"))?;
            Ok(value)
        })
    }

    fn set<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
        ttl: Duration,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut connection = self.connection.clone();
            let _: () = ::redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("PX")
                .arg(ttl_millis(ttl))
                .query_async(&mut connection)
                .await
                .with_context(|| format!("cache SET {key} failed"))?;
            Ok(())
        })
    }

    fn del<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut connection = self.connection.clone();
            let _: i64 = ::redis::cmd("DEL")
                .arg(key)
                .query_async(&mut connection)
                .await
                .with_context(|| format!("cache DEL {key} failed"))?;
            Ok(())
        })
    }

    fn get_del<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>>> {
        Box::pin(async move {
            let mut connection = self.connection.clone();
            let value: Option<String> = ::redis::cmd("GETDEL")
                .arg(key)
                .query_async(&mut connection)
                .await
                .with_context(|| format!("cache GETDEL {key} failed"))?;
            Ok(value)
        })
    }

    // KEYS walks the whole keyspace; it backs operator listings, not request paths.
    fn keys<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, Result<Vec<String>>> {
        Box::pin(async move {
            let mut connection = self.connection.clone();
            let mut keys: Vec<String> = ::redis::cmd("KEYS")
                .arg(format!("{prefix}*"))
                .query_async(&mut connection)
                .await
                .with_context(|| format!("cache KEYS {prefix}* failed"))?;
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
            let mut pipe = ::redis::pipe();
            pipe.atomic();
            for set in sets {
                pipe.cmd("SET")
                    .arg(&set.key)
                    .arg(&set.value)
                    .arg("PX")
                    .arg(ttl_millis(set.ttl))
                    .ignore();
            }
            for del in dels {
                pipe.cmd("DEL").arg(&del.key).ignore();
            }

            let mut connection = self.connection.clone();
            let _: () = pipe
                .query_async(&mut connection)
                .await
                .context("cache transaction failed")?;
            debug!(sets = sets.len(), dels = dels.len(), "cache transaction committed");
            Ok(())
        })
    }
}
