use async_trait::async_trait;
use redis::{aio::ConnectionManager, RedisError};
use std::{future::Future, time::Duration};

use crate::cache::store::{CacheBackend, StoreError};

/// Redis backend over a multiplexed, auto-reconnecting connection.
///
/// Every command runs under `command_timeout` so a stalled server degrades to cache
/// misses instead of stalling requests.
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
    command_timeout: Duration,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend").field("command_timeout", &self.command_timeout).finish()
    }
}

impl From<RedisError> for StoreError {
    fn from(e: RedisError) -> Self {
        if e.is_connection_refusal() || e.is_connection_dropped() || e.is_io_error() {
            Self::Unavailable(e.to_string())
        } else {
            Self::Command(e.to_string())
        }
    }
}

impl RedisBackend {
    /// Opens a connection and checks it with `PING`, both under `connect_timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the URL is invalid, the server is unreachable, or it
    /// does not answer in time.
    pub async fn connect(
        url: &str,
        connect_timeout: Duration,
        command_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;

        let mut conn = tokio::time::timeout(connect_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| StoreError::Timeout(connect_timeout))??;

        let pong: String = tokio::time::timeout(
            connect_timeout,
            redis::cmd("PING").query_async(&mut conn),
        )
        .await
        .map_err(|_| StoreError::Timeout(connect_timeout))??;
        tracing::debug!(reply = %pong, "redis ping succeeded");

        Ok(Self { conn, command_timeout })
    }

    async fn run<T>(
        &self,
        fut: impl Future<Output = Result<T, RedisError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.command_timeout, fut)
            .await
            .map_err(|_| StoreError::Timeout(self.command_timeout))?
            .map_err(StoreError::from)
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        self.run(async move {
            let value: Option<String> = cmd.query_async(&mut conn).await?;
            Ok(value)
        })
        .await
    }

    async fn set_ex(&self, key: &str, value: String, ttl_seconds: u64) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value).arg("EX").arg(ttl_seconds);
        self.run(async move {
            let () = cmd.query_async(&mut conn).await?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("DEL");
        cmd.arg(key);
        self.run(async move {
            let _removed: i64 = cmd.query_async(&mut conn).await?;
            Ok(())
        })
        .await
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("MGET");
        cmd.arg(keys);
        self.run(async move {
            let values: Vec<Option<String>> = cmd.query_async(&mut conn).await?;
            Ok(values)
        })
        .await
    }
}
