//! Valkey/Redis cache store.
//!
//! One lazily opened multiplexed connection is shared by all commands. A
//! failed command always drops the connection. `GET` and `DEL` are then
//! tried once more on a fresh one; `SETEX` is not, since a failed cache
//! refresh is reported and left to expire.

use std::sync::Arc;
use std::time::Duration;

use parley_core::chat::cache::CacheStore;
use parley_types::error::CacheError;
use redis::FromRedisValue;
use redis::aio::MultiplexedConnection;
use tokio::sync::Mutex;
use tracing::warn;

/// The commands this store issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Get,
    SetEx,
    Del,
}

impl Command {
    fn name(self) -> &'static str {
        match self {
            Command::Get => "get",
            Command::SetEx => "setex",
            Command::Del => "del",
        }
    }

    fn attempts(self) -> usize {
        match self {
            Command::SetEx => 1,
            Command::Get | Command::Del => 2,
        }
    }
}

/// `CacheStore` backed by `GET` / `SETEX` / `DEL`.
#[derive(Debug, Clone)]
pub struct ValkeyCacheStore {
    client: redis::Client,
    connection: Arc<Mutex<Option<MultiplexedConnection>>>,
}

impl ValkeyCacheStore {
    /// Parse `url` (e.g. `redis://localhost:6379`). No connection is opened
    /// until the first command.
    pub fn new(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheError::Unavailable(format!("invalid valkey url: {e}")))?;
        Ok(Self {
            client,
            connection: Arc::new(Mutex::new(None)),
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        let mut guard = self.connection.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        *guard = Some(conn.clone());
        Ok(conn)
    }

    async fn reset_connection(&self) {
        *self.connection.lock().await = None;
    }

    async fn run_command<T, F>(&self, command: Command, build: F) -> Result<T, CacheError>
    where
        T: FromRedisValue + Send,
        F: Fn() -> redis::Cmd,
    {
        let operation = command.name();
        let mut last_error = None;
        for attempt in 1..=command.attempts() {
            let mut conn = self.connection().await?;
            let result: redis::RedisResult<T> = build().query_async(&mut conn).await;
            match result {
                Ok(value) => return Ok(value),
                Err(error) => {
                    warn!(
                        operation,
                        attempt,
                        error = %error,
                        "Valkey command failed, reconnecting"
                    );
                    self.reset_connection().await;
                    last_error = Some(error);
                }
            }
        }

        Err(CacheError::Command(match last_error {
            Some(e) => format!("{operation}: {e}"),
            None => format!("{operation}: no attempt made"),
        }))
    }
}

/// SETEX rejects a zero expiry.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

impl CacheStore for ValkeyCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.run_command(Command::Get, || {
            let mut cmd = redis::cmd("GET");
            cmd.arg(key);
            cmd
        })
        .await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let ttl = ttl_secs(ttl);
        self.run_command(Command::SetEx, || {
            let mut cmd = redis::cmd("SETEX");
            cmd.arg(key).arg(ttl).arg(value.as_slice());
            cmd
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let _: i64 = self
            .run_command(Command::Del, || {
                let mut cmd = redis::cmd("DEL");
                cmd.arg(key);
                cmd
            })
            .await?;
        Ok(())
    }
}
