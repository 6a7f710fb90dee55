//! Session revocation store, keyed by token `jti`.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[async_trait]
pub trait TokenRevocation: Send + Sync {
    /// Revoke `token_jti` for `expiry_seconds` (the token's remaining lifetime).
    async fn revoke(&self, token_jti: &str, expiry_seconds: i64) -> Result<(), anyhow::Error>;
    async fn is_revoked(&self, token_jti: &str) -> Result<bool, anyhow::Error>;
    async fn health_check(&self) -> Result<(), anyhow::Error>;
}

fn revocation_key(token_jti: &str) -> String {
    format!("revoked:{}", token_jti)
}

#[derive(Clone)]
pub struct RedisRevocationStore {
    _client: Client,
    manager: ConnectionManager,
}

impl RedisRevocationStore {
    pub async fn new(config: &crate::config::RedisConfig) -> Result<Self, anyhow::Error> {
        tracing::info!("Connecting to Redis");
        let client = Client::open(config.url.clone())?;

        // Use ConnectionManager for automatic reconnection
        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to get Redis connection manager: {}", e);
            anyhow::anyhow!("Failed to connect to Redis: {}", e)
        })?;

        tracing::info!("Successfully connected to Redis");

        Ok(Self {
            _client: client,
            manager,
        })
    }
}

#[async_trait]
impl TokenRevocation for RedisRevocationStore {
    async fn revoke(&self, token_jti: &str, expiry_seconds: i64) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();

        redis::cmd("SET")
            .arg(revocation_key(token_jti))
            .arg("revoked")
            .arg("EX")
            .arg(expiry_seconds.max(1))
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to revoke token: {}", e))
    }

    async fn is_revoked(&self, token_jti: &str) -> Result<bool, anyhow::Error> {
        let mut conn = self.manager.clone();

        let exists: bool = redis::cmd("EXISTS")
            .arg(revocation_key(token_jti))
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to check revocation: {}", e))?;

        Ok(exists)
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Redis health check failed: {}", e))
    }
}

/// Process-local store for development and tests.
#[derive(Default)]
pub struct InMemoryRevocationStore {
    revoked: Mutex<HashMap<String, Instant>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenRevocation for InMemoryRevocationStore {
    async fn revoke(&self, token_jti: &str, expiry_seconds: i64) -> Result<(), anyhow::Error> {
        let until = Instant::now() + Duration::from_secs(expiry_seconds.max(1) as u64);
        let mut revoked = self
            .revoked
            .lock()
            .map_err(|e| anyhow::anyhow!("Revocation store mutex poisoned: {}", e))?;

        let now = Instant::now();
        revoked.retain(|_, expiry| *expiry > now);
        revoked.insert(revocation_key(token_jti), until);
        Ok(())
    }

    async fn is_revoked(&self, token_jti: &str) -> Result<bool, anyhow::Error> {
        let revoked = self
            .revoked
            .lock()
            .map_err(|e| anyhow::anyhow!("Revocation store mutex poisoned: {}", e))?;

        Ok(revoked
            .get(&revocation_key(token_jti))
            .is_some_and(|expiry| *expiry > Instant::now()))
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}
