//! PostgreSQL persistence for congregation-service.
//!
//! One `impl Database` block per area. Every query is parameterized; multi-row
//! writes run inside a transaction.

mod congregations;
mod courses;
mod events;
mod feed;
mod invites;
mod livestreams;
mod memberships;
mod notifications;
mod sermons;
mod users;

pub use invites::RedeemResult;

use service_core::error::AppError;
use sqlx::postgres::PgPool;

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database wrapper from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Health check - ping the database.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!("Database health check failed: {}", e))
            })?;
        Ok(())
    }
}
