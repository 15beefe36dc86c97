//! Database connection management

pub mod schema;

use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ApiError;

/// Decode an exact-decimal TEXT column.
pub fn decimal_column(row: &sqlx::sqlite::SqliteRow, name: &str) -> Result<Decimal, ApiError> {
    let raw: String = row.get(name);
    Decimal::from_str(&raw)
        .map_err(|e| ApiError::internal(format!("corrupt decimal in column {name}: {e}")))
}

/// SQLite database connection pool
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection pool and ensure the schema exists
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        schema::init_schema(&pool).await?;

        tracing::info!("SQLite connection pool established");
        Ok(Self { pool })
    }

    /// In-memory database for tests. A single connection keeps every
    /// handle on the same `:memory:` store.
    pub async fn connect_in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        schema::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_in_memory_and_health() {
        let db = Database::connect_in_memory().await.expect("connect");
        db.health_check().await.expect("health check");
    }
}
