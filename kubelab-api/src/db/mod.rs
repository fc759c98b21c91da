///! Database layer using SQLite
///!
///! Persistent storage for accounts, workload records and groups.

pub mod groups;
pub mod migrations;
pub mod pods;
pub mod users;

use kubelab_common::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Database connection pool
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    ///
    /// In-memory URLs get a single long-lived connection, since every new
    /// connection would otherwise open an empty database.
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let in_memory = database_url.contains(":memory:");

        if !in_memory {
            if let Some(path) = database_url
                .strip_prefix("sqlite://")
                .map(|p| p.split('?').next().unwrap_or(p))
            {
                if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        kubelab_common::Error::System(format!("Failed to create DB directory: {}", e))
                    })?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| kubelab_common::Error::InvalidConfig(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| kubelab_common::Error::System(format!("Database connection failed: {}", e)))?;

        tracing::info!("Database connection established");

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        migrations::run_migrations(&self.pool).await?;
        tracing::info!("Database migrations completed");
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database connection closed");
    }
}

/// True when the statement failed on a UNIQUE constraint
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}

/// Encode a port list for storage (`"80,8080"`)
pub fn encode_ports(ports: &[i32]) -> String {
    ports
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode a stored port list, skipping anything unparseable
pub fn decode_ports(raw: &str) -> Vec<i32> {
    raw.split(',')
        .filter_map(|p| p.trim().parse().ok())
        .collect()
}

#[cfg(test)]
pub(crate) async fn test_database() -> Database {
    let db = Database::new("sqlite::memory:", 1).await.unwrap();
    db.migrate().await.unwrap();
    db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = test_database().await;
        db.migrate().await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM migrations")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count as usize, migrations::MIGRATIONS.len());
    }

    #[test]
    fn test_port_encoding() {
        assert_eq!(encode_ports(&[80, 8080]), "80,8080");
        assert_eq!(decode_ports("80,8080"), vec![80, 8080]);
        assert_eq!(decode_ports(""), Vec::<i32>::new());
        assert_eq!(decode_ports("80,,x,443"), vec![80, 443]);
    }
}
