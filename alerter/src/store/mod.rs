//! Persisted state store
//!
//! A small hash/key store on top of SQLite. Hash buckets hold the per-node and
//! per-system snapshots, plain keys hold monitor cursors and liveness stamps.
//! Every bucket and key is prefixed with the alerter's unique identifier so
//! several alerters can share one database file.

pub mod keys;

use anyhow::Result;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fields of one hash bucket captured for a later write
#[derive(Debug, Clone, PartialEq)]
pub struct HashUpdate {
    pub bucket: String,
    pub fields: Vec<(String, Option<String>)>,
}

pub struct Store {
    pool: SqlitePool,
    namespace: String,
}

impl Store {
    pub async fn new(database_path: &str, namespace: &str) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", database_path))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        let store = Self {
            pool,
            namespace: namespace.to_string(),
        };
        store.initialize_tables().await?;

        info!("Store initialized at {}", database_path);
        Ok(store)
    }

    /// Single-connection in-memory store, used by tests
    pub async fn in_memory(namespace: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let store = Self {
            pool,
            namespace: namespace.to_string(),
        };
        store.initialize_tables().await?;
        Ok(store)
    }

    async fn initialize_tables(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_hash (
                bucket TEXT NOT NULL,
                field TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (bucket, field)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at INTEGER
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("Store tables initialized");
        Ok(())
    }

    fn namespaced(&self, name: &str) -> String {
        format!("{}:{}", self.namespace, name)
    }

    pub async fn hget(&self, bucket: &str, field: &str) -> Result<Option<String>, sqlx::Error> {
        let row = sqlx::query("SELECT value FROM kv_hash WHERE bucket = ? AND field = ?")
            .bind(self.namespaced(bucket))
            .bind(field)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    /// Reads and parses a field; unparsable values read as absent
    pub async fn hget_parsed<T: FromStr>(
        &self,
        bucket: &str,
        field: &str,
    ) -> Result<Option<T>, sqlx::Error> {
        let Some(raw) = self.hget(bucket, field).await? else {
            return Ok(None);
        };

        match raw.parse::<T>() {
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                warn!("Stored value '{}' for {} in {} could not be parsed", raw, field, bucket);
                Ok(None)
            }
        }
    }

    pub async fn hget_bool(&self, bucket: &str, field: &str) -> Result<Option<bool>, sqlx::Error> {
        let raw = self.hget(bucket, field).await?;
        Ok(raw.and_then(|v| parse_bool(&v)))
    }

    /// Writes several fields at once; a `None` value removes the field
    pub async fn hset_multiple(
        &self,
        bucket: &str,
        fields: &[(String, Option<String>)],
    ) -> Result<(), sqlx::Error> {
        let bucket = self.namespaced(bucket);
        let mut tx = self.pool.begin().await?;

        for (field, value) in fields {
            match value {
                Some(value) => {
                    sqlx::query(
                        "INSERT INTO kv_hash (bucket, field, value) VALUES (?, ?, ?)
                         ON CONFLICT(bucket, field) DO UPDATE SET value = excluded.value",
                    )
                    .bind(&bucket)
                    .bind(field)
                    .bind(value)
                    .execute(&mut *tx)
                    .await?;
                }
                None => {
                    sqlx::query("DELETE FROM kv_hash WHERE bucket = ? AND field = ?")
                        .bind(&bucket)
                        .bind(field)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await
    }

    pub async fn apply(&self, update: &HashUpdate) -> Result<(), sqlx::Error> {
        self.hset_multiple(&update.bucket, &update.fields).await
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT value FROM kv WHERE key = ? AND (expires_at IS NULL OR expires_at > ?)",
        )
        .bind(self.namespaced(key))
        .bind(Utc::now().timestamp_millis())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    pub async fn get_int(&self, key: &str) -> Result<Option<i64>, sqlx::Error> {
        let raw = self.get(key).await?;
        Ok(raw.and_then(|v| v.parse::<i64>().ok()))
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        self.upsert(key, value, None).await
    }

    /// Stores a key that reads as absent once `ttl` has elapsed
    pub async fn set_for(&self, key: &str, value: &str, ttl: Duration) -> Result<(), sqlx::Error> {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = Utc::now().timestamp_millis().saturating_add(ttl_ms);
        self.upsert(key, value, Some(expires_at)).await
    }

    pub async fn exists(&self, key: &str) -> Result<bool, sqlx::Error> {
        Ok(self.get(key).await?.is_some())
    }

    pub async fn remove(&self, key: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(self.namespaced(key))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn upsert(&self, key: &str, value: &str, expires_at: Option<i64>) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO kv (key, value, expires_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
        )
        .bind(self.namespaced(key))
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
