use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use crate::{Collection, StoreError};

use super::r#trait::RecordStore;

/// SQLite-backed record store.
///
/// One `records` table keyed by `(collection, id)`; record bodies are stored
/// as JSON text. `saved_at` is bookkeeping for debugging and is never read
/// back by the store itself.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        tracing::debug!(path = %path.as_ref().display(), "opening sqlite record store");
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Ok(Self { pool })
    }

    /// Open a private in-memory database (tests/dev).
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        // One connection only: every pooled `:memory:` connection would
        // otherwise get its own empty database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    /// Resolve the default on-disk location: `{data_dir}/tillbook/tillbook.db`.
    pub fn default_db_path() -> anyhow::Result<PathBuf> {
        let base = dirs::data_dir()
            .or_else(|| {
                dirs::home_dir().map(|mut h| {
                    h.push(".local");
                    h.push("share");
                    h
                })
            })
            .context("failed to resolve OS app data directory")?;

        let mut dir = base;
        dir.push("tillbook");
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create data directory at {dir:?}"))?;

        dir.push("tillbook.db");
        Ok(dir)
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn init(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                collection TEXT NOT NULL,
                id         TEXT NOT NULL,
                data       TEXT NOT NULL,
                saved_at   TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn add(
        &self,
        collection: Collection,
        id: &str,
        value: JsonValue,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO records (collection, id, data, saved_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(collection, id) DO NOTHING
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(value.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::already_exists(collection, id));
        }
        Ok(())
    }

    async fn put(
        &self,
        collection: Collection,
        id: &str,
        value: JsonValue,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO records (collection, id, data, saved_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(collection, id)
            DO UPDATE SET
                data = excluded.data,
                saved_at = excluded.saved_at
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(value.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<JsonValue>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT data
            FROM records
            WHERE collection = ?1 AND id = ?2
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let data: String = row.try_get("data")?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    async fn get_all(&self, collection: Collection) -> Result<Vec<JsonValue>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT data
            FROM records
            WHERE collection = ?1
            "#,
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let data: String = row.try_get("data")?;
                serde_json::from_str(&data).map_err(StoreError::from)
            })
            .collect()
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            DELETE FROM records
            WHERE collection = ?1 AND id = ?2
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear(&self, collection: Collection) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            DELETE FROM records
            WHERE collection = ?1
            "#,
        )
        .bind(collection.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
