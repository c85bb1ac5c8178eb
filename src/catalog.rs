//! Persisted catalog of materialized workspaces.
//!
//! One row per problem id. [`CatalogStore::save_or_update`] inserts a new row
//! or overwrites title, url, path and timestamp of the existing one; rows
//! are never deleted here.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::path::Path;

use crate::db;
use crate::error::IngestError;
use crate::migrate;
use crate::models::CatalogEntry;

/// Storage for [`CatalogEntry`] records, keyed by id.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert `entry`, or overwrite the stored entry with the same id.
    async fn save_or_update(&self, entry: &CatalogEntry) -> Result<(), IngestError>;

    async fn get(&self, id: &str) -> Result<Option<CatalogEntry>, IngestError>;

    /// All entries, most recently ingested first.
    async fn list(&self) -> Result<Vec<CatalogEntry>, IngestError>;
}

/// SQLite-backed catalog.
#[derive(Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    /// Open the database at `db_path`, creating the schema if needed.
    pub async fn open(db_path: &Path) -> Result<Self, IngestError> {
        let pool = db::connect_path(db_path).await?;
        migrate::create_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn save_or_update(&self, entry: &CatalogEntry) -> Result<(), IngestError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO workspaces (id, title, url, workspace_path, timestamp)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                url = excluded.url,
                workspace_path = excluded.workspace_path,
                timestamp = excluded.timestamp
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.title)
        .bind(&entry.url)
        .bind(&entry.workspace_path)
        .bind(format_timestamp(&entry.timestamp))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<CatalogEntry>, IngestError> {
        let row = sqlx::query(
            "SELECT id, title, url, workspace_path, timestamp FROM workspaces WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_entry).transpose()
    }

    async fn list(&self) -> Result<Vec<CatalogEntry>, IngestError> {
        let rows = sqlx::query(
            "SELECT id, title, url, workspace_path, timestamp FROM workspaces \
             ORDER BY timestamp DESC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }
}

/// Fixed-width RFC 3339 so lexical order matches time order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn row_to_entry(row: &SqliteRow) -> Result<CatalogEntry, IngestError> {
    let raw_ts: String = row.try_get("timestamp")?;
    let timestamp = DateTime::parse_from_rfc3339(&raw_ts)
        .map_err(|e| IngestError::Persistence(format!("bad timestamp '{}': {}", raw_ts, e)))?
        .with_timezone(&Utc);

    Ok(CatalogEntry {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        url: row.try_get("url")?,
        workspace_path: row.try_get("workspace_path")?,
        timestamp,
    })
}
