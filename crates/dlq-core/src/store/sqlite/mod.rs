//! SQLite-backed item store (sqlx).
//!
//! The database file lives under the XDG state directory:
//! `~/.local/state/dlq/items.db` on Debian.

mod read;
mod write;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::{Path, PathBuf};

use super::{ItemStore, StoreResult};
use crate::item::{DownloadItem, ItemDraft, ItemId};

/// Percent-encode a path for use in a sqlite:// URI so spaces and special chars don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

/// Default database location: `~/.local/state/dlq/items.db`.
pub fn default_db_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dlq")?;
    Ok(xdg_dirs.get_state_home().join("items.db"))
}

/// Handle to the item database. Cloning shares the connection pool.
#[derive(Clone)]
pub struct SqliteItemStore {
    pub(crate) pool: Pool<Sqlite>,
}

impl SqliteItemStore {
    /// Open (or create) the default item database and run migrations.
    pub async fn open_default() -> Result<Self> {
        Self::open_at(default_db_path()?).await
    }

    /// Open (or create) the database at a specific path. Creates parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect(&uri)
            .await?;
        let store = SqliteItemStore { pool };
        store.migrate().await?;
        tracing::debug!("opened item store at {}", path.display());
        Ok(store)
    }

    /// Open a private in-memory database (no disk I/O).
    pub async fn open_memory() -> Result<Self> {
        // Every connection to `sqlite::memory:` is its own database, so pin the pool to one.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let store = SqliteItemStore { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        // One row per item; statuses, kinds and failure kinds are lowercase strings.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_ref TEXT NOT NULL,
                url TEXT NOT NULL,
                title TEXT NOT NULL,
                kind TEXT NOT NULL,
                file_name TEXT NOT NULL,
                status TEXT NOT NULL,
                priority INTEGER NOT NULL DEFAULT 0,
                total_bytes INTEGER NOT NULL DEFAULT 0,
                transferred_bytes INTEGER NOT NULL DEFAULT 0,
                local_path TEXT,
                error_kind TEXT,
                error_message TEXT,
                created_at INTEGER NOT NULL,
                started_at INTEGER,
                completed_at INTEGER,
                updated_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE UNIQUE INDEX IF NOT EXISTS items_source_ref ON items (source_ref)"#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ItemStore for SqliteItemStore {
    async fn insert(&self, draft: &ItemDraft) -> StoreResult<DownloadItem> {
        self.insert_item(draft).await
    }

    async fn update(&self, item: &DownloadItem) -> StoreResult<()> {
        self.update_item(item).await
    }

    async fn delete(&self, id: ItemId) -> StoreResult<()> {
        self.delete_item(id).await
    }

    async fn get(&self, id: ItemId) -> StoreResult<Option<DownloadItem>> {
        self.get_item(id).await
    }

    async fn list_all(&self) -> StoreResult<Vec<DownloadItem>> {
        self.list_items().await
    }
}
