//! SQLite-backed key/value settings store.
//!
//! All database operations run in `spawn_blocking` to avoid blocking the
//! async runtime.

use std::sync::Arc;

use async_trait::async_trait;
use dealbridge_core::SettingsStore;
use dealbridge_domain::Result as DomainResult;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tokio::task;

use super::manager::{map_join_error, map_sql_error, LocalDbManager};

/// Settings persisted in the `app_settings` table
pub struct SqliteSettingsStore {
    db: Arc<LocalDbManager>,
}

impl SqliteSettingsStore {
    pub fn new(db: Arc<LocalDbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn get(&self, key: &str) -> DomainResult<Option<String>> {
        let db = Arc::clone(&self.db);
        let key = key.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<String>> {
            let conn = db.get_connection()?;
            query_value(&conn, &key).map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn set(&self, key: &str, value: &str) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let key = key.to_string();
        let value = value.to_string();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            upsert_value(&conn, &key, &value).map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn replace_prefix(
        &self,
        prefix: &str,
        entries: Vec<(String, String)>,
    ) -> DomainResult<usize> {
        let db = Arc::clone(&self.db);
        let prefix = prefix.to_string();

        task::spawn_blocking(move || -> DomainResult<usize> {
            let mut conn = db.get_connection()?;
            replace_values(&mut conn, &prefix, &entries).map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

fn query_value(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row("SELECT value FROM app_settings WHERE key = ?1", params![key], |row| {
        row.get::<_, String>(0)
    })
    .optional()
}

fn upsert_value(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    let now = chrono::Utc::now().timestamp();
    conn.execute(
        "INSERT INTO app_settings (key, value, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at",
        params![key, value, now],
    )?;
    Ok(())
}

fn replace_values(
    conn: &mut Connection,
    prefix: &str,
    entries: &[(String, String)],
) -> rusqlite::Result<usize> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    // substr instead of LIKE: keys contain '_' which LIKE treats as a wildcard
    let removed = tx.execute(
        "DELETE FROM app_settings WHERE substr(key, 1, length(?1)) = ?1",
        params![prefix],
    )?;
    for (key, value) in entries {
        upsert_value(&tx, key, value)?;
    }
    tx.commit()?;
    Ok(removed)
}
