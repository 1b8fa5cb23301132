use super::models::{Subscription, Toast, ToastCategory};
use super::schema::NOTIFICATIONS_VERSIONED_SCHEMAS;
use super::NotificationStore;
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// SQLite-backed notification store.
///
/// A single connection behind a mutex serializes all record mutation, so
/// every operation is atomic with respect to every other; drains additionally
/// run read and delete inside one transaction so a crash cannot lose or
/// double-deliver a toast.
pub struct SqliteNotificationStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteNotificationStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let is_new_db = !path.exists();

        let mut conn =
            Connection::open(path).context("Failed to open notifications database")?;

        if is_new_db {
            // Fresh database - create with latest schema
            info!("Creating new notifications database at {:?}", path);
            NOTIFICATIONS_VERSIONED_SCHEMAS.last().unwrap().create(&conn)?;
        } else {
            // Existing database - check version and migrate if needed
            let raw_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
            let db_version = raw_version - BASE_DB_VERSION as i64;

            if db_version < 1 {
                anyhow::bail!(
                    "Notifications database version {} is invalid (expected >= 1)",
                    db_version
                );
            }

            let current_schema_version =
                NOTIFICATIONS_VERSIONED_SCHEMAS.last().unwrap().version as i64;

            let version_index = NOTIFICATIONS_VERSIONED_SCHEMAS
                .iter()
                .position(|s| s.version == db_version as usize)
                .with_context(|| {
                    format!("Unknown notifications database version {}", db_version)
                })?;
            NOTIFICATIONS_VERSIONED_SCHEMAS[version_index]
                .validate(&conn)
                .with_context(|| {
                    format!(
                        "Notifications database schema validation failed for version {}",
                        db_version
                    )
                })?;

            if db_version < current_schema_version {
                info!(
                    "Migrating notifications database from version {} to {}",
                    db_version, current_schema_version
                );
                Self::migrate_if_needed(&mut conn, db_version as usize)?;
            }
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn migrate_if_needed(conn: &mut Connection, from_version: usize) -> Result<()> {
        let tx = conn.transaction()?;
        let mut latest_from = from_version;
        for schema in NOTIFICATIONS_VERSIONED_SCHEMAS.iter().skip(from_version) {
            if schema.version > from_version {
                info!(
                    "Running notifications database migration from version {} to {}",
                    latest_from, schema.version
                );
                if let Some(migration_fn) = schema.migration {
                    migration_fn(&tx).with_context(|| {
                        format!("Failed to run migration to version {}", schema.version)
                    })?;
                }
                latest_from = schema.version;
            }
        }
        tx.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest_from),
            [],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn row_to_toast(row: &rusqlite::Row) -> rusqlite::Result<Toast> {
        let category_str: String = row.get("category")?;
        let category = ToastCategory::parse(&category_str).unwrap_or_default();

        let context_str: String = row.get("context")?;
        let context = serde_json::from_str(&context_str).unwrap_or_else(|e| {
            warn!("Malformed context JSON in toasts table: {}", e);
            serde_json::Map::new()
        });

        Ok(Toast {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            message: row.get("message")?,
            category,
            context,
            created_at: row.get("created_at")?,
        })
    }

    fn row_to_subscription(row: &rusqlite::Row) -> rusqlite::Result<Subscription> {
        let keys_str: String = row.get("keys")?;
        let keys = serde_json::from_str(&keys_str).unwrap_or_else(|e| {
            warn!("Malformed keys JSON in subscriptions table: {}", e);
            serde_json::Map::new()
        });

        Ok(Subscription {
            endpoint: row.get("endpoint")?,
            user_id: row.get("user_id")?,
            keys,
        })
    }
}

impl NotificationStore for SqliteNotificationStore {
    fn put_toast(&self, toast: &Toast) -> Result<()> {
        let context_json =
            serde_json::to_string(&toast.context).context("Failed to serialize toast context")?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO toasts (id, user_id, message, category, context, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                toast.id,
                toast.user_id,
                toast.message,
                toast.category.as_str(),
                context_json,
                toast.created_at,
            ],
        )
        .context("Failed to insert toast")?;
        Ok(())
    }

    fn drain_toasts(&self, user_id: &str) -> Result<Vec<Toast>> {
        let conn = self.conn.lock().unwrap();
        let tx = conn.unchecked_transaction()?;
        let toasts = {
            let mut stmt = tx.prepare_cached(
                "SELECT id, user_id, message, category, context, created_at
                 FROM toasts WHERE user_id = ?1 ORDER BY created_at, rowid",
            )?;
            let rows = stmt.query_map(params![user_id], Self::row_to_toast)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };
        tx.execute("DELETE FROM toasts WHERE user_id = ?1", params![user_id])?;
        tx.commit().context("Failed to commit toast drain")?;
        Ok(toasts)
    }

    fn upsert_subscription(&self, subscription: &Subscription) -> Result<()> {
        let keys_json = serde_json::to_string(&subscription.keys)
            .context("Failed to serialize subscription keys")?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO subscriptions (endpoint, user_id, keys)
             VALUES (?1, ?2, ?3)",
            params![subscription.endpoint, subscription.user_id, keys_json],
        )
        .context("Failed to upsert subscription")?;
        Ok(())
    }

    fn subscriptions_for(&self, user_id: &str) -> Result<Vec<Subscription>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT endpoint, user_id, keys FROM subscriptions WHERE user_id = ?1",
        )?;
        let rows = stmt.query_map(params![user_id], Self::row_to_subscription)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn delete_subscription(&self, endpoint: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM subscriptions WHERE endpoint = ?1",
            params![endpoint],
        )
        .context("Failed to delete subscription")?;
        Ok(())
    }
}
