//! SQLite-based item storage.
//!
//! Provides persistent storage for:
//! - Queued content items and their scheduled publication instants
//! - Key-value store for run state (owner rotation, last run)

use std::path::Path;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::engine::{Assignment, Item};
use crate::error::{CoreError, DatabaseError};
use crate::owner::RotationState;

use super::data_dir;

/// Status of an item waiting for its publication instant.
pub const STATUS_FUTURE: &str = "future";
/// Status of an item that has gone live.
pub const STATUS_PUBLISHED: &str = "publish";

const KV_ROTATION: &str = "owner_rotation";
const KV_LAST_RUN: &str = "last_run";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: String,
    pub title: String,
    pub owner_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub publish_at: Option<DateTime<FixedOffset>>,
}

impl ItemRecord {
    /// The engine's read-only view of this record.
    pub fn to_item(&self) -> Item {
        Item::new(self.id.clone(), self.owner_id.clone(), self.title.clone())
    }

    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let created: String = row.get(4)?;
        let publish: Option<String> = row.get(5)?;
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            owner_id: row.get(2)?,
            status: row.get(3)?,
            created_at: parse_instant(4, &created)?.with_timezone(&Utc),
            publish_at: publish.as_deref().map(|s| parse_instant(5, s)).transpose()?,
        })
    }
}

fn parse_instant(column: usize, raw: &str) -> Result<DateTime<FixedOffset>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Item counts for the status view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Items in the monitored status, waiting to be scheduled.
    pub pending: u64,
    pub future: u64,
    pub published: u64,
}

const ITEM_COLUMNS: &str = "id, title, owner_id, status, created_at, publish_at";

/// SQLite database for queued items.
pub struct ItemStore {
    conn: Connection,
}

impl ItemStore {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the store at `<data dir>/pubslot.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database
    /// cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("pubslot.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open the store at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS items (
                id          TEXT PRIMARY KEY,
                title       TEXT NOT NULL,
                owner_id    TEXT NOT NULL,
                status      TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                publish_at  TEXT,
                publish_ts  INTEGER
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_items_status_created ON items(status, created_at);
            CREATE INDEX IF NOT EXISTS idx_items_status_publish ON items(status, publish_ts);",
        )?;
        Ok(())
    }

    /// Queue a new item with a generated id.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn add_item(
        &self,
        title: &str,
        owner_id: &str,
        status: &str,
    ) -> Result<ItemRecord, DatabaseError> {
        let record = ItemRecord {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            owner_id: owner_id.to_string(),
            status: status.to_string(),
            created_at: Utc::now(),
            publish_at: None,
        };
        self.conn.execute(
            "INSERT INTO items (id, title, owner_id, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id,
                record.title,
                record.owner_id,
                record.status,
                record.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )?;
        Ok(record)
    }

    pub fn get_item(&self, id: &str) -> Result<ItemRecord, DatabaseError> {
        self.conn
            .query_row(
                &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
                params![id],
                ItemRecord::from_row,
            )
            .optional()?
            .ok_or_else(|| DatabaseError::NotFound(id.to_string()))
    }

    pub fn remove_item(&self, id: &str) -> Result<(), DatabaseError> {
        let removed = self
            .conn
            .execute("DELETE FROM items WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Err(DatabaseError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// All items, optionally filtered by status, in queue order.
    pub fn list_items(&self, status: Option<&str>) -> Result<Vec<ItemRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM items
             WHERE ?1 IS NULL OR status = ?1
             ORDER BY created_at ASC, rowid ASC"
        ))?;
        let rows = stmt.query_map(params![status], ItemRecord::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Oldest-first batch of items in `status`.
    pub fn pending_items(&self, status: &str, limit: usize) -> Result<Vec<ItemRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM items
             WHERE status = ?1
             ORDER BY created_at ASC, rowid ASC
             LIMIT ?2"
        ))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![status, limit], ItemRecord::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Move an item still in `from_status` to `future` at the assigned
    /// instant under the assigned owner.
    ///
    /// # Errors
    /// [`DatabaseError::NotFound`] if the item was removed meanwhile,
    /// [`DatabaseError::StatusChanged`] if something else already moved it.
    pub fn apply_assignment(
        &self,
        assignment: &Assignment,
        from_status: &str,
    ) -> Result<(), DatabaseError> {
        let id = &assignment.item.id;
        let updated = self.conn.execute(
            "UPDATE items SET status = ?2, owner_id = ?3, publish_at = ?4, publish_ts = ?5
             WHERE id = ?1 AND status = ?6",
            params![
                id,
                STATUS_FUTURE,
                assignment.owner_id,
                assignment.at.to_rfc3339(),
                assignment.at.timestamp(),
                from_status,
            ],
        )?;
        if updated == 0 {
            return Err(match self.get_item(id) {
                Ok(_) => DatabaseError::StatusChanged {
                    id: id.clone(),
                    expected: from_status.to_string(),
                },
                Err(e) => e,
            });
        }
        Ok(())
    }

    /// Apply every assignment of a run atomically; nothing is written if any
    /// item has left `from_status`.
    pub fn apply_assignments(
        &self,
        assignments: &[Assignment],
        from_status: &str,
    ) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        for assignment in assignments {
            self.apply_assignment(assignment, from_status)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn count_by_status(&self, status: &str) -> Result<u64, DatabaseError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM items WHERE status = ?1",
            params![status],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    pub fn status_counts(&self, post_status: &str) -> Result<StatusCounts, DatabaseError> {
        Ok(StatusCounts {
            pending: self.count_by_status(post_status)?,
            future: self.count_by_status(STATUS_FUTURE)?,
            published: self.count_by_status(STATUS_PUBLISHED)?,
        })
    }

    /// Next `limit` future items, soonest first.
    pub fn upcoming(&self, limit: usize) -> Result<Vec<ItemRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM items
             WHERE status = ?1
             ORDER BY publish_ts ASC
             LIMIT ?2"
        ))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![STATUS_FUTURE, limit], ItemRecord::from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Every future item, soonest first.
    pub fn future_items(&self) -> Result<Vec<ItemRecord>, DatabaseError> {
        self.upcoming(usize::MAX)
    }

    pub fn mark_published(&self, id: &str) -> Result<(), DatabaseError> {
        let updated = self.conn.execute(
            "UPDATE items SET status = ?2 WHERE id = ?1 AND status = ?3",
            params![id, STATUS_PUBLISHED, STATUS_FUTURE],
        )?;
        if updated == 0 {
            return Err(DatabaseError::NotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn rotation_state(&self) -> Result<RotationState, DatabaseError> {
        Ok(self.kv_get_json(KV_ROTATION)?.unwrap_or_default())
    }

    pub fn set_rotation_state(&self, state: RotationState) -> Result<(), DatabaseError> {
        self.kv_set_json(KV_ROTATION, &state)
    }

    pub fn last_run<T: DeserializeOwned>(&self) -> Result<Option<T>, DatabaseError> {
        self.kv_get_json(KV_LAST_RUN)
    }

    pub fn set_last_run<T: Serialize>(&self, summary: &T) -> Result<(), DatabaseError> {
        self.kv_set_json(KV_LAST_RUN, summary)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn kv_get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DatabaseError> {
        match self.kv_get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| DatabaseError::QueryFailed(format!("corrupt kv entry '{key}': {e}"))),
            None => Ok(None),
        }
    }

    fn kv_set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), DatabaseError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| DatabaseError::QueryFailed(format!("cannot encode kv entry '{key}': {e}")))?;
        Ok(self.kv_set(key, &raw)?)
    }
}
