use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use crate::error::{Result, ToolError};
use crate::model::{ItemStatus, RoundKey, StatusRecord};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS isms_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    year TEXT NOT NULL,
    round_name TEXT NOT NULL,
    item_id TEXT NOT NULL,
    description TEXT NOT NULL,
    evidence_name TEXT NOT NULL,
    status TEXT NOT NULL,
    updated_at_ms INTEGER NOT NULL,
    UNIQUE (year, round_name, item_id)
);
"#;

const RECORD_COLUMNS: &str = "year, round_name, item_id, description, evidence_name, status";

/// Durable store of per-round status records backed by SQLite.
///
/// The connection sits behind a mutex so the store can be shared between
/// request handlers; every method holds the lock for its whole statement.
#[derive(Debug)]
pub struct StatusStore {
    conn: Mutex<Connection>,
}

impl StatusStore {
    /// Opens (creating if needed) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(|err| {
            ToolError::StoreUnavailable(format!("cannot open {}: {err}", path.display()))
        })?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::with_connection(conn)
    }

    /// Opens a private in-memory database. Records vanish with the store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|err| ToolError::StoreUnavailable(err.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ToolError::StoreUnavailable("connection lock poisoned".into()))
    }

    /// Looks up the record for one item in one round.
    pub fn get(&self, key: &RoundKey, item_id: &str) -> Result<Option<StatusRecord>> {
        let conn = self.lock()?;
        fetch(&conn, key, item_id)
    }

    /// Records the description and evidence for an item and marks it
    /// completed. A second save for the same key overwrites the first.
    pub fn upsert(
        &self,
        key: &RoundKey,
        item_id: &str,
        description: &str,
        evidence_name: &str,
    ) -> Result<StatusRecord> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO isms_results(year, round_name, item_id, description, evidence_name, status, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(year, round_name, item_id) DO UPDATE SET
                description=excluded.description,
                evidence_name=excluded.evidence_name,
                status=excluded.status,
                updated_at_ms=excluded.updated_at_ms
            "#,
            params![
                key.year,
                key.round_name,
                item_id,
                description,
                evidence_name,
                ItemStatus::Completed.as_str(),
                now_ms(),
            ],
        )?;
        debug!(year = %key.year, round = %key.round_name, item_id, "status record saved");
        fetch(&conn, key, item_id)?.ok_or(ToolError::Store(rusqlite::Error::QueryReturnedNoRows))
    }

    /// All records of one round, ordered by item id.
    pub fn list_round(&self, key: &RoundKey) -> Result<Vec<StatusRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM isms_results \
             WHERE year=?1 AND round_name=?2 ORDER BY item_id ASC"
        ))?;
        let rows = stmt.query_map(params![key.year, key.round_name], record_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Every stored record, ordered by round and item id.
    pub fn list_all(&self) -> Result<Vec<StatusRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM isms_results \
             ORDER BY year ASC, round_name ASC, item_id ASC"
        ))?;
        let rows = stmt.query_map([], record_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn fetch(conn: &Connection, key: &RoundKey, item_id: &str) -> Result<Option<StatusRecord>> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {RECORD_COLUMNS} FROM isms_results \
                 WHERE year=?1 AND round_name=?2 AND item_id=?3"
            ),
            params![key.year, key.round_name, item_id],
            record_from_row,
        )
        .optional()?)
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<StatusRecord> {
    Ok(StatusRecord {
        year: row.get(0)?,
        round_name: row.get(1)?,
        item_id: row.get(2)?,
        description: row.get(3)?,
        evidence_name: row.get(4)?,
        status: ItemStatus::from_stored(&row.get::<_, String>(5)?),
    })
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
