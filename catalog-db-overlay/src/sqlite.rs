//! SQLite-backed overlay store.
//!
//! Tables:
//!
//! ```text
//! edited_records   seq PK autoincrement | record_id | payload | edited_at | editor
//! created_records  id PK                | payload   | created_at | creator
//! ```
//!
//! The connection is blocking, so every operation hops to
//! `tokio::task::spawn_blocking`.

use crate::error::{OverlayError, Result};
use crate::record::{CreatedRecord, CurrentPayload, OverlayRecord};
use crate::store::OverlayStore;
use async_trait::async_trait;
use catalog_db_core::{RecordId, CREATED_ID_BASE};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS edited_records (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        record_id INTEGER NOT NULL,
        payload BLOB NOT NULL,
        edited_at TEXT NOT NULL,
        editor TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_edited_record_seq ON edited_records(record_id, seq);

    CREATE TABLE IF NOT EXISTS created_records (
        id INTEGER PRIMARY KEY,
        payload BLOB NOT NULL,
        created_at TEXT NOT NULL,
        creator TEXT NOT NULL
    );
";

/// Overlay store persisted in a SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteOverlayStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteOverlayStore {
    /// Open (or create) the overlay database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| OverlayError::unavailable(format!("{}: {e}", path.display())))?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut guard)
        })
        .await?
    }
}

fn overlay_row(row: &Row<'_>) -> rusqlite::Result<OverlayRecord> {
    Ok(OverlayRecord {
        seq: row.get::<_, i64>(0)?.max(0) as u64,
        record_id: RecordId::from_i64(row.get(1)?),
        payload: row.get(2)?,
        edited_at: row.get::<_, DateTime<Utc>>(3)?,
        editor: row.get(4)?,
    })
}

#[async_trait]
impl OverlayStore for SqliteOverlayStore {
    async fn save(&self, id: RecordId, payload: &[u8], editor: &str) -> Result<OverlayRecord> {
        let payload = payload.to_vec();
        let editor = editor.to_string();
        self.with_conn(move |conn| {
            let edited_at = Utc::now();
            conn.execute(
                "INSERT INTO edited_records (record_id, payload, edited_at, editor)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id.as_i64(), payload, edited_at, editor],
            )?;
            let seq = conn.last_insert_rowid().max(0) as u64;
            debug!(record_id = %id, seq, "overlay version saved");
            Ok(OverlayRecord {
                record_id: id,
                seq,
                payload,
                edited_at,
                editor,
            })
        })
        .await
    }

    async fn get_latest(&self, id: RecordId) -> Result<Option<OverlayRecord>> {
        self.with_conn(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT seq, record_id, payload, edited_at, editor FROM edited_records
                     WHERE record_id = ?1 ORDER BY seq DESC LIMIT 1",
                    params![id.as_i64()],
                    overlay_row,
                )
                .optional()?)
        })
        .await
    }

    async fn history(&self, id: RecordId) -> Result<Vec<OverlayRecord>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT seq, record_id, payload, edited_at, editor FROM edited_records
                 WHERE record_id = ?1 ORDER BY seq ASC",
            )?;
            let rows = stmt.query_map(params![id.as_i64()], overlay_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn create(&self, payload: &[u8], creator: &str) -> Result<RecordId> {
        let payload = payload.to_vec();
        let creator = creator.to_string();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let base = i64::try_from(CREATED_ID_BASE)
                .map_err(|_| OverlayError::overflow("created id base exceeds INTEGER range"))?;
            let last: Option<i64> =
                tx.query_row("SELECT MAX(id) FROM created_records", [], |row| row.get(0))?;
            let next = match last {
                Some(last) => last
                    .checked_add(1)
                    .ok_or_else(|| OverlayError::overflow("created id space exhausted"))?,
                None => base,
            };
            tx.execute(
                "INSERT INTO created_records (id, payload, created_at, creator)
                 VALUES (?1, ?2, ?3, ?4)",
                params![next, payload, Utc::now(), creator],
            )?;
            tx.commit()?;
            let id = RecordId::from_i64(next);
            debug!(record_id = %id, "created record stored");
            Ok(id)
        })
        .await
    }

    async fn get_created(&self, id: RecordId) -> Result<Option<CreatedRecord>> {
        self.with_conn(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT id, payload, created_at, creator FROM created_records WHERE id = ?1",
                    params![id.as_i64()],
                    |row| {
                        Ok(CreatedRecord {
                            record_id: RecordId::from_i64(row.get(0)?),
                            payload: row.get(1)?,
                            created_at: row.get(2)?,
                            creator: row.get(3)?,
                        })
                    },
                )
                .optional()?)
        })
        .await
    }

    async fn scan_current(&self) -> Result<Vec<CurrentPayload>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT e.record_id, e.payload, 1 FROM edited_records e
                 WHERE e.seq = (SELECT MAX(seq) FROM edited_records WHERE record_id = e.record_id)
                 UNION ALL
                 SELECT c.id, c.payload, 0 FROM created_records c
                 WHERE NOT EXISTS (SELECT 1 FROM edited_records WHERE record_id = c.id)
                 ORDER BY 1",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(CurrentPayload {
                    record_id: RecordId::from_i64(row.get(0)?),
                    payload: row.get(1)?,
                    edited: row.get::<_, i64>(2)? != 0,
                })
            })?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }
}
