//! SQLite-backed archive index.
//!
//! One `records` row per archival record: its location plus the secondary
//! keys extracted at build time. The table is rebuilt wholesale; nothing
//! updates it incrementally.

use crate::error::{ArchiveError, Result};
use crate::index::ArchiveIndex;
use crate::ingest::{ingest_dir, IngestReport};
use crate::location::{ArchiveLocation, IndexSummary, SearchQuery};
use catalog_db_core::RecordId;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::info;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS records (
        id INTEGER PRIMARY KEY,
        archive_file TEXT NOT NULL,
        inner_file TEXT NOT NULL,
        byte_offset INTEGER NOT NULL,
        byte_length INTEGER NOT NULL,
        sudoc TEXT,
        title TEXT,
        oclc TEXT,
        control_number TEXT
    );
";

const SECONDARY_INDEXES: &str = "
    CREATE INDEX IF NOT EXISTS idx_records_sudoc ON records(sudoc);
    CREATE INDEX IF NOT EXISTS idx_records_title ON records(title);
    CREATE INDEX IF NOT EXISTS idx_records_oclc ON records(oclc);
    CREATE INDEX IF NOT EXISTS idx_records_control ON records(control_number);
";

/// Archive index persisted in a SQLite file.
#[derive(Debug)]
pub struct SqliteArchiveIndex {
    conn: Mutex<Connection>,
}

impl SqliteArchiveIndex {
    /// Open (or create) the index database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        conn.execute_batch(SECONDARY_INDEXES)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Drop and rebuild the index from every archive under `records_dir`.
    ///
    /// Runs in one transaction: a failed build leaves the previous index.
    pub fn rebuild(&self, records_dir: &Path) -> Result<IngestReport> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute_batch(
            "DROP INDEX IF EXISTS idx_records_sudoc;
             DROP INDEX IF EXISTS idx_records_title;
             DROP INDEX IF EXISTS idx_records_oclc;
             DROP INDEX IF EXISTS idx_records_control;
             DELETE FROM records;",
        )?;

        let report = {
            let mut insert = tx.prepare(
                "INSERT INTO records (id, archive_file, inner_file, byte_offset, byte_length,
                                      sudoc, title, oclc, control_number)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            ingest_dir(records_dir, RecordId(1), &mut |entry| {
                insert.execute(params![
                    entry.id.as_i64(),
                    entry.location.archive_file,
                    entry.location.inner_file,
                    to_sql_int(entry.location.byte_offset)?,
                    to_sql_int(entry.location.byte_length)?,
                    entry.keys.sudoc,
                    entry.keys.title,
                    entry.keys.oclc,
                    entry.keys.control_number,
                ])?;
                Ok(())
            })?
        };

        tx.execute_batch(SECONDARY_INDEXES)?;
        tx.commit()?;
        info!(records = report.records, "archive index rebuilt");
        Ok(report)
    }
}

fn to_sql_int(v: u64) -> Result<i64> {
    i64::try_from(v).map_err(|_| ArchiveError::Overflow(format!("value {v} exceeds INTEGER range")))
}

fn from_sql_int(v: i64) -> u64 {
    v.max(0) as u64
}

/// Escape `%`, `_` and the escape char for a LIKE pattern.
fn like_pattern(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len() + 2);
    out.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

impl ArchiveIndex for SqliteArchiveIndex {
    fn locate(&self, id: RecordId) -> Result<ArchiveLocation> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT archive_file, inner_file, byte_offset, byte_length FROM records WHERE id = ?1",
            params![id.as_i64()],
            |row| {
                Ok(ArchiveLocation {
                    archive_file: row.get(0)?,
                    inner_file: row.get(1)?,
                    byte_offset: from_sql_int(row.get(2)?),
                    byte_length: from_sql_int(row.get(3)?),
                })
            },
        )
        .optional()?
        .ok_or(ArchiveError::NotIndexed(id))
    }

    fn find_by_oclc(&self, number: &str) -> Result<Vec<RecordId>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached("SELECT id FROM records WHERE oclc = ?1 ORDER BY id")?;
        let ids = stmt.query_map(params![number], |row| row.get::<_, i64>(0))?;
        let ids = ids
            .map(|id| id.map(RecordId::from_i64))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn find_by_control_number(&self, number: &str) -> Result<Vec<RecordId>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached("SELECT id FROM records WHERE control_number = ?1 ORDER BY id")?;
        let ids = stmt.query_map(params![number], |row| row.get::<_, i64>(0))?;
        let ids = ids
            .map(|id| id.map(RecordId::from_i64))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<IndexSummary>> {
        let conn = self.conn.lock();
        let sudoc = query.sudoc.as_deref().map(like_pattern);
        let title = query.title.as_deref().map(like_pattern);
        let mut stmt = conn.prepare(
            "SELECT id, sudoc, title, archive_file, oclc FROM records
             WHERE (?1 IS NULL OR sudoc LIKE ?1 ESCAPE '\\')
               AND (?2 IS NULL OR title LIKE ?2 ESCAPE '\\')
             ORDER BY id
             LIMIT ?3 OFFSET ?4",
        )?;
        let rows = stmt.query_map(
            params![
                sudoc,
                title,
                i64::try_from(query.limit).unwrap_or(i64::MAX),
                i64::try_from(query.offset).unwrap_or(i64::MAX),
            ],
            |row| {
                Ok(IndexSummary {
                    id: RecordId::from_i64(row.get(0)?),
                    sudoc: row.get(1)?,
                    title: row.get(2)?,
                    archive_file: row.get(3)?,
                    oclc: row.get(4)?,
                })
            },
        )?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn len(&self) -> Result<u64> {
        let conn = self.conn.lock();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(from_sql_int(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures::*;
    use crate::reader::ArchiveReader;

    #[test]
    fn rebuild_then_locate_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            record("c1", "Minerals yearbook 1990", Some("ocm00001234")),
            record("c2", "Minerals yearbook 1991", None),
            record("c3", "100% of the 50_50 split", None),
        ];
        write_zip(dir.path(), "vol1.zip", &[("records.mrc", encode_all(&records))]);

        let index = SqliteArchiveIndex::open(&dir.path().join("index.db")).unwrap();
        let report = index.rebuild(dir.path()).unwrap();
        assert_eq!(report.records, 3);
        assert_eq!(index.len().unwrap(), 3);

        let loc = index.locate(RecordId(2)).unwrap();
        let rec = ArchiveReader::new(dir.path()).read_record(&loc).unwrap();
        assert_eq!(rec.control("001"), Some("c2"));

        assert_eq!(index.find_by_oclc("1234").unwrap(), vec![RecordId(1)]);
        assert_eq!(index.find_by_control_number("c3").unwrap(), vec![RecordId(3)]);
        assert!(matches!(index.locate(RecordId(9)), Err(ArchiveError::NotIndexed(_))));
    }

    #[test]
    fn duplicate_identifiers_return_every_id() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            record("c1", "Minerals yearbook 1990", Some("9000")),
            record("c2", "Minerals yearbook 1991", None),
            record("c1", "Minerals yearbook 1990 (reprint)", Some("9000")),
        ];
        write_zip(dir.path(), "vol1.zip", &[("records.mrc", encode_all(&records))]);
        let index = SqliteArchiveIndex::open_in_memory().unwrap();
        index.rebuild(dir.path()).unwrap();

        assert_eq!(index.find_by_oclc("9000").unwrap(), vec![RecordId(1), RecordId(3)]);
        assert_eq!(index.find_by_control_number("c1").unwrap(), vec![RecordId(1), RecordId(3)]);
        assert!(index.find_by_control_number("zz").unwrap().is_empty());
    }

    #[test]
    fn rebuild_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        write_zip(
            dir.path(),
            "vol1.zip",
            &[("records.mrc", encode_all(&[record("a", "A", None), record("b", "B", None)]))],
        );
        let index = SqliteArchiveIndex::open_in_memory().unwrap();
        index.rebuild(dir.path()).unwrap();
        index.rebuild(dir.path()).unwrap();
        assert_eq!(index.len().unwrap(), 2);
    }

    #[test]
    fn search_escapes_like_wildcards() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            record("c1", "Minerals yearbook", None),
            record("c2", "100% of the 50_50 split", None),
        ];
        write_zip(dir.path(), "vol1.zip", &[("records.mrc", encode_all(&records))]);
        let index = SqliteArchiveIndex::open_in_memory().unwrap();
        index.rebuild(dir.path()).unwrap();

        let hits = index.search(&SearchQuery::default().with_title("100%")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, RecordId(2));
        let hits = index.search(&SearchQuery::sudoc("y 4.")).unwrap();
        assert_eq!(hits.len(), 2);
        let hits = index.search(&SearchQuery::default().with_title("MINERALS")).unwrap();
        assert_eq!(hits.len(), 1);
    }
}
