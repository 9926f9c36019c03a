//! One-time ingestion pass that builds the archive index.
//!
//! Every `*.zip` in the records directory is opened in name order and each
//! `*.mrc` member is streamed front to back. A running byte offset is kept
//! per member; each record's length comes from its own 5-digit prefix, so
//! the offset advances correctly even past records that fail to decode.

use crate::error::{ArchiveError, Result};
use crate::location::{ArchiveLocation, IndexEntry, SecondaryKeys};
use catalog_db_core::{codec, RecordId, CREATED_ID_BASE};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info, warn};

const ARCHIVE_EXTENSION: &str = ".zip";
const DATA_FILE_EXTENSION: &str = ".mrc";
const PROGRESS_EVERY: u64 = 1000;

/// Counters reported by an ingestion pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub archives: usize,
    pub data_files: usize,
    pub records: u64,
    /// Records whose bytes were read but did not decode
    pub skipped: u64,
    /// Archives or members that could not be read at all
    pub failed: Vec<String>,
}

/// Why an archive stopped before its end.
enum Halt {
    /// The archive could not be read; the pass moves on to the next one.
    Unreadable(ArchiveError),
    /// The sink failed or ids ran out; the pass stops.
    Fatal(ArchiveError),
}

impl From<ArchiveError> for Halt {
    fn from(e: ArchiveError) -> Self {
        Halt::Unreadable(e)
    }
}

impl From<std::io::Error> for Halt {
    fn from(e: std::io::Error) -> Self {
        Halt::from(ArchiveError::from(e))
    }
}

impl From<zip::result::ZipError> for Halt {
    fn from(e: zip::result::ZipError) -> Self {
        Halt::from(ArchiveError::from(e))
    }
}

/// Stream every archive under `records_dir` into `sink`, assigning ids
/// sequentially from `first_id`.
pub fn ingest_dir(
    records_dir: &Path,
    first_id: RecordId,
    sink: &mut dyn FnMut(IndexEntry) -> Result<()>,
) -> Result<IngestReport> {
    let mut archives: Vec<String> = std::fs::read_dir(records_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(ARCHIVE_EXTENSION))
        .collect();
    archives.sort();

    let mut report = IngestReport::default();
    let mut next_id = first_id.get().max(1);

    for name in archives {
        info!(archive = %name, "indexing archive");
        match ingest_archive(&records_dir.join(&name), &name, &mut next_id, sink, &mut report) {
            Ok(()) => report.archives += 1,
            Err(Halt::Fatal(e)) => return Err(e),
            Err(Halt::Unreadable(e)) => {
                warn!(archive = %name, error = %e, "failed to read archive");
                report.failed.push(name);
            }
        }
    }

    info!(
        archives = report.archives,
        records = report.records,
        skipped = report.skipped,
        "index build complete"
    );
    Ok(report)
}

fn ingest_archive(
    path: &Path,
    archive_name: &str,
    next_id: &mut u64,
    sink: &mut dyn FnMut(IndexEntry) -> Result<()>,
    report: &mut IngestReport,
) -> std::result::Result<(), Halt> {
    let mut archive = zip::ZipArchive::new(File::open(path)?)?;
    let mut members: Vec<String> = archive
        .file_names()
        .filter(|n| n.ends_with(DATA_FILE_EXTENSION))
        .map(str::to_string)
        .collect();
    members.sort();
    if members.is_empty() {
        warn!(archive = %archive_name, "no data files in archive");
    }

    for member in members {
        let file = archive.by_name(&member)?;
        let mut reader = BufReader::new(file);
        let mut offset: u64 = 0;
        let mut member_records: u64 = 0;

        loop {
            let bytes = match codec::read_next(&mut reader) {
                Ok(Some(bytes)) => bytes,
                Ok(None) => break,
                Err(e) => {
                    // Without a trustworthy length prefix the rest of the
                    // member cannot be framed.
                    warn!(archive = %archive_name, member = %member, offset, error = %e,
                        "unreadable record length; abandoning data file");
                    report.failed.push(format!("{archive_name}/{member}"));
                    break;
                }
            };
            let length = bytes.len() as u64;

            match codec::decode(&bytes) {
                Ok(record) => {
                    if *next_id >= CREATED_ID_BASE {
                        return Err(Halt::Fatal(ArchiveError::Overflow(format!(
                            "archive id {next_id} reached the created-record range"
                        ))));
                    }
                    let entry = IndexEntry {
                        id: RecordId(*next_id),
                        location: ArchiveLocation {
                            archive_file: archive_name.to_string(),
                            inner_file: member.clone(),
                            byte_offset: offset,
                            byte_length: length,
                        },
                        keys: SecondaryKeys::from_record(&record),
                    };
                    sink(entry).map_err(Halt::Fatal)?;
                    *next_id += 1;
                    member_records += 1;
                    report.records += 1;
                    if report.records % PROGRESS_EVERY == 0 {
                        info!(records = report.records, "indexing progress");
                    }
                }
                Err(e) => {
                    warn!(archive = %archive_name, member = %member, offset, error = %e,
                        "skipping malformed record");
                    report.skipped += 1;
                }
            }
            offset += length;
        }

        debug!(archive = %archive_name, member = %member, records = member_records, "data file indexed");
        report.data_files += 1;
    }
    Ok(())
}
