//! Random access into archive members by byte offset.
//!
//! Compressed members cannot be seeked directly, so a read decompresses
//! from the start of the member, discards `byte_offset` bytes and then reads
//! exactly `byte_length`. Nothing else in the member is decoded.

use crate::error::{ArchiveError, Result};
use crate::location::ArchiveLocation;
use catalog_db_core::{codec, CatalogRecord};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use tracing::trace;

/// Reads raw records out of the archives under one records directory.
#[derive(Debug, Clone)]
pub struct ArchiveReader {
    root: PathBuf,
}

impl ArchiveReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Raw bytes of the record at `location`.
    pub fn read_bytes(&self, location: &ArchiveLocation) -> Result<Vec<u8>> {
        let path = self.archive_path(&location.archive_file)?;
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ArchiveError::missing_member(location.archive_file.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        let mut archive = zip::ZipArchive::new(file)?;
        let mut member = match archive.by_name(&location.inner_file) {
            Ok(member) => member,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(ArchiveError::missing_member(format!(
                    "{}/{}",
                    location.archive_file, location.inner_file
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let skipped = io::copy(&mut (&mut member).take(location.byte_offset), &mut io::sink())?;
        if skipped < location.byte_offset {
            return Err(ArchiveError::missing_member(format!(
                "{}/{} ends before offset {}",
                location.archive_file, location.inner_file, location.byte_offset
            )));
        }

        let len = usize::try_from(location.byte_length)
            .map_err(|_| ArchiveError::Overflow(format!("record length {}", location.byte_length)))?;
        let mut buf = vec![0u8; len];
        member.read_exact(&mut buf)?;
        trace!(
            archive = %location.archive_file,
            offset = location.byte_offset,
            len,
            "read archived record"
        );
        Ok(buf)
    }

    /// Read and decode the record at `location`.
    pub fn read_record(&self, location: &ArchiveLocation) -> Result<CatalogRecord> {
        let bytes = self.read_bytes(location)?;
        Ok(codec::decode(&bytes)?)
    }

    /// Archive names are single path components under the root.
    fn archive_path(&self, archive_file: &str) -> Result<PathBuf> {
        let mut components = Path::new(archive_file).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Ok(self.root.join(name)),
            _ => Err(ArchiveError::missing_member(format!(
                "invalid archive name: {archive_file}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures::*;
    use crate::MemoryArchiveIndex;
    use crate::ArchiveIndex;
    use catalog_db_core::RecordId;

    #[test]
    fn reads_the_exact_record_at_an_offset() {
        let dir = tempfile::tempdir().unwrap();
        let records: Vec<_> = (1..=5)
            .map(|i| record(&format!("c{i}"), &format!("Title number {i}"), None))
            .collect();
        write_zip(dir.path(), "vol1.zip", &[("records.mrc", encode_all(&records))]);

        let (index, _) = MemoryArchiveIndex::build(dir.path()).unwrap();
        let reader = ArchiveReader::new(dir.path());
        let loc = index.locate(RecordId(4)).unwrap();
        let rec = reader.read_record(&loc).unwrap();
        assert_eq!(rec.control("001"), Some("c4"));
        assert_eq!(rec.fields, records[3].fields);
    }

    #[test]
    fn missing_archive_and_member_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        write_zip(dir.path(), "vol1.zip", &[("records.mrc", encode_all(&[record("x", "X", None)]))]);
        let reader = ArchiveReader::new(dir.path());

        let mut loc = ArchiveLocation {
            archive_file: "gone.zip".into(),
            inner_file: "records.mrc".into(),
            byte_offset: 0,
            byte_length: 10,
        };
        assert!(reader.read_bytes(&loc).unwrap_err().is_not_found());

        loc.archive_file = "vol1.zip".into();
        loc.inner_file = "other.mrc".into();
        assert!(reader.read_bytes(&loc).unwrap_err().is_not_found());

        loc.archive_file = "../vol1.zip".into();
        assert!(reader.read_bytes(&loc).unwrap_err().is_not_found());
    }

    #[test]
    fn offset_past_end_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        write_zip(dir.path(), "vol1.zip", &[("records.mrc", encode_all(&[record("x", "X", None)]))]);
        let reader = ArchiveReader::new(dir.path());
        let loc = ArchiveLocation {
            archive_file: "vol1.zip".into(),
            inner_file: "records.mrc".into(),
            byte_offset: 1_000_000,
            byte_length: 10,
        };
        assert!(reader.read_bytes(&loc).unwrap_err().is_not_found());
    }
}
