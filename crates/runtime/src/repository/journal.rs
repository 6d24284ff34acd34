//! Append-only journal of store writes.
//!
//! ```text
//! [u32 length][bincode (seq, JournalEntry)]
//! [u32 length][bincode (seq, JournalEntry)]
//! ...
//! ```
//!
//! A record cut short by a crash is dropped (and truncated away) on open.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::error::{RepositoryError, Result};
use super::mutation::JournalEntry;

pub(crate) struct Journal {
    path: PathBuf,
    file: File,
    len: u64,
    records: usize,
}

impl Journal {
    /// Opens (or creates) the journal and returns the records it holds.
    pub fn open(path: impl AsRef<Path>) -> Result<(Self, Vec<(u64, JournalEntry)>)> {
        let path = path.as_ref().to_path_buf();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(RepositoryError::Io(e)),
        };

        let mut entries = Vec::new();
        let mut offset = 0usize;
        while let Some(header) = bytes.get(offset..offset + 4) {
            let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
            let Some(body) = bytes.get(offset + 4..offset + 4 + len) else {
                break;
            };
            match bincode::deserialize::<(u64, JournalEntry)>(body) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!(
                        "Dropping unreadable journal record at offset {}: {}",
                        offset,
                        e
                    );
                    break;
                }
            }
            offset += 4 + len;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(RepositoryError::Io)?;
        if offset < bytes.len() {
            tracing::warn!(
                "Truncating {} trailing journal bytes in {}",
                bytes.len() - offset,
                path.display()
            );
            file.set_len(offset as u64).map_err(RepositoryError::Io)?;
        }

        let journal = Self {
            path,
            file,
            len: offset as u64,
            records: entries.len(),
        };
        Ok((journal, entries))
    }

    /// Appends one record. A failed append leaves the journal as it was.
    pub fn append(&mut self, seq: u64, entry: &JournalEntry) -> Result<()> {
        let body = bincode::serialize(&(seq, entry))
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        let mut record = Vec::with_capacity(4 + body.len());
        record.extend_from_slice(&(body.len() as u32).to_le_bytes());
        record.extend_from_slice(&body);

        if let Err(e) = self.file.write_all(&record) {
            if let Err(truncate) = self.file.set_len(self.len) {
                tracing::error!(
                    "Failed to drop partial journal record in {}: {}",
                    self.path.display(),
                    truncate
                );
            }
            return Err(RepositoryError::Io(e));
        }

        self.len += record.len() as u64;
        self.records += 1;
        Ok(())
    }

    /// Empties the journal once its records are folded into a snapshot.
    pub fn clear(&mut self) -> Result<()> {
        self.file.set_len(0).map_err(RepositoryError::Io)?;
        self.len = 0;
        self.records = 0;
        Ok(())
    }

    pub fn records(&self) -> usize {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::mutation::SetProperty;

    fn property(value: &str) -> JournalEntry {
        JournalEntry::SetProperty(SetProperty {
            key: "next_score_sync".into(),
            value: value.into(),
        })
    }

    #[test]
    fn test_records_come_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.log");
        {
            let (mut journal, entries) = Journal::open(&path).unwrap();
            assert!(entries.is_empty());
            journal.append(1, &property("a")).unwrap();
            journal.append(2, &property("b")).unwrap();
            assert_eq!(journal.records(), 2);
        }

        let (journal, entries) = Journal::open(&path).unwrap();
        assert_eq!(journal.records(), 2);
        assert_eq!(entries, vec![(1, property("a")), (2, property("b"))]);
    }

    #[test]
    fn test_torn_tail_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.log");
        {
            let (mut journal, _) = Journal::open(&path).unwrap();
            journal.append(1, &property("a")).unwrap();
        }
        let intact = fs::metadata(&path).unwrap().len();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[200, 0, 0, 0, 1, 2]).unwrap();
        drop(file);

        let (mut journal, entries) = Journal::open(&path).unwrap();
        assert_eq!(entries, vec![(1, property("a"))]);
        assert_eq!(fs::metadata(&path).unwrap().len(), intact);

        journal.append(2, &property("b")).unwrap();
        let (_, entries) = Journal::open(&path).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_clear_empties_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.log");
        let (mut journal, _) = Journal::open(&path).unwrap();
        journal.append(1, &property("a")).unwrap();

        journal.clear().unwrap();
        journal.append(2, &property("b")).unwrap();

        let (_, entries) = Journal::open(&path).unwrap();
        assert_eq!(entries, vec![(2, property("b"))]);
    }
}
