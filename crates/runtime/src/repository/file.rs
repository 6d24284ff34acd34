//! File-backed store.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::error::{RepositoryError, Result};
use super::journal::Journal;
use super::mutation::Mutation;
use super::snapshot::{SnapshotBackend, StoreSnapshot};

const SNAPSHOT_FILE: &str = "store.bin";
const JOURNAL_FILE: &str = "journal.log";

/// Journal records after which the next write folds them into the snapshot.
pub const DEFAULT_COMPACT_AFTER: usize = 1024;

/// Store persisted as a snapshot plus a journal of the writes since.
///
/// # File Format
///
/// - `{base_dir}/store.bin`: the bincode-encoded [`StoreSnapshot`], replaced
///   through `store.bin.tmp` and a rename on compaction
/// - `{base_dir}/journal.log`: one length-prefixed record per write
///
/// A write appends one small record instead of rewriting the store. Opening
/// replays the records newer than the snapshot.
pub struct FileStore {
    path: PathBuf,
    compact_after: usize,
    state: RwLock<FileState>,
}

struct FileState {
    snapshot: StoreSnapshot,
    journal: Journal,
}

impl FileStore {
    /// Open the store under `base_dir`, creating the directory if needed.
    pub fn open(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        fs::create_dir_all(base_dir).map_err(RepositoryError::Io)?;
        let path = base_dir.join(SNAPSHOT_FILE);

        let mut snapshot = if path.exists() {
            let bytes = fs::read(&path).map_err(RepositoryError::Io)?;
            let snapshot: StoreSnapshot = bincode::deserialize(&bytes)
                .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
            tracing::debug!("Loaded store from {}", path.display());
            snapshot
        } else {
            tracing::debug!("Creating new store at {}", path.display());
            StoreSnapshot::default()
        };

        let (journal, entries) = Journal::open(base_dir.join(JOURNAL_FILE))?;
        let mut replayed = 0;
        for (seq, entry) in entries {
            // records already folded in by a compaction that crashed before
            // clearing the journal
            if seq <= snapshot.journal_seq() {
                continue;
            }
            entry.replay(&mut snapshot);
            snapshot.set_journal_seq(seq);
            replayed += 1;
        }
        if replayed > 0 {
            tracing::debug!("Replayed {} journal records", replayed);
        }

        Ok(Self {
            path,
            compact_after: DEFAULT_COMPACT_AFTER,
            state: RwLock::new(FileState { snapshot, journal }),
        })
    }

    /// Compact once the journal holds `records` writes.
    pub fn with_compact_after(mut self, records: usize) -> Self {
        self.compact_after = records.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the live snapshot to disk and empties the journal.
    pub fn compact(&self) -> Result<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        self.compact_locked(&mut state)
    }

    fn compact_locked(&self, state: &mut FileState) -> Result<()> {
        let temp_path = self.path.with_extension("bin.tmp");

        let bytes = bincode::serialize(&state.snapshot)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        fs::write(&temp_path, bytes).map_err(RepositoryError::Io)?;
        fs::rename(&temp_path, &self.path).map_err(RepositoryError::Io)?;
        state.journal.clear()?;

        tracing::debug!("Compacted store into {}", self.path.display());
        Ok(())
    }
}

impl SnapshotBackend for FileStore {
    fn read<T>(&self, f: impl FnOnce(&StoreSnapshot) -> T) -> Result<T> {
        let state = self
            .state
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(f(&state.snapshot))
    }

    fn write<M: Mutation>(&self, mutation: M) -> Result<M::Output> {
        let mut state = self
            .state
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        if !mutation.check(&state.snapshot)? {
            return Ok(mutation.apply(&mut state.snapshot));
        }

        let seq = state.snapshot.journal_seq() + 1;
        state.journal.append(seq, &mutation.clone().into())?;
        let output = mutation.apply(&mut state.snapshot);
        state.snapshot.set_journal_seq(seq);

        if state.journal.records() >= self.compact_after
            && let Err(e) = self.compact_locked(&mut state)
        {
            tracing::warn!("Store compaction failed, journal kept: {}", e);
        }
        Ok(output)
    }
}
