//! Repository layer for the persisted leaderboard.
//!
//! Score rows are replaced wholesale per entity on every sync; archive and
//! demo rows are append-only apart from the cheated flag and the demo state.
//! Backends:
//! - [`InMemoryStore`] for tests and dry runs
//! - [`FileStore`] for the binary, a bincode snapshot plus a write journal

mod error;
mod file;
mod journal;
mod memory;
mod mutation;
mod snapshot;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use file::{DEFAULT_COMPACT_AFTER, FileStore};
pub use memory::InMemoryStore;
pub use mutation::{JournalEntry, Mutation, Register, SaveDemo, SetProperty};
pub use snapshot::{SnapshotBackend, StoreSnapshot};
pub use traits::{ArchiveRepository, BoardRepository, PropertyRepository, Store};
pub use types::{BoardCommit, CommitReceipt, CommitRow, NewArchive};
