//! Units of work exchanged with the store.

use board_core::{ArchiveId, HighscoreableId, RawScore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One slot of the new board. Players are referenced by their remote id and
/// resolved (or created) by the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRow {
    pub rank: usize,
    pub tied_rank: usize,
    pub entry: RawScore,
}

/// A run not archived yet for this category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewArchive {
    pub entry: RawScore,
    pub cheated: bool,
}

/// Everything one entity's sync changes, applied atomically.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardCommit {
    pub key: HighscoreableId,
    pub synced_at: DateTime<Utc>,
    /// Complete new board; rows beyond its length are removed.
    pub rows: Vec<CommitRow>,
    pub new_archives: Vec<NewArchive>,
    /// Replay ids of archived runs now known to be cheated.
    pub flag_cheated: Vec<u64>,
}

impl BoardCommit {
    pub fn new(key: HighscoreableId, synced_at: DateTime<Utc>) -> Self {
        Self {
            key,
            synced_at,
            rows: Vec::new(),
            new_archives: Vec::new(),
            flag_cheated: Vec::new(),
        }
    }
}

/// What a successful commit changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Ids of the archives (and pending demos) created, in board order.
    pub new_archives: Vec<ArchiveId>,
    pub new_players: usize,
    pub renamed_players: usize,
    pub flagged: usize,
    pub removed_rows: usize,
}
