//! Reconciles a cleaned board with the persisted history of its entity.

use board_core::{CleanedBoard, HighscoreableId};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::repository::{
    ArchiveRepository, BoardCommit, BoardRepository, CommitReceipt, CommitRow, NewArchive, Result,
};

/// Turns cleaned boards into atomic store commits.
///
/// Runs already archived for the entity's category (by replay id) are not
/// archived again, so diffing the same board twice creates nothing new the
/// second time.
pub struct ArchiveDiffer<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> ArchiveDiffer<'a, S>
where
    S: BoardRepository + ArchiveRepository + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Builds the commit for `cleaned` without applying it.
    pub fn plan(
        &self,
        key: HighscoreableId,
        cleaned: CleanedBoard,
        now: DateTime<Utc>,
    ) -> Result<BoardCommit> {
        let mut commit = BoardCommit::new(key, now);

        for ranked in cleaned.ranked {
            if self
                .store
                .find_archive(key.category, ranked.score.replay_id)?
                .is_none()
            {
                commit.new_archives.push(NewArchive {
                    entry: ranked.score.clone(),
                    cheated: false,
                });
            }
            commit.rows.push(CommitRow {
                rank: ranked.rank,
                tied_rank: ranked.tied_rank,
                entry: ranked.score,
            });
        }

        for entry in cleaned.cheated {
            match self.store.find_archive(key.category, entry.replay_id)? {
                None => commit.new_archives.push(NewArchive {
                    entry,
                    cheated: true,
                }),
                Some(archive) if !archive.cheated => commit.flag_cheated.push(entry.replay_id),
                Some(_) => {}
            }
        }

        Ok(commit)
    }

    /// Plans and commits `cleaned` in one go.
    pub fn apply(
        &self,
        key: HighscoreableId,
        cleaned: CleanedBoard,
        now: DateTime<Utc>,
    ) -> Result<CommitReceipt> {
        let commit = self.plan(key, cleaned, now)?;
        debug!(
            "{}: {} rows, {} new archives, {} to flag",
            key,
            commit.rows.len(),
            commit.new_archives.len(),
            commit.flag_cheated.len()
        );
        self.store.commit_board(commit)
    }
}
