//! The whole store as one serializable value.
//!
//! Both store backends keep a [`StoreSnapshot`] behind a lock and change it in
//! place. Every write is a [`Mutation`]: it is checked against the live
//! snapshot first and only applied once the check (and, for the file store,
//! the journal append) succeeded, so a failing write leaves nothing behind.

use std::collections::{BTreeMap, HashMap};

use board_core::{
    Archive, ArchiveId, Category, Demo, DemoState, GlobalKey, Highscoreable, HighscoreableId,
    Player, PlayerId, RawScore, Score, UNSET_FRACTION,
};
use serde::{Deserialize, Serialize};

use super::error::{RepositoryError, Result};
use super::mutation::{Mutation, Register, SaveDemo, SetProperty};
use super::traits::{ArchiveRepository, BoardRepository, PropertyRepository};
use super::types::{BoardCommit, CommitReceipt};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub(super) highscoreables: BTreeMap<HighscoreableId, Highscoreable>,
    pub(super) scores: BTreeMap<HighscoreableId, Vec<Score>>,
    pub(super) players: BTreeMap<PlayerId, Player>,
    pub(super) players_by_metanet: BTreeMap<u32, PlayerId>,
    pub(super) archives: BTreeMap<ArchiveId, Archive>,
    pub(super) archives_by_replay: BTreeMap<(Category, u64), ArchiveId>,
    pub(super) demos: BTreeMap<ArchiveId, Demo>,
    pub(super) properties: BTreeMap<String, String>,
    pub(super) next_player_id: u64,
    pub(super) next_archive_id: u64,
    /// Sequence number of the last journal entry folded into this snapshot.
    pub(super) journal_seq: u64,
}

enum Upsert {
    Created,
    Renamed,
    Unchanged,
}

impl StoreSnapshot {
    pub(crate) fn journal_seq(&self) -> u64 {
        self.journal_seq
    }

    pub(crate) fn set_journal_seq(&mut self, seq: u64) {
        self.journal_seq = seq;
    }

    pub fn check_commit(&self, commit: &BoardCommit) -> Result<()> {
        if self.highscoreables.contains_key(&commit.key) {
            Ok(())
        } else {
            Err(RepositoryError::UnknownHighscoreable(commit.key))
        }
    }

    /// Replaces the entity's board and archives its new runs. Callers check
    /// the commit with [`Self::check_commit`] first.
    pub fn apply_commit(&mut self, commit: BoardCommit) -> CommitReceipt {
        let BoardCommit {
            key,
            synced_at,
            rows,
            new_archives,
            flag_cheated,
        } = commit;
        let tab = key.tab();
        let mut receipt = CommitReceipt::default();

        let mut board = Vec::with_capacity(rows.len());
        for row in rows {
            let player_id = self.upsert_player(&row.entry, &mut receipt);
            board.push(Score {
                highscoreable: key,
                rank: row.rank,
                tied_rank: row.tied_rank,
                score: row.entry.score,
                player_id,
                replay_id: row.entry.replay_id,
                tab,
            });
        }
        let previous = self.scores.get(&key).map_or(0, Vec::len);
        receipt.removed_rows = previous.saturating_sub(board.len());
        let has_scores = !board.is_empty();
        self.scores.insert(key, board);

        for new in new_archives {
            let index = (key.category, new.entry.replay_id);
            if self.archives_by_replay.contains_key(&index) {
                continue;
            }
            let player_id = self.upsert_player(&new.entry, &mut receipt);
            self.next_archive_id += 1;
            let id = ArchiveId(self.next_archive_id);
            self.archives.insert(
                id,
                Archive {
                    id,
                    replay_id: new.entry.replay_id,
                    player_id,
                    metanet_id: new.entry.user_id,
                    highscoreable: key,
                    score: new.entry.score,
                    date: synced_at,
                    tab,
                    cheated: new.cheated,
                    fraction: UNSET_FRACTION,
                    framecount: None,
                    gold: None,
                },
            );
            self.archives_by_replay.insert(index, id);
            self.demos.insert(id, Demo::pending(id));
            receipt.new_archives.push(id);
        }

        for replay_id in flag_cheated {
            let archive = self
                .archives_by_replay
                .get(&(key.category, replay_id))
                .and_then(|id| self.archives.get_mut(id));
            if let Some(archive) = archive.filter(|a| !a.cheated) {
                archive.cheated = true;
                receipt.flagged += 1;
            }
        }

        if let Some(entity) = self.highscoreables.get_mut(&key) {
            entity.last_synced = Some(synced_at);
            entity.has_scores = has_scores;
        }

        receipt
    }

    fn upsert_player(&mut self, entry: &RawScore, receipt: &mut CommitReceipt) -> PlayerId {
        let (id, outcome) = match self.players_by_metanet.get(&entry.user_id) {
            Some(id) => {
                let id = *id;
                match self.players.get_mut(&id) {
                    Some(player) if player.name != entry.user_name => {
                        player.name = entry.user_name.clone();
                        (id, Upsert::Renamed)
                    }
                    Some(_) => (id, Upsert::Unchanged),
                    None => {
                        self.players
                            .insert(id, Player::new(id, entry.user_id, &entry.user_name));
                        (id, Upsert::Created)
                    }
                }
            }
            None => {
                self.next_player_id += 1;
                let id = PlayerId(self.next_player_id);
                self.players
                    .insert(id, Player::new(id, entry.user_id, &entry.user_name));
                self.players_by_metanet.insert(entry.user_id, id);
                (id, Upsert::Created)
            }
        };
        match outcome {
            Upsert::Created => receipt.new_players += 1,
            Upsert::Renamed => receipt.renamed_players += 1,
            Upsert::Unchanged => {}
        }
        id
    }

    pub fn is_registered(&self, key: HighscoreableId) -> bool {
        self.highscoreables.contains_key(&key)
    }

    pub fn register(&mut self, entities: Vec<Highscoreable>) -> usize {
        let mut added = 0;
        for entity in entities {
            if !self.highscoreables.contains_key(&entity.key) {
                self.highscoreables.insert(entity.key, entity);
                added += 1;
            }
        }
        added
    }

    /// State of the stored demo of `id`; a missing row counts as pending.
    pub fn demo_state(&self, id: ArchiveId) -> DemoState {
        self.demos.get(&id).map_or(DemoState::Pending, |demo| demo.state)
    }

    pub fn check_demo(&self, id: ArchiveId) -> Result<()> {
        if self.archives.contains_key(&id) {
            Ok(())
        } else {
            Err(RepositoryError::ArchiveNotFound(id))
        }
    }

    /// Writes `demo` if the stored one is still in `expected`.
    pub fn save_demo(
        &mut self,
        demo: Demo,
        expected: DemoState,
        framecount: Option<u32>,
    ) -> bool {
        if self.demo_state(demo.id) != expected {
            return false;
        }
        let Some(archive) = self.archives.get_mut(&demo.id) else {
            return false;
        };
        if let Some(framecount) = framecount {
            archive.record_framecount(framecount);
        }
        self.demos.insert(demo.id, demo);
        true
    }

    pub fn set_property(&mut self, key: String, value: String) {
        self.properties.insert(key, value);
    }
}

/// Lock-guarded access to a snapshot; the repository traits are implemented
/// for every backend on top of it.
pub trait SnapshotBackend: Send + Sync {
    fn read<T>(&self, f: impl FnOnce(&StoreSnapshot) -> T) -> Result<T>;

    /// Checks `mutation` against the live snapshot and applies it in place.
    /// Nothing changes when the check or the backend's own persistence fails.
    fn write<M: Mutation>(&self, mutation: M) -> Result<M::Output>;
}

impl<B: SnapshotBackend> BoardRepository for B {
    fn commit_board(&self, commit: BoardCommit) -> Result<CommitReceipt> {
        self.write(commit)
    }

    fn register(&self, entities: Vec<Highscoreable>) -> Result<usize> {
        self.write(Register(entities))
    }

    fn highscoreable(&self, key: HighscoreableId) -> Result<Option<Highscoreable>> {
        self.read(|snapshot| snapshot.highscoreables.get(&key).cloned())
    }

    fn highscoreables(&self, category: Category) -> Result<Vec<Highscoreable>> {
        self.read(|snapshot| {
            snapshot
                .highscoreables
                .values()
                .filter(|h| h.key.category == category)
                .cloned()
                .collect()
        })
    }

    fn board(&self, key: HighscoreableId) -> Result<Vec<Score>> {
        self.read(|snapshot| snapshot.scores.get(&key).cloned().unwrap_or_default())
    }

    fn scores(&self) -> Result<Vec<Score>> {
        self.read(|snapshot| snapshot.scores.values().flatten().cloned().collect())
    }

    fn players(&self) -> Result<HashMap<PlayerId, Player>> {
        self.read(|snapshot| {
            snapshot
                .players
                .iter()
                .map(|(id, player)| (*id, player.clone()))
                .collect()
        })
    }

    fn find_player(&self, metanet_id: u32) -> Result<Option<Player>> {
        self.read(|snapshot| {
            snapshot
                .players_by_metanet
                .get(&metanet_id)
                .and_then(|id| snapshot.players.get(id))
                .cloned()
        })
    }
}

impl<B: SnapshotBackend> ArchiveRepository for B {
    fn archive(&self, id: ArchiveId) -> Result<Option<Archive>> {
        self.read(|snapshot| snapshot.archives.get(&id).cloned())
    }

    fn find_archive(&self, category: Category, replay_id: u64) -> Result<Option<Archive>> {
        self.read(|snapshot| {
            snapshot
                .archives_by_replay
                .get(&(category, replay_id))
                .and_then(|id| snapshot.archives.get(id))
                .cloned()
        })
    }

    fn archives_of(&self, key: HighscoreableId) -> Result<Vec<Archive>> {
        self.read(|snapshot| {
            snapshot
                .archives
                .values()
                .filter(|a| a.highscoreable == key)
                .cloned()
                .collect()
        })
    }

    fn demo(&self, id: ArchiveId) -> Result<Option<Demo>> {
        self.read(|snapshot| snapshot.demos.get(&id).cloned())
    }

    fn pending_demos(&self) -> Result<Vec<Demo>> {
        self.read(|snapshot| {
            snapshot
                .demos
                .values()
                .filter(|demo| demo.is_pending())
                .cloned()
                .collect()
        })
    }

    fn save_demo(
        &self,
        demo: Demo,
        expected: DemoState,
        framecount: Option<u32>,
    ) -> Result<bool> {
        self.write(SaveDemo {
            demo,
            expected,
            framecount,
        })
    }
}

impl<B: SnapshotBackend> PropertyRepository for B {
    fn property(&self, key: GlobalKey) -> Result<Option<String>> {
        self.read(|snapshot| snapshot.properties.get(key.as_ref()).cloned())
    }

    fn set_property(&self, key: GlobalKey, value: String) -> Result<()> {
        self.write(SetProperty {
            key: key.to_string(),
            value,
        })
    }
}
