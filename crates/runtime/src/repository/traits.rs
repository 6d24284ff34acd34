//! Repository contracts for the persisted leaderboard.

use std::collections::HashMap;

use board_core::{
    Archive, ArchiveId, Category, Demo, DemoState, GlobalKey, Highscoreable, HighscoreableId,
    Player, PlayerId, Score,
};

use super::Result;
use super::types::{BoardCommit, CommitReceipt};

/// Highscoreables, their current boards and the players on them.
pub trait BoardRepository: Send + Sync {
    /// Apply one entity's sync as a single unit: either every row change
    /// lands or none does.
    fn commit_board(&self, commit: BoardCommit) -> Result<CommitReceipt>;

    /// Insert entities not known yet. Returns how many were new.
    fn register(&self, entities: Vec<Highscoreable>) -> Result<usize>;

    fn highscoreable(&self, key: HighscoreableId) -> Result<Option<Highscoreable>>;

    fn highscoreables(&self, category: Category) -> Result<Vec<Highscoreable>>;

    /// Current board of `key`, ordered by rank.
    fn board(&self, key: HighscoreableId) -> Result<Vec<Score>>;

    /// Every score row of every entity.
    fn scores(&self) -> Result<Vec<Score>>;

    fn players(&self) -> Result<HashMap<PlayerId, Player>>;

    fn find_player(&self, metanet_id: u32) -> Result<Option<Player>>;
}

/// Append-only archive rows and their demos.
pub trait ArchiveRepository: Send + Sync {
    fn archive(&self, id: ArchiveId) -> Result<Option<Archive>>;

    /// Archive of `replay_id`; replay ids are unique per category.
    fn find_archive(&self, category: Category, replay_id: u64) -> Result<Option<Archive>>;

    fn archives_of(&self, key: HighscoreableId) -> Result<Vec<Archive>>;

    fn demo(&self, id: ArchiveId) -> Result<Option<Demo>>;

    /// Demos still waiting for a payload, oldest first.
    fn pending_demos(&self) -> Result<Vec<Demo>>;

    /// Persist a demo if the stored one is still in `expected`, recording the
    /// replay's frame count on its archive when given. Returns whether the
    /// demo was written.
    fn save_demo(
        &self,
        demo: Demo,
        expected: DemoState,
        framecount: Option<u32>,
    ) -> Result<bool>;
}

/// Scheduling bookkeeping.
pub trait PropertyRepository: Send + Sync {
    fn property(&self, key: GlobalKey) -> Result<Option<String>>;

    fn set_property(&self, key: GlobalKey, value: String) -> Result<()>;
}

/// The full store used by the runtime.
pub trait Store: BoardRepository + ArchiveRepository + PropertyRepository {}

impl<T> Store for T where T: BoardRepository + ArchiveRepository + PropertyRepository {}
