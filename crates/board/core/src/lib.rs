//! Leaderboard rules shared by the sync runtime and offline tools.
//!
//! `board-core` defines the entity model (highscoreables, scores, players,
//! archives, demos), the per-category constant tables, score cleaning and the
//! read-side ranking engine. Everything here is synchronous and free of I/O;
//! fetching and persistence live in the `runtime` crate.
pub mod category;
pub mod cleaning;
pub mod error;
pub mod history;
pub mod model;
pub mod ranking;
pub mod units;

pub use category::{
    Category, DEFAULT_RANKED, MAX_MIN_SCORES, MIN_TIES, PAGE_SIZE, Tab, TabInfo, min_scores,
};
pub use cleaning::{
    CleanedBoard, CleaningRules, LegacyPatch, RankedEntry, ReplayChange, ReplayDeletion,
    ScoreCleaner,
};
pub use error::{BoardError, Result};
pub use history::{BoardChange, board_at, diff_boards, rank_at};
pub use model::{
    Archive, ArchiveId, Demo, DemoState, GlobalKey, GlobalProperty, Highscoreable,
    HighscoreableId, Mode, Player, PlayerId, RawScore, Score, UNSET_FRACTION,
};
pub use ranking::{
    PlayerSummary, RankValue, RankingEngine, RankingEntry, RankingKind, RankingQuery, Spread,
    TieClass, TieEntry,
};
pub use units::Millis;
