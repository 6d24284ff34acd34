//! Persisted leaderboard entities.
//!
//! These are plain rows; storage is the runtime's concern. Score rows are the
//! base truth for rankings, archives and demos are the append-only history.
mod archive;
mod demo;
mod highscoreable;
mod player;
mod property;
mod score;

pub use archive::{Archive, ArchiveId, UNSET_FRACTION};
pub use demo::{Demo, DemoState};
pub use highscoreable::{Highscoreable, HighscoreableId, Mode};
pub use player::{Player, PlayerId};
pub use property::{GlobalKey, GlobalProperty};
pub use score::{RawScore, Score};
