use crate::category::Tab;
use crate::model::{HighscoreableId, PlayerId};
use crate::units::Millis;

/// One entry of a remote score list, before cleaning.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawScore {
    pub user_id: u32,
    pub user_name: String,
    pub score: Millis,
    pub replay_id: u64,
}

impl RawScore {
    pub fn new(user_id: u32, user_name: impl Into<String>, score: i64, replay_id: u64) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
            score: Millis(score),
            replay_id,
        }
    }
}

/// A player's current standing in one slot of an entity's board.
///
/// Exactly one row exists per `(highscoreable, rank)`; rows are overwritten on
/// every sync.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Score {
    pub highscoreable: HighscoreableId,
    pub rank: usize,
    pub tied_rank: usize,
    pub score: Millis,
    pub player_id: PlayerId,
    pub replay_id: u64,
    pub tab: Option<Tab>,
}

impl Score {
    /// Position used by rankings, tie-aware or raw.
    pub const fn position(&self, ties: bool) -> usize {
        if ties { self.tied_rank } else { self.rank }
    }
}
