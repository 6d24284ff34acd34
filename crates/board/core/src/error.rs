//! Error types for the pure leaderboard rules.

use crate::model::{ArchiveId, DemoState};

/// Errors raised by board-core operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("demo {id} cannot move from {from} to {to}")]
    InvalidDemoTransition {
        id: ArchiveId,
        from: DemoState,
        to: DemoState,
    },

    #[error("category {0} has no child levels")]
    NoChildLevels(crate::Category),

    #[error("rank {0} is outside the board")]
    RankOutOfRange(usize),
}

pub type Result<T> = std::result::Result<T, BoardError>;
