//! Error types raised by repository implementations.

use board_core::{ArchiveId, BoardError, HighscoreableId};
use thiserror::Error;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("store lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("unknown highscoreable {0}")]
    UnknownHighscoreable(HighscoreableId),

    #[error("archive {0} not found")]
    ArchiveNotFound(ArchiveId),

    #[error("invalid demo update: {0}")]
    InvalidDemo(#[from] BoardError),
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
