//! Error types surfaced by the runtime.
//!
//! [`SyncError`] is the per-entity boundary: whatever goes wrong while syncing
//! one highscoreable or one demo is converted into it, logged and skipped.
//! [`RuntimeError`] covers building and shutting down the runtime itself.

use board_core::{BoardError, HighscoreableId};
use replay::CodecError;
use thiserror::Error;

use crate::fetch::FetchError;
use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Why one entity's sync (or one demo download) was abandoned this cycle.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("session expired: {0}")]
    SessionExpired(String),

    #[error("not found on the remote service")]
    NotFound,

    #[error("all session credentials exhausted")]
    CredentialsExhausted,

    #[error("corrupt payload: {0}")]
    CorruptPayload(String),

    /// The atomic commit failed and was rolled back.
    #[error("persistence failed: {0}")]
    Persistence(#[from] RepositoryError),

    #[error("store task failed: {0}")]
    StoreTask(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Board(#[from] BoardError),

    #[error("cancelled by shutdown")]
    Cancelled,
}

impl From<FetchError> for SyncError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::SessionExpired(ticket) => Self::SessionExpired(ticket),
            FetchError::NotFound => Self::NotFound,
            FetchError::CredentialsExhausted => Self::CredentialsExhausted,
            FetchError::Malformed(reason) => Self::CorruptPayload(reason),
            FetchError::Cancelled => Self::Cancelled,
            other @ (FetchError::Transport(_)
            | FetchError::UnexpectedStatus(_)
            | FetchError::RetriesExhausted(_)) => Self::Transport(other.to_string()),
        }
    }
}

impl From<CodecError> for SyncError {
    fn from(err: CodecError) -> Self {
        Self::CorruptPayload(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime requires a {0} before building")]
    MissingComponent(&'static str),

    #[error("no session credentials configured")]
    NoCredentials,

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("failed to set up transport: {0}")]
    Transport(#[source] FetchError),

    #[error("sync of {key} failed: {source}")]
    Sync {
        key: HighscoreableId,
        #[source]
        source: SyncError,
    },

    #[error("demo backfill failed: {0}")]
    Backfill(#[source] SyncError),

    #[error("worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}
