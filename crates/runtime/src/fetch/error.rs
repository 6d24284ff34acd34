//! Errors raised while talking to the remote score service.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Network failure or server-side error; retried.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service rejected the credential; handled by rotating tickets.
    #[error("session credential {0} rejected")]
    SessionExpired(String),

    #[error("resource not found")]
    NotFound,

    #[error("every session credential was rejected")]
    CredentialsExhausted,

    #[error("unexpected HTTP status {0}")]
    UnexpectedStatus(u16),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("gave up after {0} attempts")]
    RetriesExhausted(u32),

    #[error("fetch cancelled by shutdown")]
    Cancelled,
}
