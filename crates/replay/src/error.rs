//! Replay codec errors.

use crate::header::PAYLOAD_HEADER_LEN;

/// Errors raised while decoding or encoding replays.
///
/// Every variant except the encoder ones means the payload is corrupt.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("payload is {len} bytes, shorter than the {PAYLOAD_HEADER_LEN}-byte header")]
    TruncatedHeader { len: usize },

    #[error("failed to inflate body: {0}")]
    Inflate(#[source] std::io::Error),

    #[error("failed to deflate streams: {0}")]
    Deflate(#[source] std::io::Error),

    #[error("length table needs {needed} bytes, body has {len}")]
    TruncatedTable { needed: usize, len: usize },

    #[error("block {index} has invalid length {length}")]
    InvalidLength { index: usize, length: i32 },

    #[error("block {index} spans {start}..{end}, past body length {len}")]
    BlockOutOfBounds {
        index: usize,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("block {index} is {len} bytes, shorter than its {header}-byte header")]
    BlockTooShort {
        index: usize,
        len: usize,
        header: usize,
    },

    #[error("header names replay {replay_id} of user {user_id}, not the one requested")]
    HeaderMismatch { replay_id: u32, user_id: u32 },

    #[error("stored stream {index} is cut short")]
    TruncatedStream { index: usize },

    #[error("{len} bytes left after the last stored stream")]
    TrailingBytes { len: usize },

    #[error("no streams to encode")]
    NoStreams,

    #[error("expected {expected} streams, got {actual}")]
    StreamCount { expected: usize, actual: usize },
}

impl CodecError {
    /// Whether the error came from malformed input rather than the encoder.
    pub fn is_corrupt_payload(&self) -> bool {
        !matches!(
            self,
            Self::Deflate(_) | Self::NoStreams | Self::StreamCount { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
