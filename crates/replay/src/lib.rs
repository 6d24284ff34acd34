//! Replay codec.
//!
//! Two formats are handled here:
//!
//! - [`wire`]: the compressed payload served by the remote service, one
//!   block per level with per-frame input bytes.
//! - [`storage`]: the compact form kept in the store, the raw input streams
//!   length-prefixed and deflated.
//!
//! A replay moves from one to the other through [`transcode`].
pub mod error;
pub mod header;
pub mod input;
pub mod storage;
pub mod wire;

pub use error::{CodecError, Result};
pub use header::{BlockHeader, PayloadHeader, ReplayKind};
pub use input::{Buttons, FrameInput, SUICIDE, playable};
pub use wire::{DecodedReplay, LevelBlock};

/// A payload re-encoded for storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transcoded {
    pub header: PayloadHeader,
    pub encoded: Vec<u8>,
    /// Sum of the stream lengths, artifact frames included.
    pub framecount: u32,
}

/// Decodes a remote payload and re-encodes it for storage.
pub fn transcode(payload: &[u8], kind: ReplayKind) -> Result<Transcoded> {
    let decoded = wire::decode_payload(payload, kind)?;
    let header = decoded.header;
    let framecount = decoded.framecount() as u32;
    let encoded = storage::encode(&decoded.into_streams())?;
    Ok(Transcoded {
        header,
        encoded,
        framecount,
    })
}
