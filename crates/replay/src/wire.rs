//! Replay payloads as served by the remote service.
//!
//! ```text
//! payload := header(16) zlib(body)
//! header  := u32 query_type, u32 replay_id, u32 level_id, u32 user_id
//!
//! level   body := block
//! episode body := u32 magic, i32 len[5],  block[5]
//! story   body := u32 magic, i32 total, i32 len[25], block[25]
//! block        := block header (30 bytes solo) + one byte per frame
//! ```
//!
//! For levels, the block header's size field doubles as the length table.

use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::error::{CodecError, Result};
use crate::header::{
    BLOCK_HEADER_BASE_LEN, BlockHeader, EPISODE_MAGIC, PAYLOAD_HEADER_LEN, PayloadHeader,
    ReplayKind, STORY_MAGIC,
};

/// One level's worth of a replay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelBlock {
    pub header: BlockHeader,
    /// Per-frame input bytes, first (artifact) frame included.
    pub inputs: Vec<u8>,
}

/// A fully decoded replay payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedReplay {
    pub header: PayloadHeader,
    pub blocks: Vec<LevelBlock>,
}

impl DecodedReplay {
    /// Total number of input bytes across blocks.
    pub fn framecount(&self) -> usize {
        self.blocks.iter().map(|block| block.inputs.len()).sum()
    }

    pub fn into_streams(self) -> Vec<Vec<u8>> {
        self.blocks.into_iter().map(|block| block.inputs).collect()
    }
}

/// Decodes a raw payload into its per-level input streams.
pub fn decode(payload: &[u8], kind: ReplayKind) -> Result<Vec<Vec<u8>>> {
    decode_payload(payload, kind).map(DecodedReplay::into_streams)
}

/// Decodes a raw payload, keeping the headers.
pub fn decode_payload(payload: &[u8], kind: ReplayKind) -> Result<DecodedReplay> {
    if payload.len() < PAYLOAD_HEADER_LEN {
        return Err(CodecError::TruncatedHeader { len: payload.len() });
    }
    let (head, compressed) = payload.split_at(PAYLOAD_HEADER_LEN);
    let header = PayloadHeader::read_from(&mut Cursor::new(head))
        .map_err(|_| CodecError::TruncatedHeader { len: payload.len() })?;

    let mut body = Vec::new();
    ZlibDecoder::new(compressed)
        .read_to_end(&mut body)
        .map_err(CodecError::Inflate)?;

    Ok(DecodedReplay {
        header,
        blocks: split_blocks(&body, kind)?,
    })
}

/// Splits an inflated body into blocks using its length table.
fn split_blocks(body: &[u8], kind: ReplayKind) -> Result<Vec<LevelBlock>> {
    let table_start = kind.length_table_offset();
    let table_end = table_start + 4 * kind.block_count();
    if body.len() < table_end {
        return Err(CodecError::TruncatedTable {
            needed: table_end,
            len: body.len(),
        });
    }

    let mut table = Cursor::new(&body[table_start..table_end]);
    let mut offset = kind.blocks_offset();
    let mut blocks = Vec::with_capacity(kind.block_count());

    for index in 0..kind.block_count() {
        let length = table
            .read_i32::<LittleEndian>()
            .map_err(|_| CodecError::TruncatedTable {
                needed: table_end,
                len: body.len(),
            })?;
        if length < 0 {
            return Err(CodecError::InvalidLength { index, length });
        }

        let end = offset + length as usize;
        if end > body.len() {
            return Err(CodecError::BlockOutOfBounds {
                index,
                start: offset,
                end,
                len: body.len(),
            });
        }
        blocks.push(parse_block(index, &body[offset..end])?);
        offset = end;
    }

    Ok(blocks)
}

fn parse_block(index: usize, block: &[u8]) -> Result<LevelBlock> {
    let too_short = |header| CodecError::BlockTooShort {
        index,
        len: block.len(),
        header,
    };

    let header = BlockHeader::read_from(&mut Cursor::new(block))
        .map_err(|_| too_short(BLOCK_HEADER_BASE_LEN))?;
    let header_len = header.header_len();
    if block.len() < header_len {
        return Err(too_short(header_len));
    }

    Ok(LevelBlock {
        header,
        inputs: block[header_len..].to_vec(),
    })
}

/// Builds a payload in the remote format from per-level input streams.
///
/// `header.level_id` names the entity; block level ids are derived from it.
pub fn encode_payload(
    header: &PayloadHeader,
    kind: ReplayKind,
    streams: &[Vec<u8>],
) -> Result<Vec<u8>> {
    if streams.len() != kind.block_count() {
        return Err(CodecError::StreamCount {
            expected: kind.block_count(),
            actual: streams.len(),
        });
    }

    let first_level = match kind {
        ReplayKind::Level => header.level_id,
        _ => header.level_id * kind.block_count() as u32,
    };

    let mut blocks = Vec::with_capacity(streams.len());
    for (index, inputs) in streams.iter().enumerate() {
        let mut block = Vec::new();
        BlockHeader::solo(first_level + index as u32, inputs.len())
            .write_to(&mut block)
            .map_err(CodecError::Deflate)?;
        block.extend_from_slice(inputs);
        blocks.push(block);
    }

    let mut body = Vec::new();
    write_body(&mut body, kind, &blocks).map_err(CodecError::Deflate)?;

    let mut payload = Vec::with_capacity(PAYLOAD_HEADER_LEN + body.len());
    header.write_to(&mut payload).map_err(CodecError::Deflate)?;
    let mut encoder = ZlibEncoder::new(payload, Compression::default());
    encoder.write_all(&body).map_err(CodecError::Deflate)?;
    encoder.finish().map_err(CodecError::Deflate)
}

fn write_body<W: Write>(out: &mut W, kind: ReplayKind, blocks: &[Vec<u8>]) -> std::io::Result<()> {
    match kind {
        ReplayKind::Level => {}
        ReplayKind::Episode => {
            out.write_u32::<LittleEndian>(EPISODE_MAGIC)?;
        }
        ReplayKind::Story => {
            out.write_u32::<LittleEndian>(STORY_MAGIC)?;
            let total: usize = blocks.iter().map(Vec::len).sum();
            out.write_i32::<LittleEndian>(total as i32)?;
        }
    }
    if kind != ReplayKind::Level {
        for block in blocks {
            out.write_i32::<LittleEndian>(block.len() as i32)?;
        }
    }
    for block in blocks {
        out.write_all(block)?;
    }
    Ok(())
}
