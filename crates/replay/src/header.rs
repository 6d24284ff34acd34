//! Fixed-size headers of the wire format.

use std::io::{self, Read, Write};

use board_core::Category;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{CodecError, Result};

/// Size of the uncompressed payload header (4 words).
pub const PAYLOAD_HEADER_LEN: usize = 16;

/// Size of a block header before the per-ninja words.
pub const BLOCK_HEADER_BASE_LEN: usize = 26;

/// Bytes each ninja adds to a block header.
pub const NINJA_WORD_LEN: usize = 4;

/// Block header size of a single-player run.
pub const SOLO_BLOCK_HEADER_LEN: usize = BLOCK_HEADER_BASE_LEN + NINJA_WORD_LEN;

/// Magic word opening an episode body.
pub const EPISODE_MAGIC: u32 = 0xffc0_038e;

/// Magic word opening a story body.
pub const STORY_MAGIC: u32 = 0xff38_00ce;

/// Body layout of a replay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReplayKind {
    Level,
    Episode,
    Story,
}

impl ReplayKind {
    /// Number of level blocks in the body.
    pub const fn block_count(self) -> usize {
        match self {
            Self::Level => 1,
            Self::Episode => 5,
            Self::Story => 25,
        }
    }

    /// Replay type the service writes in the payload header.
    pub const fn replay_type(self) -> u32 {
        match self {
            Self::Episode => 1,
            Self::Level | Self::Story => 0,
        }
    }

    /// Byte offset of the block length table.
    ///
    /// For levels the "table" is the block header's own size field.
    pub const fn length_table_offset(self) -> usize {
        match self {
            Self::Level => 1,
            Self::Episode => 4,
            Self::Story => 8,
        }
    }

    /// Byte offset of the first block.
    pub const fn blocks_offset(self) -> usize {
        match self {
            Self::Level => 0,
            Self::Episode => 24,
            Self::Story => 108,
        }
    }
}

impl From<Category> for ReplayKind {
    fn from(category: Category) -> Self {
        match category {
            Category::Level | Category::Userlevel => Self::Level,
            Category::Episode => Self::Episode,
            Category::Story => Self::Story,
        }
    }
}

/// The four little-endian words preceding the compressed body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PayloadHeader {
    pub query_type: u32,
    pub replay_id: u32,
    pub level_id: u32,
    pub user_id: u32,
}

impl PayloadHeader {
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Self {
            query_type: reader.read_u32::<LittleEndian>()?,
            replay_id: reader.read_u32::<LittleEndian>()?,
            level_id: reader.read_u32::<LittleEndian>()?,
            user_id: reader.read_u32::<LittleEndian>()?,
        })
    }

    /// Checks the header against the replay that was requested.
    pub fn expect(&self, kind: ReplayKind, replay_id: u64, user_id: u32) -> Result<()> {
        if self.query_type != kind.replay_type()
            || u64::from(self.replay_id) != replay_id
            || self.user_id != user_id
        {
            return Err(CodecError::HeaderMismatch {
                replay_id: self.replay_id,
                user_id: self.user_id,
            });
        }
        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.query_type)?;
        writer.write_u32::<LittleEndian>(self.replay_id)?;
        writer.write_u32::<LittleEndian>(self.level_id)?;
        writer.write_u32::<LittleEndian>(self.user_id)?;
        Ok(())
    }
}

/// Header at the start of every level block.
///
/// Layout: `u8 kind, i32 size, i32 version, i32 framecount, i32 level_id,
/// i32 mode, i32 unknown, u8 ninja mask`, then one word per ninja.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    pub kind: u8,
    /// Whole block length, header included.
    pub size: i32,
    pub version: i32,
    pub framecount: i32,
    pub level_id: i32,
    pub mode: i32,
    pub unknown: i32,
    pub mask: u8,
}

impl BlockHeader {
    /// Header for a single-player block carrying `inputs` frames.
    pub fn solo(level_id: u32, inputs: usize) -> Self {
        Self {
            kind: 0,
            size: (SOLO_BLOCK_HEADER_LEN + inputs) as i32,
            version: 1,
            framecount: inputs as i32,
            level_id: level_id as i32,
            mode: 0,
            unknown: 0,
            mask: 1,
        }
    }

    pub fn ninja_count(&self) -> usize {
        self.mask.count_ones() as usize
    }

    /// Bytes from the start of the block to the first input frame.
    pub fn header_len(&self) -> usize {
        BLOCK_HEADER_BASE_LEN + NINJA_WORD_LEN * self.ninja_count()
    }

    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Self {
            kind: reader.read_u8()?,
            size: reader.read_i32::<LittleEndian>()?,
            version: reader.read_i32::<LittleEndian>()?,
            framecount: reader.read_i32::<LittleEndian>()?,
            level_id: reader.read_i32::<LittleEndian>()?,
            mode: reader.read_i32::<LittleEndian>()?,
            unknown: reader.read_i32::<LittleEndian>()?,
            mask: reader.read_u8()?,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u8(self.kind)?;
        writer.write_i32::<LittleEndian>(self.size)?;
        writer.write_i32::<LittleEndian>(self.version)?;
        writer.write_i32::<LittleEndian>(self.framecount)?;
        writer.write_i32::<LittleEndian>(self.level_id)?;
        writer.write_i32::<LittleEndian>(self.mode)?;
        writer.write_i32::<LittleEndian>(self.unknown)?;
        writer.write_u8(self.mask)?;
        for _ in 0..self.ninja_count() {
            writer.write_u32::<LittleEndian>(u32::MAX)?;
        }
        Ok(())
    }
}
