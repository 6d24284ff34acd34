//! Compact storage encoding for downloaded demos.
//!
//! The inflated body starts with [`MAGIC`], then the stream count and one
//! length-prefixed stream after another, all lengths `u32` little-endian:
//!
//! ```text
//! [MAGIC][count][len 0][stream 0][len 1][stream 1]...
//! ```
//!
//! The whole body is zlib-compressed at the best level. Bodies without the
//! magic are the legacy format: streams joined with [`SEPARATOR`], which
//! cannot carry that byte inside a stream.

use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::error::{CodecError, Result};

/// Marks a length-prefixed body; the last byte is the format version.
pub const MAGIC: [u8; 4] = [0xFF, b'D', b'M', 1];

/// Stream separator of the legacy format.
pub const SEPARATOR: u8 = b'&';

/// Encodes per-level input streams for storage.
pub fn encode<S: AsRef<[u8]>>(streams: &[S]) -> Result<Vec<u8>> {
    if streams.is_empty() {
        return Err(CodecError::NoStreams);
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(&MAGIC).map_err(CodecError::Deflate)?;
    encoder
        .write_u32::<LittleEndian>(streams.len() as u32)
        .map_err(CodecError::Deflate)?;
    for stream in streams {
        let stream = stream.as_ref();
        encoder
            .write_u32::<LittleEndian>(stream.len() as u32)
            .map_err(CodecError::Deflate)?;
        encoder.write_all(stream).map_err(CodecError::Deflate)?;
    }
    encoder.finish().map_err(CodecError::Deflate)
}

/// Decodes a stored demo back into its streams, in either format.
pub fn decode(encoded: &[u8]) -> Result<Vec<Vec<u8>>> {
    let mut body = Vec::new();
    ZlibDecoder::new(encoded)
        .read_to_end(&mut body)
        .map_err(CodecError::Inflate)?;

    match body.strip_prefix(&MAGIC) {
        Some(framed) => decode_framed(framed),
        None => Ok(body
            .split(|byte| *byte == SEPARATOR)
            .map(<[u8]>::to_vec)
            .collect()),
    }
}

fn decode_framed(framed: &[u8]) -> Result<Vec<Vec<u8>>> {
    let mut reader = Cursor::new(framed);
    let count = reader
        .read_u32::<LittleEndian>()
        .map_err(|_| CodecError::TruncatedStream { index: 0 })? as usize;

    let mut streams = Vec::with_capacity(count.min(framed.len()));
    for index in 0..count {
        let len = reader
            .read_u32::<LittleEndian>()
            .map_err(|_| CodecError::TruncatedStream { index })? as usize;
        let start = reader.position() as usize;
        let stream = framed
            .get(start..start + len)
            .ok_or(CodecError::TruncatedStream { index })?;
        streams.push(stream.to_vec());
        reader.set_position((start + len) as u64);
    }

    let trailing = framed.len() - reader.position() as usize;
    if trailing > 0 {
        return Err(CodecError::TrailingBytes { len: trailing });
    }
    Ok(streams)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// xorshift64, enough to spread stream contents over every byte value.
    struct Bytes(u64);

    impl Bytes {
        fn next(&mut self) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0
        }

        fn stream(&mut self) -> Vec<u8> {
            let len = (self.next() % 64) as usize;
            (0..len).map(|_| self.next() as u8).collect()
        }
    }

    fn deflate(body: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(body).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_story_streams_survive_storage() {
        let streams: Vec<Vec<u8>> = (0..25u8).map(|i| vec![0, i % 8, 4, 12]).collect();
        let encoded = encode(&streams).unwrap();
        assert_eq!(decode(&encoded).unwrap(), streams);
    }

    #[test]
    fn test_empty_stream_is_kept() {
        let streams = vec![vec![1u8, 2], vec![], vec![3]];
        assert_eq!(decode(&encode(&streams).unwrap()).unwrap(), streams);
    }

    #[test]
    fn test_separator_and_magic_bytes_survive() {
        let streams = vec![vec![SEPARATOR, 1], MAGIC.to_vec(), vec![SEPARATOR; 3]];
        assert_eq!(decode(&encode(&streams).unwrap()).unwrap(), streams);
    }

    #[test]
    fn test_arbitrary_streams_survive_storage() {
        let mut bytes = Bytes(0x9E37_79B9_7F4A_7C15);
        for _ in 0..500 {
            let count = 1 + (bytes.next() % 8) as usize;
            let streams: Vec<Vec<u8>> = (0..count).map(|_| bytes.stream()).collect();
            assert_eq!(decode(&encode(&streams).unwrap()).unwrap(), streams);
        }
    }

    #[test]
    fn test_decodes_legacy_separator_format() {
        let legacy = deflate(b"\x00\x04&\x01\x02\x03&");
        assert_eq!(
            decode(&legacy).unwrap(),
            vec![vec![0u8, 4], vec![1, 2, 3], vec![]]
        );
    }

    #[test]
    fn test_rejects_nothing() {
        let none: Vec<Vec<u8>> = Vec::new();
        let err = encode(&none).unwrap_err();
        assert!(matches!(err, CodecError::NoStreams));
        assert!(!err.is_corrupt_payload());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode(b"not zlib"), Err(CodecError::Inflate(_))));
    }

    #[test]
    fn test_decode_rejects_cut_and_padded_bodies() {
        let mut body = MAGIC.to_vec();
        body.extend_from_slice(&2u32.to_le_bytes());
        body.extend_from_slice(&3u32.to_le_bytes());
        body.extend_from_slice(&[1, 2, 3]);
        body.extend_from_slice(&5u32.to_le_bytes());
        body.push(9);
        assert!(matches!(
            decode(&deflate(&body)),
            Err(CodecError::TruncatedStream { index: 1 })
        ));

        let mut body = MAGIC.to_vec();
        body.extend_from_slice(&1u32.to_le_bytes());
        body.extend_from_slice(&1u32.to_le_bytes());
        body.extend_from_slice(&[1, 2]);
        let err = decode(&deflate(&body)).unwrap_err();
        assert!(matches!(err, CodecError::TrailingBytes { len: 1 }));
        assert!(err.is_corrupt_payload());
    }
}
