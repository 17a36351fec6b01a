//! Encodes and decodes the 20-byte header that precedes every block:
//!
//! | Offset | Size | Field                   |
//! |--------|------|-------------------------|
//! | 0      | 7    | magic ("FastLZ\0")      |
//! | 7      | 1    | block type              |
//! | 8      | 4    | compressed (wire) size  |
//! | 12     | 4    | original size           |
//! | 16     | 4    | configured block size   |
//!
//! All numbers are little endian. A header with compressed and original
//! sizes of zero marks the end of the stream.

use crate::error::{Error, Result};

/// The size of the block header.
pub const HEADER_SIZE: usize = 20;

/// The magic signature that starts every block (with the terminating zero).
pub const BLOCK_MAGIC: [u8; 7] = *b"FastLZ\0";

const TYPE_RAW: u8 = 0xc0;
const TYPE_COMPRESSED: u8 = 0x0c;

/// Return True if 'input' starts with 'signature'.
pub fn match_signature(input: &[u8], signature: &[u8]) -> bool {
    input.starts_with(signature)
}

/// Write the value 'val' into 'dest' at 'offset'.
fn write32(val: u32, dest: &mut [u8; HEADER_SIZE], offset: usize) {
    dest[offset..offset + 4].copy_from_slice(&val.to_le_bytes());
}

/// Read a number from the header at 'offset'.
fn read32(input: &[u8; HEADER_SIZE], offset: usize) -> u32 {
    let mut bytes = [0; 4];
    bytes.copy_from_slice(&input[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

/// The kind of payload that follows the header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockType {
    /// The payload is a verbatim copy of the data.
    Raw,
    /// The payload is FastLZ compressed.
    Compressed,
}

impl BlockType {
    pub fn from_byte(val: u8) -> Option<Self> {
        match val {
            TYPE_RAW => Some(BlockType::Raw),
            TYPE_COMPRESSED => Some(BlockType::Compressed),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            BlockType::Raw => TYPE_RAW,
            BlockType::Compressed => TYPE_COMPRESSED,
        }
    }
}

/// A decoded block header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    pub block_type: BlockType,
    /// The block size that the producer was configured with.
    pub block_size: u32,
    /// The number of payload bytes on the wire.
    pub compressed: u32,
    /// The number of bytes after decoding the payload.
    pub original: u32,
}

impl BlockHeader {
    pub fn new(
        block_type: BlockType,
        block_size: u32,
        compressed: u32,
        original: u32,
    ) -> Self {
        Self {
            block_type,
            block_size,
            compressed,
            original,
        }
    }

    /// The header that terminates a stream.
    pub fn end_of_stream(block_size: u32) -> Self {
        Self::new(BlockType::Compressed, block_size, 0, 0)
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.compressed == 0 && self.original == 0
    }

    /// Serialize the header.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0; HEADER_SIZE];
        out[..BLOCK_MAGIC.len()].copy_from_slice(&BLOCK_MAGIC);
        out[7] = self.block_type.to_byte();
        write32(self.compressed, &mut out, 8);
        write32(self.original, &mut out, 12);
        write32(self.block_size, &mut out, 16);
        out
    }

    /// Serialize the header into the beginning of 'dest'. Returns the number
    /// of bytes written, or None if 'dest' is too small.
    pub fn write_to(&self, dest: &mut [u8]) -> Option<usize> {
        let slot = dest.get_mut(..HEADER_SIZE)?;
        slot.copy_from_slice(&self.encode());
        Some(HEADER_SIZE)
    }

    /// Decode the header at the start of 'input'.
    pub fn decode(input: &[u8]) -> Result<Self> {
        let raw = header_bytes(input).ok_or(Error::NeedMoreInput)?;
        if !match_signature(raw, &BLOCK_MAGIC) {
            return Err(Error::CorruptBadMagic);
        }
        let block_type = BlockType::from_byte(raw[7])
            .ok_or(Error::CorruptIllegalType(raw[7]))?;
        Ok(Self {
            block_type,
            compressed: read32(raw, 8),
            original: read32(raw, 12),
            block_size: read32(raw, 16),
        })
    }
}

fn header_bytes(input: &[u8]) -> Option<&[u8; HEADER_SIZE]> {
    input.get(..HEADER_SIZE)?.try_into().ok()
}

/// Returns the size of the header.
pub fn header_size() -> usize {
    HEADER_SIZE
}

/// Returns the block size advertised by the header at the start of 'input',
/// or zero if there is no complete header with a valid magic. The block type
/// is not checked.
pub fn stream_block_size(input: &[u8]) -> u32 {
    match header_bytes(input) {
        Some(raw) if match_signature(raw, &BLOCK_MAGIC) => read32(raw, 16),
        _ => 0,
    }
}

/// Returns true if 'input' looks like the start of a compressed stream.
pub fn is_compressed_stream(input: &[u8]) -> bool {
    stream_block_size(input) != 0
}

/// Like 'is_compressed_stream', but reports NeedMoreInput if 'input' is too
/// short to decide.
pub fn probe_stream(input: &[u8]) -> Result<bool> {
    if input.len() < HEADER_SIZE {
        return Err(Error::NeedMoreInput);
    }
    Ok(is_compressed_stream(input))
}
