//! This module handles the encoding and decoding of a single block. Blocks
//! that FastLZ can't shrink (or that are too small to bother) are stored
//! verbatim as RAW blocks, so the output never grows by more than
//! 'max_framed_size'.

use crate::error::{Error, Result};
use crate::header::{BlockHeader, BlockType, HEADER_SIZE};
use crate::lz::{FastLZDecoder, FastLZEncoder};
use crate::state::{EXPANSION_RATIO, EXPANSION_SECURITY};
use crate::{Context, Decoder, Encoder, MIN_BLOCK_SIZE, NO_COMPRESSION};

/// Returns the largest number of bytes that framing 'len' input bytes can
/// produce, including the block header and an end of stream marker.
pub fn max_framed_size(len: usize) -> usize {
    len + len / EXPANSION_RATIO + EXPANSION_SECURITY
}

/// Try to compress 'input' into 'output', but if it's not useful store it
/// verbatim. Returns the block type and the number of payload bytes.
pub fn compress_block(
    ctx: Context,
    input: &[u8],
    output: &mut [u8],
) -> Result<(BlockType, usize)> {
    let len = input.len();
    if len > MIN_BLOCK_SIZE && ctx.level() as i32 != NO_COMPRESSION {
        // Only accept results that are strictly smaller than the input.
        let limit = (len - 1).min(output.len());
        let mut encoder = FastLZEncoder::new(input, &mut output[..limit], ctx);
        if let Some(written) = encoder.encode() {
            return Ok((BlockType::Compressed, written));
        }
    }

    let dest = output.get_mut(..len).ok_or(Error::NeedMoreOutput)?;
    dest.copy_from_slice(input);
    Ok((BlockType::Raw, len))
}

/// Decode the payload of a block into 'output', which must be exactly as
/// long as the decoded block.
pub fn decompress_block(
    block_type: BlockType,
    payload: &[u8],
    output: &mut [u8],
) -> Result<usize> {
    let expected = output.len();
    match block_type {
        BlockType::Raw => {
            if payload.len() != expected {
                return Err(Error::TransformFailed("decompress"));
            }
            output.copy_from_slice(payload);
            Ok(expected)
        }
        BlockType::Compressed => {
            let mut decoder = FastLZDecoder::new(payload, output);
            match decoder.decode() {
                Some((read, written))
                    if read == payload.len() && written == expected =>
                {
                    Ok(written)
                }
                _ => Err(Error::TransformFailed("decompress")),
            }
        }
    }
}

/// Write the framed block for 'input' into 'output': a header followed by
/// the payload, unless 'input' is empty. If 'finish' is set, an end of stream
/// marker follows. Returns the number of bytes written. 'output' must hold at
/// least 'max_framed_size(input.len())' bytes.
pub fn encode_frame(
    ctx: Context,
    input: &[u8],
    output: &mut [u8],
    finish: bool,
) -> Result<usize> {
    let block_size = ctx.block_size() as u32;
    let mut done = 0;

    if !input.is_empty() {
        let payload = output
            .get_mut(HEADER_SIZE..)
            .ok_or(Error::NeedMoreOutput)?;
        let (block_type, written) = compress_block(ctx, input, payload)?;
        let header = BlockHeader::new(
            block_type,
            block_size,
            written as u32,
            input.len() as u32,
        );
        done = header.write_to(output).ok_or(Error::NeedMoreOutput)?;
        done += written;
        log::trace!(
            "Framed a {:?} block of {} bytes into {} bytes",
            block_type,
            input.len(),
            written
        );
    }

    if finish {
        let marker = BlockHeader::end_of_stream(block_size);
        done += marker
            .write_to(&mut output[done..])
            .ok_or(Error::NeedMoreOutput)?;
    }
    Ok(done)
}
