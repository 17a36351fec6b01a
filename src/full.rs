//! Handles the encoding of whole buffers. This module feeds the input to a
//! stream in chunks and collects the output until the stream ends.

use crate::error::{Error, Result};
use crate::stream::{Flush, Status, Stream, StreamBuffers};
use crate::Context;

/// The size of the output chunks used by the buffer helpers.
pub const CHUNK_SIZE: usize = 1 << 16;

/// Compress 'input' into a complete stream.
pub fn compress_buffer(input: &[u8], ctx: Context) -> Result<Vec<u8>> {
    compress_chunked(input, ctx, input.len(), CHUNK_SIZE)
}

/// Decompress a complete stream.
pub fn decompress_buffer(input: &[u8], block_size: usize) -> Result<Vec<u8>> {
    decompress_chunked(input, block_size, input.len(), CHUNK_SIZE)
}

/// Compress 'input', handing the stream at most 'in_chunk' input bytes and
/// 'out_chunk' bytes of output room per call.
pub fn compress_chunked(
    input: &[u8],
    ctx: Context,
    in_chunk: usize,
    out_chunk: usize,
) -> Result<Vec<u8>> {
    let mut stream = Stream::compressor(ctx)?;
    let mut output = Vec::new();
    let mut chunk = vec![0; out_chunk.max(1)];
    let in_chunk = in_chunk.max(1);
    let mut pos = 0;

    loop {
        let end = input.len().min(pos + in_chunk);
        // Only the call that sees the last input byte may finish.
        let flush = if end == input.len() {
            Flush::Finish
        } else {
            Flush::None
        };
        let mut io = StreamBuffers::new(&input[pos..end], &mut chunk);
        let status = stream.compress(&mut io, flush)?;
        pos += io.consumed();
        output.extend_from_slice(io.output());
        if status == Status::StreamEnd {
            break;
        }
    }

    log::debug!("Compressed {} bytes into {}", input.len(), output.len());
    Ok(output)
}

/// Decompress 'input', handing the stream at most 'in_chunk' input bytes and
/// 'out_chunk' bytes of output room per call. A stream that is cut before
/// its end of stream marker reports NeedMoreInput.
pub fn decompress_chunked(
    input: &[u8],
    block_size: usize,
    in_chunk: usize,
    out_chunk: usize,
) -> Result<Vec<u8>> {
    let mut stream = Stream::decompressor(block_size)?;
    let mut output = Vec::new();
    let mut chunk = vec![0; out_chunk.max(1)];
    let in_chunk = in_chunk.max(1);
    let mut pos = 0;

    loop {
        let end = input.len().min(pos + in_chunk);
        let mut io = StreamBuffers::new(&input[pos..end], &mut chunk);
        let status = stream.decompress(&mut io)?;
        let stalled = io.consumed() == 0 && io.produced() == 0;
        pos += io.consumed();
        output.extend_from_slice(io.output());
        if status == Status::StreamEnd {
            break;
        }
        if stalled && pos == input.len() && !stream.has_pending_output() {
            return Err(Error::NeedMoreInput);
        }
    }

    log::debug!("Decompressed {} bytes into {}", input.len(), output.len());
    Ok(output)
}
