//! The streaming engine. A 'Stream' turns a sequence of calls with arbitrary
//! input chunks and output buffers into a sequence of framed blocks (when
//! compressing) or back into the original bytes (when decompressing).
//!
//! Each call advances the stream by at most one block. Partial headers,
//! partial block bodies and output that does not fit into the caller buffer
//! are kept in the stream state, so the next call picks up where the last one
//! stopped.

use std::sync::Arc;

use crate::alloc::{default_allocator, Allocator};
use crate::block::{decompress_block, encode_frame, max_framed_size};
use crate::error::{Error, Result};
use crate::header::{
    match_signature, stream_block_size, BlockHeader, BlockType, BLOCK_MAGIC,
    HEADER_SIZE,
};
use crate::state::{Block, Phase, Source, StreamState};
use crate::{Context, BEST_COMPRESSION, MAX_BLOCK_SIZE};

/// How eagerly the compressor emits a partial block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flush {
    /// Wait until a full block of input is available.
    #[default]
    None,
    /// Emit whatever input is available as a block now.
    Sync,
    /// Emit the remaining input and terminate the stream.
    Finish,
}

/// The outcome of a successful call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Progress was made, call again.
    Ok,
    /// The end of the stream was reached.
    StreamEnd,
}

/// The direction of a stream. It never changes for the life of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Compress,
    Decompress,
}

/// The caller side of a call: the input that is left to read and the room
/// that is left on the output.
pub struct StreamBuffers<'a> {
    input: &'a [u8],
    output: &'a mut [u8],
    /// The number of input bytes consumed.
    in_pos: usize,
    /// The number of output bytes written.
    out_pos: usize,
}

impl<'a> StreamBuffers<'a> {
    pub fn new(input: &'a [u8], output: &'a mut [u8]) -> Self {
        Self {
            input,
            output,
            in_pos: 0,
            out_pos: 0,
        }
    }

    /// The number of input bytes that were not consumed yet.
    pub fn avail_in(&self) -> usize {
        self.input.len() - self.in_pos
    }

    /// The number of output bytes that were not written yet.
    pub fn avail_out(&self) -> usize {
        self.output.len() - self.out_pos
    }

    /// The input that was not consumed yet.
    pub fn next_in(&self) -> &'a [u8] {
        &self.input[self.in_pos..]
    }

    /// The output room that was not written yet.
    pub fn next_out(&mut self) -> &mut [u8] {
        &mut self.output[self.out_pos..]
    }

    pub fn consumed(&self) -> usize {
        self.in_pos
    }

    pub fn produced(&self) -> usize {
        self.out_pos
    }

    /// The bytes that were written to the output.
    pub fn output(&self) -> &[u8] {
        &self.output[..self.out_pos]
    }
}

/// What a phase handler wants the engine to do next.
enum Step {
    /// Run the handler of the new phase.
    Next,
    /// Return to the caller.
    Done(Status),
}

/// A compression or decompression stream.
pub struct Stream {
    mode: Mode,
    ctx: Context,
    state: StreamState,
    allocator: Arc<dyn Allocator>,
    total_in: u64,
    total_out: u64,
    /// The diagnostic of the last error.
    message: Option<String>,
}

impl Stream {
    /// Creates a compression stream.
    pub fn compressor(ctx: Context) -> Result<Self> {
        Self::with_allocator(Mode::Compress, ctx, default_allocator())
    }

    /// Creates a decompression stream that accepts blocks of up to
    /// 'block_size' bytes.
    pub fn decompressor(block_size: usize) -> Result<Self> {
        let ctx = Context::new(BEST_COMPRESSION, block_size);
        Self::with_allocator(Mode::Decompress, ctx, default_allocator())
    }

    /// Creates a stream whose buffers come from 'allocator'.
    pub fn with_allocator(
        mode: Mode,
        ctx: Context,
        allocator: Arc<dyn Allocator>,
    ) -> Result<Self> {
        if ctx.block_size() > MAX_BLOCK_SIZE {
            return Err(Error::InvalidArgument("block size too large"));
        }
        let state = StreamState::new(ctx.block_size(), allocator.as_ref())?;
        log::debug!(
            "Created a {:?} stream with block size {}",
            mode,
            ctx.block_size()
        );
        Ok(Self {
            mode,
            ctx,
            state,
            allocator,
            total_in: 0,
            total_out: 0,
            message: None,
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn context(&self) -> Context {
        self.ctx
    }

    /// The size of the blocks of this stream.
    pub fn block_size(&self) -> usize {
        self.ctx.block_size()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Returns true if produced bytes are waiting to be delivered.
    pub fn has_pending_output(&self) -> bool {
        self.state.has_pending_output()
    }

    /// The total number of input bytes consumed.
    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// The total number of output bytes produced.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// The diagnostic of the last failed call.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The number of bytes that the stream state occupies.
    pub fn memory_usage(&self) -> usize {
        self.state.memory_usage()
    }

    /// Go back to the start of a new stream. The buffers are kept, the
    /// totals are not touched.
    pub fn reset(&mut self) {
        self.state.reset();
        self.message = None;
    }

    /// Release the stream and its buffers.
    pub fn end(self) {
        drop(self);
    }

    /// Compress, buffering partial blocks in the stream as needed.
    pub fn compress(
        &mut self,
        io: &mut StreamBuffers,
        flush: Flush,
    ) -> Result<Status> {
        self.compress_with(io, flush, true)
    }

    /// Compress. If 'may_buffer' is false the call fails with NeedMoreInput
    /// instead of keeping a partial block in the stream.
    pub fn compress_with(
        &mut self,
        io: &mut StreamBuffers,
        flush: Flush,
        may_buffer: bool,
    ) -> Result<Status> {
        let res = if self.mode == Mode::Compress {
            self.process(io, flush, may_buffer)
        } else {
            Err(Error::InvalidArgument(
                "compressing function used with a decompressing stream",
            ))
        };
        self.record(res)
    }

    /// Decompress, buffering partial headers and blocks in the stream as
    /// needed.
    pub fn decompress(&mut self, io: &mut StreamBuffers) -> Result<Status> {
        self.decompress_with(io, true)
    }

    /// Decompress. If 'may_buffer' is false the call fails with NeedMoreInput
    /// or NeedMoreOutput unless the next block can be decoded from the caller
    /// buffers at once.
    pub fn decompress_with(
        &mut self,
        io: &mut StreamBuffers,
        may_buffer: bool,
    ) -> Result<Status> {
        let res = if self.mode == Mode::Decompress {
            self.process(io, Flush::None, may_buffer)
        } else {
            Err(Error::InvalidArgument(
                "decompressing function used with a compressing stream",
            ))
        };
        self.record(res)
    }

    /// Skip input until it starts with something that looks like a block
    /// header, after corruption or when joining a stream in the middle. The
    /// header itself is left on the input.
    pub fn find_sync(&mut self, io: &mut StreamBuffers) -> Result<()> {
        let res = self.find_sync_impl(io);
        self.record(res)
    }

    fn find_sync_impl(&mut self, io: &mut StreamBuffers) -> Result<()> {
        if self.mode != Mode::Decompress {
            return Err(Error::InvalidArgument(
                "decompressing function used with a compressing stream",
            ));
        }
        // Not in an error state: decoded data is waiting in the buffer.
        if self.state.has_pending_output() {
            return Ok(());
        }
        if io.avail_in() < HEADER_SIZE {
            return Err(Error::NeedMoreInput);
        }

        // Drop any partial header.
        self.state.header.clear();

        while io.avail_in() >= HEADER_SIZE {
            let window = io.next_in();
            if match_signature(window, &BLOCK_MAGIC)
                && stream_block_size(window) != 0
            {
                log::debug!("Found a sync point at offset {}", self.total_in);
                self.state.input.clear();
                self.state.phase = Phase::AwaitingHeader;
                return Ok(());
            }
            self.in_seek(io, 1);
        }
        Err(Error::NoSyncPoint)
    }

    fn record<T>(&mut self, res: Result<T>) -> Result<T> {
        if let Err(err) = &res {
            if err.is_corruption() {
                log::warn!("{} (at input offset {})", err, self.total_in);
            }
            self.message = Some(err.to_string());
        }
        res
    }

    fn in_seek(&mut self, io: &mut StreamBuffers, size: usize) {
        debug_assert!(size <= io.avail_in());
        io.in_pos += size;
        self.total_in += size as u64;
    }

    fn out_seek(&mut self, io: &mut StreamBuffers, size: usize) {
        debug_assert!(size <= io.avail_out());
        io.out_pos += size;
        self.total_out += size as u64;
    }

    /// Advance the stream by at most one block.
    fn process(
        &mut self,
        io: &mut StreamBuffers,
        flush: Flush,
        may_buffer: bool,
    ) -> Result<Status> {
        loop {
            let phase = self.state.phase;
            let step = match phase {
                Phase::DeliveringOutput { last } => {
                    self.deliver_output(io, last)
                }
                Phase::AwaitingHeader => match self.mode {
                    Mode::Decompress => self.read_header(io, may_buffer)?,
                    Mode::Compress => self.next_chunk(io, flush, may_buffer)?,
                },
                Phase::AwaitingBody(block) => {
                    self.assemble_body(io, block, flush)
                }
                Phase::Transforming(block, source) => match self.mode {
                    Mode::Decompress => self.decode_block(io, block, source)?,
                    Mode::Compress => {
                        self.encode_block(io, block, source, flush)?
                    }
                },
                Phase::Ended => self.ended(io)?,
            };
            if let Step::Done(status) = step {
                return Ok(status);
            }
        }
    }

    /// Copy as much of the buffered output as fits into the caller output.
    fn deliver_output(&mut self, io: &mut StreamBuffers, last: bool) -> Step {
        let size = self.state.output.drain_into(io.next_out());
        self.out_seek(io, size);
        if self.state.output.pending() > 0 {
            return Step::Done(Status::Ok);
        }
        self.state.output.clear();
        if last {
            self.state.phase = Phase::Ended;
            return Step::Done(Status::StreamEnd);
        }
        self.state.phase = Phase::AwaitingHeader;
        Step::Done(Status::Ok)
    }

    /// Check the sizes that a header declares before trusting them.
    fn validate(&self, header: BlockHeader) -> Result<Block> {
        let capacity = self.state.capacity();
        if header.block_size as usize > self.ctx.block_size() {
            return Err(Error::CorruptIllegalSize {
                field: "block",
                size: header.block_size,
            });
        }
        if header.original as usize > capacity {
            return Err(Error::CorruptIllegalSize {
                field: "decompressed",
                size: header.original,
            });
        }
        if header.compressed as usize > capacity {
            return Err(Error::CorruptIllegalSize {
                field: "stream",
                size: header.compressed,
            });
        }
        Ok(Block {
            block_type: header.block_type,
            stream_size: header.compressed as usize,
            decoded_size: header.original as usize,
        })
    }

    /// Decompression: read the next header, from the caller input if it is
    /// there in one piece or else through the header buffer.
    fn read_header(
        &mut self,
        io: &mut StreamBuffers,
        may_buffer: bool,
    ) -> Result<Step> {
        let block = if !self.state.header.is_empty()
            || io.avail_in() < HEADER_SIZE
        {
            if self.state.header.is_empty() && !may_buffer {
                return Err(Error::NeedMoreInput);
            }
            let taken = self.state.header.fill_from(io.next_in());
            self.in_seek(io, taken);
            if !self.state.header.is_complete() {
                return Ok(Step::Done(Status::Ok));
            }
            let raw = *self.state.header.bytes();
            self.state.header.clear();
            self.validate(BlockHeader::decode(&raw)?)?
        } else {
            let block = self.validate(BlockHeader::decode(io.next_in())?)?;
            if !may_buffer {
                if io.avail_in() - HEADER_SIZE < block.stream_size {
                    return Err(Error::NeedMoreInput);
                }
                if io.avail_out() < block.decoded_size {
                    return Err(Error::NeedMoreOutput);
                }
            }
            self.in_seek(io, HEADER_SIZE);
            block
        };

        if block.stream_size == 0 && block.decoded_size == 0 {
            log::debug!("Reached the end of stream marker");
            self.state.phase = Phase::Ended;
            return Ok(Step::Done(Status::StreamEnd));
        }

        self.state.input.clear();
        self.state.phase = Phase::AwaitingBody(block);
        Ok(Step::Next)
    }

    /// Compression: the next block is up to one block size of fresh input.
    fn next_chunk(
        &mut self,
        io: &mut StreamBuffers,
        flush: Flush,
        may_buffer: bool,
    ) -> Result<Step> {
        let mut size = self.ctx.block_size();
        if size > io.avail_in() {
            if flush != Flush::None {
                size = io.avail_in();
            } else if !may_buffer {
                return Err(Error::NeedMoreInput);
            }
        }

        self.state.input.clear();
        self.state.phase = Phase::AwaitingBody(Block {
            block_type: BlockType::Compressed,
            stream_size: size,
            decoded_size: 0,
        });
        Ok(Step::Next)
    }

    /// Collect the block body. It is used in place if the caller input holds
    /// all of it, or else it is copied into the input buffer across calls.
    fn assemble_body(
        &mut self,
        io: &mut StreamBuffers,
        block: Block,
        flush: Flush,
    ) -> Step {
        if self.state.input.is_empty() && io.avail_in() >= block.stream_size {
            self.state.phase = Phase::Transforming(block, Source::Input);
            return Step::Next;
        }

        let taken = self.state.input.append(io.next_in(), block.stream_size);
        self.in_seek(io, taken);

        if self.state.input.len() == block.stream_size {
            self.state.phase = Phase::Transforming(block, Source::Buffer);
            return Step::Next;
        }

        // A forced flush cuts the block short.
        if flush != Flush::None {
            let block = Block {
                stream_size: self.state.input.len(),
                ..block
            };
            self.state.phase = Phase::Transforming(block, Source::Buffer);
            return Step::Next;
        }

        Step::Done(Status::Ok)
    }

    /// Decode a complete block, into the caller output if it fits or else
    /// into the output buffer.
    fn decode_block(
        &mut self,
        io: &mut StreamBuffers,
        block: Block,
        source: Source,
    ) -> Result<Step> {
        let size = block.decoded_size;
        let direct = io.avail_out() >= size;
        let state = &mut self.state;

        let payload = match source {
            Source::Input => &io.next_in()[..block.stream_size],
            Source::Buffer => state.input.filled(),
        };
        let res = if direct {
            let out = &mut io.next_out()[..size];
            decompress_block(block.block_type, payload, out)
        } else {
            match state.output.space().get_mut(..size) {
                Some(out) => decompress_block(block.block_type, payload, out),
                None => Err(Error::TransformFailed("decompress")),
            }
        };

        // The body is eaten, even if it could not be decoded.
        if source == Source::Input {
            self.in_seek(io, block.stream_size);
        }
        self.state.input.clear();
        if let Err(err) = res {
            self.state.phase = Phase::AwaitingHeader;
            return Err(err);
        }

        log::trace!(
            "Decoded a {:?} block of {} bytes into {} bytes",
            block.block_type,
            block.stream_size,
            size
        );

        if direct {
            self.out_seek(io, size);
            self.state.phase = Phase::AwaitingHeader;
        } else {
            self.state.output.set_pending(size);
            self.state.phase = Phase::DeliveringOutput { last: false };
        }
        Ok(Step::Done(Status::Ok))
    }

    /// Frame a complete chunk of input, into the caller output if the worst
    /// case fits or else into the output buffer. The end of stream marker
    /// follows if the caller asked to finish and all input is eaten.
    fn encode_block(
        &mut self,
        io: &mut StreamBuffers,
        block: Block,
        source: Source,
        flush: Flush,
    ) -> Result<Step> {
        let len = block.stream_size;
        let rest = match source {
            Source::Input => io.avail_in() - len,
            Source::Buffer => io.avail_in(),
        };
        let finish = flush == Flush::Finish && rest == 0;
        let ctx = self.ctx;
        let state = &mut self.state;

        let input = match source {
            Source::Input => &io.next_in()[..len],
            Source::Buffer => state.input.filled(),
        };
        let direct = io.avail_out() >= max_framed_size(len);
        let res = if direct {
            encode_frame(ctx, input, io.next_out(), finish)
        } else {
            encode_frame(ctx, input, state.output.space(), finish)
        };

        if source == Source::Input {
            self.in_seek(io, len);
        }
        self.state.input.clear();
        let written = match res {
            Ok(written) => written,
            Err(_) => {
                self.state.phase = Phase::AwaitingHeader;
                return Err(Error::TransformFailed("compress"));
            }
        };

        let next = if finish {
            log::debug!("Wrote the end of stream marker");
            Phase::Ended
        } else {
            Phase::AwaitingHeader
        };

        if direct {
            self.out_seek(io, written);
            self.state.phase = next;
        } else if written > 0 {
            self.state.output.set_pending(written);
            self.state.phase = Phase::DeliveringOutput { last: finish };
            return Ok(Step::Done(Status::Ok));
        } else {
            self.state.phase = next;
        }

        if self.state.phase == Phase::Ended {
            return Ok(Step::Done(Status::StreamEnd));
        }
        Ok(Step::Done(Status::Ok))
    }

    /// The stream ended. Decompression keeps reporting the end without
    /// touching the input; compression accepts no new input.
    fn ended(&mut self, io: &mut StreamBuffers) -> Result<Step> {
        if self.mode == Mode::Compress && io.avail_in() > 0 {
            return Err(Error::InvalidArgument("stream already finished"));
        }
        Ok(Step::Done(Status::StreamEnd))
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        self.state.release(self.allocator.as_ref());
    }
}
