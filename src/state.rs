//! The mutable bookkeeping that a stream carries between calls: the phase of
//! the block state machine and the buffers that hold partial headers,
//! partial block bodies and output that did not fit into the caller buffer.

use crate::alloc::Allocator;
use crate::error::Result;
use crate::header::{BlockType, HEADER_SIZE};

/// The worst-case expansion of a block is 1/EXPANSION_RATIO of its size plus
/// EXPANSION_SECURITY bytes.
pub const EXPANSION_RATIO: usize = 10;
pub const EXPANSION_SECURITY: usize = 66;

/// Returns the capacity of the block buffers of a stream with 'block_size'.
/// Every size that a valid header declares fits into this capacity.
pub fn buffer_block_size(block_size: usize) -> usize {
    block_size + block_size / EXPANSION_RATIO + HEADER_SIZE * 2
}

/// The sizes of the block in flight.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub block_type: BlockType,
    /// The number of bytes of the block on the wire. When compressing, this
    /// is the number of uncompressed bytes to read.
    pub stream_size: usize,
    /// The number of bytes of the decoded block. Unknown (zero) when
    /// compressing.
    pub decoded_size: usize,
}

/// Where the body of a complete block is.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// At the front of the caller input (not consumed yet).
    Input,
    /// In the input reassembly buffer.
    Buffer,
}

/// The phase of the stream state machine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No block in flight. The header of the next block is read next
    /// (possibly partially buffered).
    AwaitingHeader,
    /// The block sizes are known and the body is being collected.
    AwaitingBody(Block),
    /// The body is complete and is about to be transformed. This phase never
    /// outlives a single call.
    Transforming(Block, Source),
    /// The output buffer holds bytes that the caller has not received yet.
    /// 'last' is set if the stream ends once they are delivered.
    DeliveringOutput { last: bool },
    /// The end of the stream was reached.
    Ended,
}

/// Reassembles a header that is split across calls.
#[derive(Debug, Default)]
pub struct HeaderBuffer {
    data: [u8; HEADER_SIZE],
    fill: usize,
}

impl HeaderBuffer {
    /// Copy bytes from 'src' until the header is complete. Returns the number
    /// of bytes that were taken.
    pub fn fill_from(&mut self, src: &[u8]) -> usize {
        let size = (HEADER_SIZE - self.fill).min(src.len());
        self.data[self.fill..self.fill + size].copy_from_slice(&src[..size]);
        self.fill += size;
        size
    }

    pub fn is_empty(&self) -> bool {
        self.fill == 0
    }

    pub fn is_complete(&self) -> bool {
        self.fill == HEADER_SIZE
    }

    pub fn len(&self) -> usize {
        self.fill
    }

    pub fn bytes(&self) -> &[u8; HEADER_SIZE] {
        &self.data
    }

    pub fn clear(&mut self) {
        self.fill = 0;
    }
}

/// A fixed capacity buffer with a fill level and a read cursor.
#[derive(Debug)]
pub struct BlockBuffer {
    data: Vec<u8>,
    /// The number of valid bytes.
    len: usize,
    /// The number of valid bytes that were handed out.
    pos: usize,
}

impl BlockBuffer {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            len: 0,
            pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.pos = 0;
    }

    /// Copy bytes from 'src' until the buffer holds 'target' bytes (capped to
    /// the capacity). Returns the number of bytes that were taken.
    pub fn append(&mut self, src: &[u8], target: usize) -> usize {
        let target = target.min(self.capacity());
        let size = target.saturating_sub(self.len).min(src.len());
        self.data[self.len..self.len + size].copy_from_slice(&src[..size]);
        self.len += size;
        size
    }

    /// The valid bytes.
    pub fn filled(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// The whole buffer, for producing new content.
    pub fn space(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Marks the first 'len' bytes as produced and not delivered yet.
    pub fn set_pending(&mut self, len: usize) {
        self.len = len.min(self.capacity());
        self.pos = 0;
    }

    /// The number of produced bytes that were not delivered yet.
    pub fn pending(&self) -> usize {
        self.len - self.pos
    }

    /// Copy as many pending bytes as fit into 'out'. Returns the number of
    /// bytes copied.
    pub fn drain_into(&mut self, out: &mut [u8]) -> usize {
        let size = self.pending().min(out.len());
        out[..size].copy_from_slice(&self.data[self.pos..self.pos + size]);
        self.pos += size;
        size
    }

    /// Give up the storage. The buffer is empty afterwards.
    fn take(&mut self) -> Vec<u8> {
        self.clear();
        std::mem::take(&mut self.data)
    }
}

/// The state that is owned by a stream.
#[derive(Debug)]
pub struct StreamState {
    pub phase: Phase,
    /// The largest number of uncompressed bytes in a block.
    pub block_size: usize,
    /// Holds a header that was split across calls.
    pub header: HeaderBuffer,
    /// Holds a block body that was split across calls.
    pub input: BlockBuffer,
    /// Holds output that did not fit into the caller buffer.
    pub output: BlockBuffer,
}

impl StreamState {
    pub fn new(block_size: usize, allocator: &dyn Allocator) -> Result<Self> {
        let capacity = buffer_block_size(block_size);
        let input = allocator.allocate(capacity)?;
        let output = match allocator.allocate(capacity) {
            Ok(output) => output,
            Err(err) => {
                allocator.release(input);
                return Err(err);
            }
        };
        Ok(Self {
            phase: Phase::AwaitingHeader,
            block_size,
            header: HeaderBuffer::default(),
            input: BlockBuffer::new(input),
            output: BlockBuffer::new(output),
        })
    }

    /// The capacity of the block buffers.
    pub fn capacity(&self) -> usize {
        self.input.capacity()
    }

    /// Go back to the initial phase. The buffers are kept.
    pub fn reset(&mut self) {
        self.phase = Phase::AwaitingHeader;
        self.header.clear();
        self.input.clear();
        self.output.clear();
    }

    pub fn has_pending_output(&self) -> bool {
        matches!(self.phase, Phase::DeliveringOutput { .. })
            && self.output.pending() > 0
    }

    /// The number of bytes that the state occupies, including its buffers.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.input.capacity()
            + self.output.capacity()
    }

    /// Hand the buffers back to the allocator.
    pub fn release(&mut self, allocator: &dyn Allocator) {
        allocator.release(self.input.take());
        allocator.release(self.output.take());
    }
}
