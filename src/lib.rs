//! A zlib-like streaming interface to FastLZ block compression.
//!
//! Data is framed into independent blocks, each prefixed by a 20-byte header
//! (see [`header`]). The [`stream::Stream`] engine lets callers feed input and
//! drain output in arbitrary chunk sizes across repeated calls.

pub mod alloc;
pub mod block;
pub mod error;
pub mod full;
pub mod header;
pub mod lz;
pub mod state;
pub mod stream;

pub use error::{Error, Result};
pub use stream::{Flush, Status, Stream, StreamBuffers};

/// The version of this library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The default size of each block.
pub const DEFAULT_BLOCK_SIZE: usize = 32768;

/// Blocks smaller than this are never compressed.
pub const MIN_BLOCK_SIZE: usize = 64;

/// The largest block size that a stream accepts.
pub const MAX_BLOCK_SIZE: usize = 1 << 30;

/// zlib compression levels.
pub const NO_COMPRESSION: i32 = 0;
pub const BEST_SPEED: i32 = 1;
pub const BEST_COMPRESSION: i32 = 9;

/// Stores information about the environment.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Context {
    /// Specifies the compression level.
    level: u8,
    /// Specifies the size of each block.
    block_size: usize,
}

impl Context {
    /// Creates a new context. Levels outside of the zlib range (including the
    /// zlib 'default' value -1) select the best compression, and block sizes
    /// are raised to at least MIN_BLOCK_SIZE.
    pub fn new(level: i32, block_size: usize) -> Self {
        let level = if (NO_COMPRESSION..=BEST_COMPRESSION).contains(&level) {
            level as u8
        } else {
            BEST_COMPRESSION as u8
        };
        Self {
            level,
            block_size: block_size.max(MIN_BLOCK_SIZE),
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Maps the zlib level to the FastLZ level (1 or 2).
    pub fn fastlz_level(&self) -> u8 {
        if self.level as i32 <= BEST_SPEED {
            1
        } else {
            2
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(BEST_COMPRESSION, DEFAULT_BLOCK_SIZE)
    }
}

/// A trait that defines the interface for encoding buffers.
pub trait Encoder<'a> {
    /// Creates a new Encoder that reads from 'input' and writes into 'output',
    /// with the encoder context 'ctx'.
    fn new(input: &'a [u8], output: &'a mut [u8], ctx: Context) -> Self;

    /// Encode the whole input buffer and return the number of bytes that were
    /// written into the output buffer, or None if the output does not fit.
    #[must_use]
    fn encode(&mut self) -> Option<usize>;
}

/// A trait that defines the interface for decoding buffers.
pub trait Decoder<'a> {
    /// Creates a new Decoder that reads from 'input' and writes into 'output'.
    fn new(input: &'a [u8], output: &'a mut [u8]) -> Self;

    /// Try to decode the buffer 'input', and return the number of input bytes
    /// that were consumed followed by the number of bytes written, or None,
    /// if the input was invalid.
    #[must_use]
    fn decode(&mut self) -> Option<(usize, usize)>;
}
