//! Error types for the streaming interface.

use thiserror::Error;

/// Result type alias for stream operations.
pub type Result<T> = core::result::Result<T, Error>;

/// The status values that a stream operation can fail with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Bad buffers or a call that does not match the stream mode.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The call can't complete without more input.
    #[error("need more data on input")]
    NeedMoreInput,

    /// The call can't complete without more room on the output.
    #[error("need more room on output")]
    NeedMoreOutput,

    /// The block header does not start with the magic.
    #[error("corrupted compressed stream (bad magic)")]
    CorruptBadMagic,

    /// The block header carries an unknown block type.
    #[error("corrupted compressed stream (illegal block type 0x{0:02x})")]
    CorruptIllegalType(u8),

    /// The block header declares sizes that don't fit the stream buffers.
    #[error("corrupted compressed stream (illegal {field} size {size})")]
    CorruptIllegalSize { field: &'static str, size: u32 },

    /// The block transform did not produce the declared size.
    #[error("unable to {0} block stream")]
    TransformFailed(&'static str),

    /// Sync recovery ran out of input without finding a header.
    #[error("no flush point found")]
    NoSyncPoint,

    /// The allocator could not provide the stream buffers.
    #[error("out of memory: could not allocate {0} bytes")]
    OutOfMemory(usize),
}

impl Error {
    /// Returns true if retrying with more input or output can succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::NeedMoreInput | Error::NeedMoreOutput)
    }

    /// Returns true if the framing of the compressed stream is invalid.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::CorruptBadMagic
                | Error::CorruptIllegalType(_)
                | Error::CorruptIllegalSize { .. }
        )
    }
}
