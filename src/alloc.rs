//! The allocator capability used for the stream buffers.

use std::sync::Arc;

use crate::error::{Error, Result};

/// Provides and reclaims the buffers of a stream. Streams that are used on
/// different threads may share one allocator, so implementations must be
/// thread safe.
pub trait Allocator: Send + Sync {
    /// Returns a zeroed buffer of exactly 'size' bytes.
    fn allocate(&self, size: usize) -> Result<Vec<u8>>;

    /// Takes back a buffer that was returned by 'allocate'.
    fn release(&self, buffer: Vec<u8>) {
        drop(buffer);
    }
}

/// Allocates from the global allocator, reporting failures instead of
/// aborting.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultAllocator;

impl Allocator for DefaultAllocator {
    fn allocate(&self, size: usize) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(size)
            .map_err(|_| Error::OutOfMemory(size))?;
        buffer.resize(size, 0);
        Ok(buffer)
    }
}

/// Returns the allocator that streams use unless told otherwise.
pub fn default_allocator() -> Arc<dyn Allocator> {
    Arc::new(DefaultAllocator)
}
