use std::alloc;
use std::alloc::Layout;

use thiserror::Error;

/// Failure to obtain memory for a data segment.
#[derive(Debug, Error, PartialEq)]
pub enum DataAllocatorError {
    /// The segment size and sample alignment do not make a valid layout.
    #[error("Invalid layout for a data segment: {0}")]
    LayoutError(core::alloc::LayoutError),

    /// The system could not provide the memory.
    #[error("Out of memory for a data segment")]
    NullPointer,
}

/// Source of the memory behind image data blocks.
///
/// # Safety
///
/// The allocator must be thread-safe: segments are shared between threads and released by
/// whichever thread drops the last reference.
pub trait DataAllocator: Clone + Send + Sync + 'static {
    /// Allocates zero-initialized memory with the given layout.
    fn alloc(&self, layout: Layout) -> Result<*mut u8, DataAllocatorError>;

    /// Deallocates memory previously returned by [`DataAllocator::alloc`] with the same layout.
    fn dealloc(&self, ptr: *mut u8, layout: Layout);
}

/// Zero-filled blocks from the global allocator.
#[derive(Clone, Debug, Default)]
pub struct CpuAllocator;

impl DataAllocator for CpuAllocator {
    /// New images start with all samples zero, so the block is zero-filled.
    fn alloc(&self, layout: Layout) -> Result<*mut u8, DataAllocatorError> {
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        if ptr.is_null() {
            Err(DataAllocatorError::NullPointer)?
        }
        Ok(ptr)
    }

    /// Returns the block to the global allocator. Null pointers are ignored.
    ///
    /// # Safety
    ///
    /// The pointer must come from [`CpuAllocator::alloc`] with the same layout.
    #[allow(clippy::not_unsafe_ptr_arg_deref)]
    fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if !ptr.is_null() {
            unsafe { alloc::dealloc(ptr, layout) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_allocator() -> Result<(), DataAllocatorError> {
        let allocator = CpuAllocator;
        let layout = Layout::from_size_align(1024, 64).map_err(DataAllocatorError::LayoutError)?;
        let ptr = allocator.alloc(layout)?;
        let zeroed = unsafe { std::slice::from_raw_parts(ptr, 1024) };
        assert!(zeroed.iter().all(|&b| b == 0));
        allocator.dealloc(ptr, layout);
        Ok(())
    }
}
