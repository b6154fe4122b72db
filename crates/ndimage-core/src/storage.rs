//! Arc-based storage shared by all views of an image.
//!
//! A [`DataSegment`] owns an untyped block of bytes. Cloning it only increments a reference
//! count, so an image and all the views created from it point at the same memory. The block is
//! released when the last clone is dropped, through the release action it was created with.

use std::alloc::Layout;
use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::allocator::{CpuAllocator, DataAllocator, DataAllocatorError};
use crate::error::CoreError;
use crate::sample::Sample;

/// Alignment of segments allocated by this crate, one cache line.
pub const SEGMENT_ALIGNMENT: usize = 64;

type ReleaseFn = Box<dyn FnOnce(NonNull<u8>, usize) + Send + Sync>;

/// Inner block that holds the actual memory.
struct BlockImpl {
    /// Start of the block, non-null.
    ptr: NonNull<u8>,
    /// Length of the block in bytes.
    len: usize,
    /// Frees the memory; taken on drop.
    release: Option<ReleaseFn>,
}

impl Drop for BlockImpl {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release(self.ptr, self.len);
        }
    }
}

// SAFETY: the block is plain bytes; all access goes through raw pointers handed out by
// `DataSegment`, and the release action is `Send + Sync`.
unsafe impl Send for BlockImpl {}

// SAFETY: see above. Synchronizing writes through aliasing views is up to the caller, as for
// any shared buffer.
unsafe impl Sync for BlockImpl {}

/// A reference-counted block of memory holding image samples.
#[derive(Clone)]
pub struct DataSegment {
    inner: Arc<BlockImpl>,
}

impl DataSegment {
    /// Allocates `len` zeroed bytes with the system allocator.
    ///
    /// # Errors
    ///
    /// Returns an error if the size is too large or allocation fails.
    pub fn allocate(len: usize) -> Result<Self, CoreError> {
        Self::allocate_with(CpuAllocator, len)
    }

    /// Allocates `len` zeroed bytes with a custom allocator.
    ///
    /// # Errors
    ///
    /// Returns an error if the size is too large or allocation fails.
    pub fn allocate_with<A: DataAllocator>(allocator: A, len: usize) -> Result<Self, CoreError> {
        if len > isize::MAX as usize - SEGMENT_ALIGNMENT {
            return Err(CoreError::SizeExceedsLimit(len));
        }
        let layout = Layout::from_size_align(len.max(1), SEGMENT_ALIGNMENT)
            .map_err(DataAllocatorError::LayoutError)?;
        let ptr = NonNull::new(allocator.alloc(layout)?).ok_or(DataAllocatorError::NullPointer)?;
        Ok(Self {
            inner: Arc::new(BlockImpl {
                ptr,
                len,
                release: Some(Box::new(move |ptr, _| {
                    allocator.dealloc(ptr.as_ptr(), layout)
                })),
            }),
        })
    }

    /// Takes ownership of a vector of samples without copying.
    pub fn from_vec<T: Sample>(value: Vec<T>) -> Self {
        let mut value = std::mem::ManuallyDrop::new(value);
        let len = value.len();
        let capacity = value.capacity();
        let ptr = NonNull::new(value.as_mut_ptr()).unwrap_or(NonNull::dangling());
        Self {
            inner: Arc::new(BlockImpl {
                ptr: ptr.cast(),
                len: len * std::mem::size_of::<T>(),
                release: Some(Box::new(move |ptr, _| {
                    // SAFETY: ptr, len and capacity come from the vector forgotten above
                    drop(unsafe { Vec::from_raw_parts(ptr.cast::<T>().as_ptr(), len, capacity) });
                })),
            }),
        }
    }

    /// Wraps memory owned by someone else.
    ///
    /// `release` is called exactly once, with `ptr` and `len`, when the last reference is
    /// dropped.
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    /// - `ptr` is valid for reads and writes of `len` bytes until `release` is called
    /// - `ptr` is aligned for the sample type it will be viewed as
    ///
    /// # Errors
    ///
    /// Returns an error if `ptr` is null.
    pub unsafe fn from_raw_parts<F>(ptr: *mut u8, len: usize, release: F) -> Result<Self, CoreError>
    where
        F: FnOnce(NonNull<u8>, usize) + Send + Sync + 'static,
    {
        let ptr = NonNull::new(ptr).ok_or(DataAllocatorError::NullPointer)?;
        Ok(Self {
            inner: Arc::new(BlockImpl {
                ptr,
                len,
                release: Some(Box::new(release)),
            }),
        })
    }

    /// Pointer to the start of the block.
    ///
    /// Writing through it is allowed; the block is shared, so the caller is responsible for
    /// not racing with other views.
    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.inner.ptr.as_ptr()
    }

    /// Length of the block in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len
    }

    /// Returns true if the block has no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    /// Number of handles to this block, including this one.
    #[inline]
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Returns true if this is the only handle to the block.
    #[inline]
    pub fn is_unique(&self) -> bool {
        self.strong_count() == 1
    }

    /// Returns true if both handles refer to the same block.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for DataSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSegment")
            .field("ptr", &self.inner.ptr)
            .field("len", &self.inner.len)
            .field("strong_count", &self.strong_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_allocate() -> Result<(), CoreError> {
        let segment = DataSegment::allocate(100)?;
        assert_eq!(segment.len(), 100);
        assert!(!segment.is_empty());
        assert_eq!(segment.as_ptr() as usize % SEGMENT_ALIGNMENT, 0);
        assert!(segment.is_unique());
        Ok(())
    }

    #[test]
    fn test_shared_handles() -> Result<(), CoreError> {
        let a = DataSegment::allocate(8)?;
        let b = a.clone();
        let c = DataSegment::allocate(8)?;
        assert_eq!(a.strong_count(), 2);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
        drop(b);
        assert!(a.is_unique());
        Ok(())
    }

    #[test]
    fn test_from_vec() {
        let segment = DataSegment::from_vec(vec![1.0_f32, 2.0, 3.0]);
        assert_eq!(segment.len(), 12);
        let second = unsafe { *(segment.as_ptr() as *const f32).add(1) };
        assert_eq!(second, 2.0);
    }

    #[test]
    fn test_release_called_once_by_last_holder() -> Result<(), CoreError> {
        static RELEASED: AtomicUsize = AtomicUsize::new(0);
        let mut data = vec![0u8; 16].into_boxed_slice();
        let ptr = data.as_mut_ptr();
        let segment = unsafe {
            DataSegment::from_raw_parts(ptr, 16, |_, len| {
                assert_eq!(len, 16);
                RELEASED.fetch_add(1, Ordering::SeqCst);
            })?
        };
        let view = segment.clone();
        drop(segment);
        assert_eq!(RELEASED.load(Ordering::SeqCst), 0);
        drop(view);
        assert_eq!(RELEASED.load(Ordering::SeqCst), 1);
        drop(data);
        Ok(())
    }

    #[test]
    fn test_null_pointer() {
        let res = unsafe { DataSegment::from_raw_parts(std::ptr::null_mut(), 0, |_, _| {}) };
        assert!(matches!(
            res,
            Err(CoreError::Allocation(DataAllocatorError::NullPointer))
        ));
    }
}
