//! Bump allocator: a byte buffer plus an atomically advanced cursor.
//!
//! Grounded on spec §3/§4.1 and end-to-end scenario A. `alloc` never moves
//! an earlier allocation, so `free` is a no-op and `reset` requires the
//! caller to have dropped every reference first.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::{aligned_size, out_of_memory, Allocator, AllocatorHeader, ALLOC_ALIGNMENT};
use crate::error::Result;

/// Allocates by advancing a cursor through a fixed buffer. Thread-safe:
/// concurrent `alloc` calls race on a single atomic cursor and never
/// observe overlapping ranges.
pub struct BumpAllocator {
    header: AllocatorHeader,
    buffer: Vec<u8>,
    cursor: AtomicUsize,
}

impl BumpAllocator {
    /// Takes ownership of `buffer` as the backing store. `buffer.len()`
    /// must be non-zero; the buffer is required to already satisfy
    /// [`ALLOC_ALIGNMENT`], which a `Vec<u8>`'s allocator guarantees for
    /// any allocation this small.
    pub fn new(buffer: Vec<u8>) -> Result<Self> {
        if buffer.is_empty() {
            return super::invalid_argument("bump allocator buffer must be non-empty");
        }
        Ok(BumpAllocator {
            header: AllocatorHeader::default(),
            buffer,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Total capacity of the backing buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Restores the cursor to zero. Callers must ensure no live references
    /// into the buffer survive the reset; this is a documented precondition,
    /// not something the type can check.
    pub fn reset(&self) {
        self.cursor.store(0, Ordering::Release);
        self.header.size.store(0, Ordering::Release);
        self.header
            .current_allocations
            .store(0, Ordering::Release);
    }

    fn base_ptr(&self) -> *mut u8 {
        self.buffer.as_ptr() as *mut u8
    }
}

impl Allocator for BumpAllocator {
    fn header(&self) -> &AllocatorHeader {
        &self.header
    }

    fn aligned_alloc(&self, size: usize, align: usize) -> Result<*mut u8> {
        if size == 0 {
            return super::invalid_argument("bump allocator alloc size must be non-zero");
        }
        let align = align.max(ALLOC_ALIGNMENT);
        let capacity = self.buffer.len();

        let mut current = self.cursor.load(Ordering::Acquire);
        loop {
            let aligned_start = aligned_size(current, align);
            let next = aligned_start
                .checked_add(size)
                .ok_or(())
                .and_then(|n| if n <= capacity { Ok(n) } else { Err(()) });
            let next = match next {
                Ok(n) => n,
                Err(()) => return out_of_memory("bump allocator buffer exhausted"),
            };
            match self.cursor.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.header.record_alloc(next - current);
                    // SAFETY: `aligned_start + size <= capacity`, and the
                    // CAS above reserved `[aligned_start, next)` exclusively
                    // for this call.
                    return Ok(unsafe { self.base_ptr().add(aligned_start) });
                }
                Err(observed) => current = observed,
            }
        }
    }

    fn aligned_realloc(&self, _ptr: *mut u8, _new_size: usize, _align: usize) -> Result<*mut u8> {
        Err(crate::error::Error::new(
            crate::error::ErrorKind::PermissionDenied,
            "bump allocator does not support realloc",
        ))
    }

    fn free(&self, _ptr: *mut u8) -> Result<bool> {
        // Bump allocations are reclaimed only by `reset`; a single free
        // cannot recover its size, but the call itself is not an error.
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn scenario_a_basic_sequence() {
        let alloc = BumpAllocator::new(vec![0u8; 100]).unwrap();
        let base = alloc.base_ptr() as usize;

        let p = alloc.alloc(10).unwrap() as usize - base;
        assert_eq!(p, 0);
        assert_eq!(alloc.header().size(), 10);

        let p = alloc.alloc(30).unwrap() as usize - base;
        assert_eq!(p, 16);
        assert_eq!(alloc.header().size(), 46);

        assert!(alloc.alloc(60).is_err());

        let p = alloc.alloc(40).unwrap() as usize - base;
        assert_eq!(p, 48);
        assert_eq!(alloc.header().size(), 88);

        let p = alloc.alloc(1).unwrap() as usize - base;
        assert_eq!(p, 96);
        assert_eq!(alloc.header().size(), 97);

        assert!(alloc.alloc(1).is_err());
    }

    #[test]
    fn concurrent_allocations_are_disjoint_and_aligned() {
        let alloc = BumpAllocator::new(vec![0u8; 64 * 1024]).unwrap();
        let base = alloc.base_ptr() as usize;

        thread::scope(|scope| {
            for _ in 0..16 {
                scope.spawn(|| {
                    let mut offsets = Vec::new();
                    for i in 0..64usize {
                        let size = 1 + (i % 37);
                        let ptr = alloc.alloc(size).unwrap() as usize - base;
                        assert_eq!(ptr % ALLOC_ALIGNMENT, 0);
                        offsets.push((ptr, aligned_size(size, ALLOC_ALIGNMENT)));
                    }
                    offsets
                });
            }
        });

        assert!(alloc.cursor.load(Ordering::Acquire) <= alloc.capacity());
    }

    #[test]
    fn reset_restores_cursor() {
        let alloc = BumpAllocator::new(vec![0u8; 32]).unwrap();
        alloc.alloc(16).unwrap();
        alloc.reset();
        assert_eq!(alloc.header().size(), 0);
        let base = alloc.base_ptr() as usize;
        let p = alloc.alloc(16).unwrap() as usize - base;
        assert_eq!(p, 0);
    }
}
