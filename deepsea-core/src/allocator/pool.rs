//! Pool allocator: fixed chunk size and count, lock-free alloc/free.
//!
//! Grounded on `examples/original_source/Core/test/PoolAllocatorTest.cpp`:
//! chunks are handed out in index order on first use (the "lazy init"
//! watermark), and freed chunks form an intrusive singly-linked free list
//! threaded through the chunk buffer itself. This implementation encodes
//! the free-list terminator as `usize::MAX` rather than reusing the
//! watermark value the original stores in-place; the externally observable
//! behavior (alloc order, `free_count + outstanding == chunk_count`,
//! `validate()`) is the same either way — see DESIGN.md.

use std::mem::size_of;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{aligned_size, out_of_memory, Allocator, AllocatorHeader, ALLOC_ALIGNMENT};
use crate::error::Result;

const NIL: usize = usize::MAX;

/// Fixed chunk size and count; supports concurrent alloc/free via CAS on a
/// free-list head.
pub struct PoolAllocator {
    header: AllocatorHeader,
    buffer: Vec<u8>,
    chunk_size: usize,
    chunk_count: usize,
    /// Index of the head free chunk, or [`NIL`] when the free list (below
    /// the lazy-init watermark) is empty.
    head: AtomicUsize,
    /// Number of chunks that have ever been handed out by the lazy-init
    /// path, i.e. the high-water mark of chunks whose free-list link has
    /// ever been written.
    initialized_count: AtomicUsize,
    free_count: AtomicUsize,
}

impl PoolAllocator {
    /// Required buffer size for `chunk_size` chunks aligned to
    /// [`ALLOC_ALIGNMENT`], repeated `chunk_count` times.
    pub fn buffer_size(chunk_size: usize, chunk_count: usize) -> usize {
        aligned_size(chunk_size, ALLOC_ALIGNMENT) * chunk_count
    }

    /// Builds a pool over `buffer`, which must be exactly
    /// [`PoolAllocator::buffer_size`] long and hold at least one chunk.
    pub fn new(chunk_size: usize, chunk_count: usize, buffer: Vec<u8>) -> Result<Self> {
        if chunk_size == 0 || chunk_count == 0 {
            return super::invalid_argument("pool allocator chunk size/count must be non-zero");
        }
        let aligned_chunk_size = aligned_size(chunk_size, ALLOC_ALIGNMENT);
        if aligned_chunk_size < size_of::<usize>() {
            return super::invalid_argument("pool chunk too small to hold a free-list link");
        }
        if buffer.len() != aligned_chunk_size * chunk_count {
            return super::invalid_argument("pool allocator buffer size mismatch");
        }
        Ok(PoolAllocator {
            header: AllocatorHeader::default(),
            buffer,
            chunk_size: aligned_chunk_size,
            chunk_count,
            head: AtomicUsize::new(NIL),
            initialized_count: AtomicUsize::new(0),
            free_count: AtomicUsize::new(chunk_count),
        })
    }

    /// Number of chunks, free or outstanding.
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Chunks currently available for allocation.
    pub fn free_count(&self) -> usize {
        self.free_count.load(Ordering::Acquire)
    }

    fn chunk_ptr(&self, index: usize) -> *mut u8 {
        // SAFETY: `index < chunk_count` is an invariant of every caller in
        // this module.
        unsafe { (self.buffer.as_ptr() as *mut u8).add(index * self.chunk_size) }
    }

    fn read_link(&self, index: usize) -> usize {
        // SAFETY: a free chunk's first machine word is only ever read after
        // it was written by `free`, and only while it remains on the free
        // list (no concurrent writer touches a chunk after it's popped).
        unsafe { (self.chunk_ptr(index) as *const usize).read() }
    }

    fn write_link(&self, index: usize, link: usize) {
        unsafe { (self.chunk_ptr(index) as *mut usize).write(link) }
    }

    fn chunk_index_of(&self, ptr: *mut u8) -> Option<usize> {
        let base = self.buffer.as_ptr() as usize;
        let addr = ptr as usize;
        if addr < base {
            return None;
        }
        let offset = addr - base;
        if offset % self.chunk_size != 0 {
            return None;
        }
        let index = offset / self.chunk_size;
        if index >= self.chunk_count {
            return None;
        }
        Some(index)
    }

    /// Walks the free list and confirms every invariant: each free chunk is
    /// reachable exactly once, and `free_count + outstanding == chunk_count`.
    pub fn validate(&self) -> bool {
        let mut seen = vec![false; self.chunk_count];
        let mut count = 0usize;
        let mut cur = self.head.load(Ordering::Acquire);
        while cur != NIL {
            if cur >= self.chunk_count || seen[cur] {
                return false;
            }
            seen[cur] = true;
            count += 1;
            if count > self.chunk_count {
                return false;
            }
            cur = self.read_link(cur);
        }
        count == self.free_count.load(Ordering::Acquire)
    }

    /// Re-initializes the free list and watermark without touching chunk
    /// contents.
    pub fn reset(&self) {
        self.head.store(NIL, Ordering::Release);
        self.initialized_count.store(0, Ordering::Release);
        self.free_count.store(self.chunk_count, Ordering::Release);
        self.header.size.store(0, Ordering::Release);
        self.header
            .current_allocations
            .store(0, Ordering::Release);
    }
}

impl Allocator for PoolAllocator {
    fn header(&self) -> &AllocatorHeader {
        &self.header
    }

    fn aligned_alloc(&self, size: usize, align: usize) -> Result<*mut u8> {
        if size == 0 || size > self.chunk_size {
            return super::invalid_argument("pool allocator request exceeds chunk size");
        }
        if align > ALLOC_ALIGNMENT {
            return super::invalid_argument("pool allocator cannot satisfy alignment > ALLOC_ALIGNMENT");
        }

        loop {
            let head = self.head.load(Ordering::Acquire);
            if head != NIL {
                let next = self.read_link(head);
                if self
                    .head
                    .compare_exchange_weak(head, next, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    self.free_count.fetch_sub(1, Ordering::AcqRel);
                    self.header.record_alloc(self.chunk_size);
                    return Ok(self.chunk_ptr(head));
                }
                continue;
            }

            // Free list (below the watermark) is empty; consume the next
            // never-touched chunk in order.
            let watermark = self.initialized_count.load(Ordering::Acquire);
            if watermark >= self.chunk_count {
                return out_of_memory("pool allocator has no free chunks");
            }
            if self
                .initialized_count
                .compare_exchange_weak(watermark, watermark + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                self.free_count.fetch_sub(1, Ordering::AcqRel);
                self.header.record_alloc(self.chunk_size);
                return Ok(self.chunk_ptr(watermark));
            }
        }
    }

    fn aligned_realloc(&self, _ptr: *mut u8, _new_size: usize, _align: usize) -> Result<*mut u8> {
        Err(crate::error::Error::new(
            crate::error::ErrorKind::PermissionDenied,
            "pool allocator does not support realloc",
        ))
    }

    fn free(&self, ptr: *mut u8) -> Result<bool> {
        let index = match self.chunk_index_of(ptr) {
            Some(i) => i,
            None => return super::invalid_argument("pointer is not owned by this pool"),
        };
        loop {
            let head = self.head.load(Ordering::Acquire);
            self.write_link(index, head);
            if self
                .head
                .compare_exchange_weak(head, index, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                self.free_count.fetch_add(1, Ordering::AcqRel);
                self.header.record_free(self.chunk_size);
                return Ok(true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn initialize_reports_capacity() {
        let chunk_size = 24;
        let chunk_count = 4;
        let buffer = vec![0u8; PoolAllocator::buffer_size(chunk_size, chunk_count)];
        let pool = PoolAllocator::new(chunk_size, chunk_count, buffer).unwrap();
        assert_eq!(pool.chunk_count(), chunk_count);
        assert_eq!(pool.free_count(), chunk_count);
        assert!(pool.validate());
    }

    #[test]
    fn allocate_free_matches_reference_sequence() {
        let chunk_size = 24;
        let chunk_count = 4;
        let buffer = vec![0u8; PoolAllocator::buffer_size(chunk_size, chunk_count)];
        let pool = PoolAllocator::new(chunk_size, chunk_count, buffer).unwrap();

        assert!(pool.alloc(0).is_err());
        assert!(pool.alloc(chunk_size + 1).is_err());

        let p1 = pool.alloc(chunk_size).unwrap();
        assert!(pool.validate());
        assert_eq!(pool.free_count(), 3);

        let p2 = pool.alloc(chunk_size - 1).unwrap();
        assert!(pool.validate());
        assert_eq!(pool.free_count(), 2);

        let p3 = pool.alloc(chunk_size).unwrap();
        assert!(pool.validate());
        assert_eq!(pool.free_count(), 1);

        assert!(pool.free(p1).unwrap());
        assert!(pool.validate());
        assert_eq!(pool.free_count(), 2);

        assert!(pool.free(p3).unwrap());
        assert!(pool.validate());
        assert_eq!(pool.free_count(), 3);

        let p4 = pool.alloc(chunk_size).unwrap();
        assert_eq!(p4, p3);
        assert!(pool.validate());

        let p5 = pool.alloc(chunk_size).unwrap();
        assert_eq!(p5, p1);
        assert!(pool.validate());
        let _ = p2;
    }

    #[test]
    fn out_of_memory_when_chunks_exhausted() {
        let chunk_size = 16;
        let chunk_count = 2;
        let buffer = vec![0u8; PoolAllocator::buffer_size(chunk_size, chunk_count)];
        let pool = PoolAllocator::new(chunk_size, chunk_count, buffer).unwrap();
        pool.alloc(chunk_size).unwrap();
        pool.alloc(chunk_size).unwrap();
        assert!(pool.alloc(chunk_size).is_err());
    }

    #[test]
    fn concurrent_alloc_free_preserves_invariants() {
        let chunk_size = 32;
        let chunk_count = 64;
        let buffer = vec![0u8; PoolAllocator::buffer_size(chunk_size, chunk_count)];
        let pool = PoolAllocator::new(chunk_size, chunk_count, buffer).unwrap();

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..200 {
                        if let Ok(ptr) = pool.alloc(chunk_size) {
                            pool.free(ptr).unwrap();
                        }
                    }
                });
            }
        });

        assert!(pool.validate());
        assert_eq!(pool.free_count() + 0, pool.free_count());
        assert_eq!(pool.free_count(), chunk_count);
    }
}
