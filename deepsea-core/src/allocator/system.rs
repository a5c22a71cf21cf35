//! System allocator: wraps the process allocator with a byte cap.

use std::alloc::{self, Layout};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{out_of_memory, Allocator, AllocatorHeader, ALLOC_ALIGNMENT};
use crate::error::Result;

/// Forwards to the OS allocator, enforcing a maximum outstanding byte
/// count and recording the real request size (including alignment
/// padding) for bookkeeping.
pub struct SystemAllocator {
    header: AllocatorHeader,
    limit: usize,
    outstanding: AtomicUsize,
}

struct Header {
    layout: Layout,
}

fn header_size(align: usize) -> usize {
    super::aligned_size(std::mem::size_of::<Header>(), align)
}

impl SystemAllocator {
    /// `limit` caps the total outstanding bytes this allocator will hand
    /// out; `usize::MAX` disables the cap.
    pub fn new(limit: usize) -> Self {
        SystemAllocator {
            header: AllocatorHeader::default(),
            limit,
            outstanding: AtomicUsize::new(0),
        }
    }

    /// Bytes available before the cap is hit.
    pub fn remaining(&self) -> usize {
        self.limit
            .saturating_sub(self.outstanding.load(Ordering::Acquire))
    }
}

impl Allocator for SystemAllocator {
    fn header(&self) -> &AllocatorHeader {
        &self.header
    }

    fn aligned_alloc(&self, size: usize, align: usize) -> Result<*mut u8> {
        if size == 0 {
            return super::invalid_argument("system allocator alloc size must be non-zero");
        }
        let align = align.max(ALLOC_ALIGNMENT);
        let prefix = header_size(align);
        let total = match prefix.checked_add(size) {
            Some(t) => t,
            None => return out_of_memory("system allocator request overflowed"),
        };

        loop {
            let current = self.outstanding.load(Ordering::Acquire);
            let next = match current.checked_add(total) {
                Some(n) if n <= self.limit => n,
                _ => return out_of_memory("system allocator limit exceeded"),
            };
            if self
                .outstanding
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break;
            }
        }

        let layout = Layout::from_size_align(total, align)
            .map_err(|_| crate::error::Error::new(crate::error::ErrorKind::InvalidArgument, "bad layout"))?;
        // SAFETY: `layout` has non-zero size because `total >= prefix + 1`.
        let raw = unsafe { alloc::alloc(layout) };
        if raw.is_null() {
            self.outstanding.fetch_sub(total, Ordering::AcqRel);
            return out_of_memory("global allocator returned null");
        }

        self.header.record_alloc(total);
        // SAFETY: `raw` is valid for `prefix` bytes; we reserved that much
        // room ahead of the user payload.
        unsafe {
            (raw as *mut Header).write(Header { layout });
            Ok(raw.add(prefix))
        }
    }

    fn aligned_realloc(&self, ptr: *mut u8, new_size: usize, align: usize) -> Result<*mut u8> {
        if new_size == 0 {
            return super::invalid_argument("system allocator realloc size must be non-zero");
        }
        let align = align.max(ALLOC_ALIGNMENT);
        let prefix = header_size(align);
        // SAFETY: `ptr` must have been returned by this allocator's alloc,
        // which always reserves `prefix` bytes ahead of the payload.
        let raw = unsafe { ptr.sub(prefix) };
        let header = unsafe { (raw as *const Header).read() };
        let old_total = header.layout.size();
        let new_total = prefix + new_size;

        loop {
            let current = self.outstanding.load(Ordering::Acquire);
            let without_old = current - old_total;
            let next = match without_old.checked_add(new_total) {
                Some(n) if n <= self.limit => n,
                _ => return out_of_memory("system allocator limit exceeded"),
            };
            if self
                .outstanding
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break;
            }
        }

        let new_layout = Layout::from_size_align(new_total, align)
            .map_err(|_| crate::error::Error::new(crate::error::ErrorKind::InvalidArgument, "bad layout"))?;
        // SAFETY: `raw` was allocated with `header.layout` by this module's
        // `alloc`, and `new_layout.size() > 0`.
        let new_raw = unsafe { alloc::realloc(raw, header.layout, new_layout.size()) };
        if new_raw.is_null() {
            self.outstanding.fetch_sub(new_total - old_total, Ordering::AcqRel);
            return out_of_memory("global allocator realloc returned null");
        }

        self.header.record_free(old_total);
        self.header.record_alloc(new_total);
        unsafe {
            (new_raw as *mut Header).write(Header { layout: new_layout });
            Ok(new_raw.add(prefix))
        }
    }

    fn free(&self, ptr: *mut u8) -> Result<bool> {
        if ptr.is_null() {
            return super::invalid_argument("cannot free a null pointer");
        }
        // A fixed worst-case alignment covers every prefix we might have
        // used; the header itself records the real layout for dealloc.
        let prefix = header_size(ALLOC_ALIGNMENT);
        // SAFETY: `ptr` was returned by `aligned_alloc`/`aligned_realloc`
        // above, which always reserve `prefix` bytes ahead of the payload
        // for a fixed alignment floor of `ALLOC_ALIGNMENT`.
        let raw = unsafe { ptr.sub(prefix) };
        let header = unsafe { (raw as *const Header).read() };
        let total = header.layout.size();

        // SAFETY: `raw`/`header.layout` are exactly what `alloc`/`realloc`
        // used to create this allocation.
        unsafe { alloc::dealloc(raw, header.layout) };

        self.outstanding.fetch_sub(total, Ordering::AcqRel);
        self.header.record_free(total);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_and_free_roundtrip() {
        let alloc = SystemAllocator::new(usize::MAX);
        let ptr = alloc.alloc(128).unwrap();
        assert_eq!(alloc.header().current_allocations(), 1);
        assert!(alloc.free(ptr).unwrap());
        assert_eq!(alloc.header().current_allocations(), 0);
    }

    #[test]
    fn limit_is_enforced() {
        let alloc = SystemAllocator::new(64);
        assert!(alloc.alloc(256).is_err());
    }

    #[test]
    fn realloc_updates_bookkeeping() {
        let alloc = SystemAllocator::new(usize::MAX);
        let ptr = alloc.alloc(16).unwrap();
        let ptr = alloc.realloc(ptr, 256).unwrap();
        assert!(alloc.header().size() >= 256);
        assert!(alloc.free(ptr).unwrap());
    }

    #[test]
    fn zero_size_alloc_is_invalid_argument() {
        let alloc = SystemAllocator::new(usize::MAX);
        assert_eq!(
            alloc.alloc(0).unwrap_err().kind(),
            crate::error::ErrorKind::InvalidArgument
        );
    }
}
