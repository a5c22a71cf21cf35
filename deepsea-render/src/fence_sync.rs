//! Fence sync pool (spec §3 "Fence sync pool", §4.2/§5): a lock-free
//! pooled GPU completion token with two-level ref counting, letting a
//! submitter and every thread that eventually observes completion release
//! independently of each other.
//!
//! Grounded on [`deepsea_core::allocator::PoolAllocator`]'s lock-free
//! chunked allocation for the pool slot itself, and on
//! [`crate::resource::InternalRefCount`]'s counting discipline for the
//! second level (how many `FenceSyncRef`s currently name a `FenceSync`).

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use deepsea_core::allocator::{Allocator, PoolAllocator};

use crate::backend::Backend;
use crate::error::{Error, ErrorKind, Result};

/// A single outstanding GPU completion token. Its pool chunk is reclaimed
/// when the last [`FenceSyncRef`] naming it is dropped.
pub struct FenceSync<B: Backend> {
    allocator: Arc<PoolAllocator>,
    chunk: *mut u8,
    ref_count: AtomicU32,
    handle: B::FenceHandle,
}

// SAFETY: `chunk` is only ever touched by `Drop`, to return it to the pool;
// the fence handle itself carries the same Send/Sync bound as the backend.
unsafe impl<B: Backend> Send for FenceSync<B> {}
unsafe impl<B: Backend> Sync for FenceSync<B> {}

impl<B: Backend> FenceSync<B> {
    pub fn handle(&self) -> &B::FenceHandle {
        &self.handle
    }
}

impl<B: Backend> Drop for FenceSync<B> {
    fn drop(&mut self) {
        let _ = self.allocator.free(self.chunk);
    }
}

/// A reference to a pooled [`FenceSync`]. Set once by the thread that
/// submits the GPU work, then read (never mutated) by every thread that
/// later waits on or releases the fence; dropping the last ref frees the
/// pool chunk.
#[derive(Clone)]
pub struct FenceSyncRef<B: Backend> {
    sync: Option<Arc<FenceSync<B>>>,
}

impl<B: Backend> FenceSyncRef<B> {
    /// An empty ref, set later via [`FenceSyncRef::set`] once the
    /// corresponding submission actually happens.
    pub fn empty() -> Self {
        FenceSyncRef { sync: None }
    }

    pub fn set(&mut self, sync: Arc<FenceSync<B>>) {
        sync.ref_count.fetch_add(1, Ordering::AcqRel);
        self.sync = Some(sync);
    }

    pub fn get(&self) -> Option<&FenceSync<B>> {
        self.sync.as_deref()
    }
}

impl<B: Backend> Drop for FenceSyncRef<B> {
    fn drop(&mut self) {
        if let Some(sync) = self.sync.take() {
            sync.ref_count.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

/// Hands out [`FenceSync`] instances from a fixed-capacity
/// [`PoolAllocator`]-backed arena, bounding how many fences may be
/// in-flight at once.
pub struct FenceSyncPool {
    allocator: Arc<PoolAllocator>,
}

impl FenceSyncPool {
    /// `capacity` fences, each sized for a pointer-width slot.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::new(ErrorKind::InvalidArgument, "fence sync pool capacity must be non-zero"));
        }
        let chunk_size = std::mem::size_of::<usize>();
        let buffer = vec![0u8; PoolAllocator::buffer_size(chunk_size, capacity)];
        Ok(FenceSyncPool { allocator: Arc::new(PoolAllocator::new(chunk_size, capacity, buffer)?) })
    }

    /// Fences currently available for allocation.
    pub fn available(&self) -> usize {
        self.allocator.free_count()
    }

    pub fn acquire<B: Backend>(&self, handle: B::FenceHandle) -> Result<Arc<FenceSync<B>>> {
        let chunk = self.allocator.alloc(std::mem::size_of::<usize>())?;
        Ok(Arc::new(FenceSync { allocator: self.allocator.clone(), chunk, ref_count: AtomicU32::new(0), handle }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_rejects_zero_capacity() {
        assert!(FenceSyncPool::new(0).is_err());
    }

    #[test]
    fn pool_tracks_availability() {
        let pool = FenceSyncPool::new(2).unwrap();
        assert_eq!(pool.available(), 2);
    }
}
