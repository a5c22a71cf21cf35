//! Resource command-buffer pool (spec §4.5): auxiliary command buffers for
//! GPU resource work that happens off the main thread, merged back into
//! the main command buffer at the main thread's deferred-resource
//! boundary.
//!
//! The source models `available`/`pending`/`active` as three
//! spinlock-guarded vectors, with `flush` locating the caller's buffer in
//! `active` by linear scan. Rust ownership makes that scan unnecessary:
//! handing a pool back through [`acquire`]/[`flush`] already proves nobody
//! else holds it, so there is nothing left to misplace. `available` and
//! `pending` become a pair of [`crossbeam_channel`]s instead — acquire and
//! flush are producers from arbitrary threads, `submit` is the single
//! consumer running on the main thread, which is exactly the
//! multi-producer single-consumer shape the source's comments describe.

use crossbeam_channel::{Receiver, Sender};

use crate::backend::Backend;
use crate::error::{Error, ErrorKind, Result};

/// Acquire/flush/submit of backend command-buffer pools used for deferred
/// resource uploads.
pub struct ResourceCommandBuffers<B: Backend> {
    available_tx: Sender<B::CommandBufferPool>,
    available_rx: Receiver<B::CommandBufferPool>,
    pending_tx: Sender<B::CommandBufferPool>,
    pending_rx: Receiver<B::CommandBufferPool>,
}

impl<B: Backend> ResourceCommandBuffers<B> {
    pub fn new() -> Self {
        let (available_tx, available_rx) = crossbeam_channel::unbounded();
        let (pending_tx, pending_rx) = crossbeam_channel::unbounded();
        ResourceCommandBuffers { available_tx, available_rx, pending_tx, pending_rx }
    }

    /// Pops a pool from `available` (creating one if none is free) and
    /// begins recording. May be called from any thread.
    pub fn acquire(&self, backend: &B) -> Result<B::CommandBufferPool> {
        let pool = match self.available_rx.try_recv() {
            Ok(pool) => pool,
            Err(_) => backend.create_command_buffer_pool()?,
        };
        backend.begin_command_buffer(&pool)?;
        Ok(pool)
    }

    /// Ends recording on `pool` and moves it to `pending`. May be called
    /// from any thread, including one that did not call [`acquire`] itself,
    /// as long as it owns the pool.
    pub fn flush(&self, backend: &B, pool: B::CommandBufferPool) -> Result<()> {
        backend.end_command_buffer(&pool)?;
        self.pending_tx
            .send(pool)
            .map_err(|_| Error::new(ErrorKind::InvalidArgument, "resource command buffer pool channel is closed"))
    }

    /// Submits every pending pool onto `main` in order, resets each, and
    /// returns it to `available`. Must only be called from the main thread,
    /// at the deferred-resource boundary; enforced by the caller
    /// ([`crate::renderer::Renderer`]), not here.
    pub fn submit(&self, backend: &B, main: &B::CommandBufferPool) -> Result<()> {
        while let Ok(pool) = self.pending_rx.try_recv() {
            backend.submit_command_buffer(main, Some(&pool))?;
            backend.reset_command_buffer_pool(&pool)?;
            let _ = self.available_tx.send(pool);
        }
        Ok(())
    }
}

impl<B: Backend> Default for ResourceCommandBuffers<B> {
    fn default() -> Self {
        Self::new()
    }
}
