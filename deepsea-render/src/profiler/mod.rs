//! GPU-timestamp profiler (spec §4.4): quad-buffered timestamp query pools
//! with cross-frame reduction, driven implicitly from the begin/end
//! boundary calls on [`crate::renderer::Renderer`] and
//! [`crate::command_buffer::CommandBuffer`].

mod query_node;
mod query_pool;

pub use query_node::ProfileResult;
pub use query_pool::{BEGIN_SENTINEL, POOL_CAPACITY};

use deepsea_core::sync::Spinlock;

use query_pool::QueryPoolsSlot;

use crate::backend::Backend;
use crate::error::Result;

/// Frames of latency between a pool filling up and its reduction being
/// safe to read back without stalling on the GPU.
const DELAY_FRAMES: u32 = 2;
/// Total rotation slots: `DELAY_FRAMES` plus two extra for double
/// buffering the slot currently being written and the one about to be.
const ROTATION_SLOTS: usize = 4;

struct Rotation<B: Backend> {
    slots: [QueryPoolsSlot<B>; ROTATION_SLOTS],
    current: usize,
    frame_count: u32,
}

/// Drives the timestamp query pool rotation and cross-frame reduction.
/// Inactive (all calls become no-ops) unless constructed with a non-zero
/// `timestamp_period`, matching the source's `ENABLED && timestamp_period >
/// 0` gate.
pub struct GpuProfiler<B: Backend> {
    timestamp_period: f64,
    rotation: Spinlock<Rotation<B>>,
    on_result: Box<dyn Fn(&ProfileResult) + Send + Sync>,
}

impl<B: Backend> GpuProfiler<B> {
    pub fn new(timestamp_period: f64, on_result: impl Fn(&ProfileResult) + Send + Sync + 'static) -> Self {
        GpuProfiler {
            timestamp_period,
            rotation: Spinlock::new(Rotation {
                slots: [QueryPoolsSlot::new(), QueryPoolsSlot::new(), QueryPoolsSlot::new(), QueryPoolsSlot::new()],
                current: 0,
                frame_count: 0,
            }),
            on_result: Box::new(on_result),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.timestamp_period > 0.0
    }

    /// The rotation slot a command buffer should snapshot at a begin
    /// boundary call, so a later end call can detect whether it straddled
    /// a frame swap.
    pub fn current_swap_count(&self) -> u32 {
        if !self.is_enabled() {
            return 0;
        }
        self.rotation.lock().frame_count
    }

    /// Appends a begin-boundary record and writes its timestamp. Returns
    /// the record index an end call must pass back.
    pub fn begin(&self, backend: &B, cb_pool: &B::CommandBufferPool, category: &str, name: &str) -> Result<u32> {
        if !self.is_enabled() {
            return Ok(0);
        }
        let mut rotation = self.rotation.lock();
        let (current, frame_count) = (rotation.current, rotation.frame_count);
        rotation.slots[current].append(backend, cb_pool, category, name, BEGIN_SENTINEL, frame_count)
    }

    /// Appends an end-boundary record paired with `begin_index`. Silently
    /// dropped (matching the source) if `snapshot_swap_count` no longer
    /// matches the current rotation slot's frame, meaning the recording
    /// command buffer straddled a frame boundary.
    pub fn end(&self, backend: &B, cb_pool: &B::CommandBufferPool, begin_index: u32, snapshot_swap_count: u32) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let mut rotation = self.rotation.lock();
        let current = rotation.current;
        if rotation.frame_count != snapshot_swap_count {
            return Ok(());
        }
        let slot = &mut rotation.slots[current];
        let record = &slot.records()[begin_index as usize];
        let (category, name) = (record.category.clone(), record.name.clone());
        slot.append(backend, cb_pool, &category, &name, begin_index, snapshot_swap_count)?;
        Ok(())
    }

    /// Rotates to the next slot at a frame boundary and, once a slot's GPU
    /// work is old enough ([`DELAY_FRAMES`] frames), reduces and reports it.
    pub fn end_frame(&self, backend: &B) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let mut rotation = self.rotation.lock();
        let finished_frame_count = rotation.frame_count;
        let current_before_rotation = rotation.current;
        rotation.frame_count += 1;
        rotation.current = (rotation.current + 1) % ROTATION_SLOTS;

        if finished_frame_count < DELAY_FRAMES {
            return Ok(());
        }
        let reduce_slot = (current_before_rotation + ROTATION_SLOTS - DELAY_FRAMES) % ROTATION_SLOTS;
        if rotation.slots[reduce_slot].is_empty() {
            return Ok(());
        }
        let swap_count_at_reduce_slot = finished_frame_count - DELAY_FRAMES;
        let results = query_node::reduce(backend, &rotation.slots[reduce_slot], self.timestamp_period, swap_count_at_reduce_slot)?;
        for result in &results {
            (self.on_result)(result);
        }
        rotation.slots[reduce_slot].reset();
        Ok(())
    }

    pub fn destroy(&self, backend: &B) -> Result<()> {
        let mut rotation = self.rotation.lock();
        for slot in &mut rotation.slots {
            slot.destroy(backend)?;
        }
        Ok(())
    }
}
