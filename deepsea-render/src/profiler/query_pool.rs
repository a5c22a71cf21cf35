//! A single `QueryPools` rotation slot (spec §3 "GPU profiler state"): the
//! raw timestamp records written during one frame, before cross-frame
//! reduction pulls them into [`super::query_node::QueryNode`] totals.

use crate::backend::Backend;
use crate::error::Result;

/// Queries per backend query pool, matching the source's fixed-capacity
/// `GfxQueryPool`.
pub const POOL_CAPACITY: u32 = 1000;

/// Sentinel `begin_index`, marking a begin-record rather than an end-record.
pub const BEGIN_SENTINEL: u32 = u32::MAX;

/// One timestamp record: either a begin (with [`BEGIN_SENTINEL`]) or an end
/// (naming the index of its matching begin).
#[derive(Clone, Debug)]
pub struct QueryInfo {
    pub category: String,
    pub name: String,
    pub begin_index: u32,
    /// The swap counter observed when this record's *begin* was appended;
    /// used to drop end records from command buffers that straddled a
    /// frame boundary (spec §4.4).
    pub swap_count: u32,
}

/// One fixed-capacity backend query pool plus the slot index of its next
/// unwritten query.
struct BackendPool<B: Backend> {
    handle: B::QueryPoolHandle,
    next_query: u32,
}

/// All records appended during one rotation slot's active frame(s), plus
/// the backend query pools backing their timestamps. Grows its pool list
/// lazily as more than [`POOL_CAPACITY`] queries are recorded in a slot.
pub struct QueryPoolsSlot<B: Backend> {
    pools: Vec<BackendPool<B>>,
    records: Vec<QueryInfo>,
}

impl<B: Backend> QueryPoolsSlot<B> {
    pub fn new() -> Self {
        QueryPoolsSlot { pools: Vec::new(), records: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends a record and writes its timestamp, growing the backend pool
    /// list if every existing pool is full. Returns the record's index
    /// within this slot.
    pub fn append(&mut self, backend: &B, cb_pool: &B::CommandBufferPool, category: &str, name: &str, begin_index: u32, swap_count: u32) -> Result<u32> {
        let record_index = self.records.len() as u32;
        let pool_slot = record_index % POOL_CAPACITY;
        let pool_index = (record_index / POOL_CAPACITY) as usize;
        if pool_index == self.pools.len() {
            self.pools.push(BackendPool { handle: backend.create_query_pool(POOL_CAPACITY)?, next_query: 0 });
        }
        let pool = &mut self.pools[pool_index];
        backend.write_timestamp(cb_pool, &pool.handle, pool_slot)?;
        pool.next_query += 1;
        self.records.push(QueryInfo { category: category.to_string(), name: name.to_string(), begin_index, swap_count });
        Ok(record_index)
    }

    pub fn records(&self) -> &[QueryInfo] {
        &self.records
    }

    /// Reads back the GPU timestamp written for `record_index`, or `None`
    /// if the driver hasn't resolved it yet.
    pub fn timestamp(&self, backend: &B, record_index: u32) -> Result<Option<u64>> {
        let pool_index = (record_index / POOL_CAPACITY) as usize;
        let pool_slot = record_index % POOL_CAPACITY;
        backend.get_query_timestamp(&self.pools[pool_index].handle, pool_slot)
    }

    /// Clears records and query-pool cursors for reuse by a future frame.
    pub fn reset(&mut self) {
        self.records.clear();
        for pool in &mut self.pools {
            pool.next_query = 0;
        }
    }

    pub fn destroy(&mut self, backend: &B) -> Result<()> {
        for pool in self.pools.drain(..) {
            backend.destroy_query_pool(pool.handle)?;
        }
        Ok(())
    }
}

impl<B: Backend> Default for QueryPoolsSlot<B> {
    fn default() -> Self {
        Self::new()
    }
}
