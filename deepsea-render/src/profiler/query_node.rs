//! Cross-frame (category, name) accumulation (spec §4.4, steps 1-3): dedup
//! a rotation slot's begin/end records, sum GPU ticks per pair, and emit
//! each surviving pair exactly once in the order its first record appears.

use deepsea_core::container::HashTable;

use super::query_pool::{QueryPoolsSlot, BEGIN_SENTINEL};
use crate::backend::Backend;
use crate::error::Result;

#[derive(Default)]
struct QueryNode {
    total_time: u64,
    visited: bool,
    invalid: bool,
}

/// One (category, name) pair's total GPU time for a reduced frame.
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileResult {
    pub category: String,
    pub name: String,
    pub total_time_ns: u64,
}

fn node_for(table: &mut HashTable<(String, String), usize>, nodes: &mut Vec<QueryNode>, category: &str, name: &str) -> usize {
    let key = (category.to_string(), name.to_string());
    if let Some(&index) = table.find(&key) {
        return index;
    }
    let index = nodes.len();
    nodes.push(QueryNode::default());
    table.insert(key, index).expect("key was just confirmed absent");
    index
}

/// Reduces one rotation slot's records into per-(category,name) totals,
/// in first-visit order, skipping straddled or timestamp-wrapped end
/// records (spec §4.4).
pub fn reduce<B: Backend>(backend: &B, slot: &QueryPoolsSlot<B>, timestamp_period: f64, current_swap_count: u32) -> Result<Vec<ProfileResult>> {
    let records = slot.records();
    let mut table = HashTable::new(records.len());
    let mut nodes: Vec<QueryNode> = Vec::new();
    let mut node_of_record: Vec<Option<usize>> = vec![None; records.len()];

    // First pass: assign every record its node, in original order, so a
    // begin record (always earlier than its end) is what establishes a
    // (category, name) pair's first-visit position.
    for (index, record) in records.iter().enumerate() {
        if record.begin_index == BEGIN_SENTINEL {
            node_of_record[index] = Some(node_for(&mut table, &mut nodes, &record.category, &record.name));
        } else {
            node_of_record[index] = node_of_record[record.begin_index as usize];
        }
    }

    for (index, record) in records.iter().enumerate() {
        if record.begin_index == BEGIN_SENTINEL || record.swap_count != current_swap_count {
            continue;
        }
        let Some(node_index) = node_of_record[index] else { continue };

        let begin_ts = match slot.timestamp(backend, record.begin_index)? {
            Some(ts) => ts,
            None => continue,
        };
        let end_ts = match slot.timestamp(backend, index as u32)? {
            Some(ts) => ts,
            None => continue,
        };
        if end_ts < begin_ts {
            nodes[node_index].invalid = true;
            continue;
        }
        let delta_ticks = end_ts - begin_ts;
        nodes[node_index].total_time += (delta_ticks as f64 * timestamp_period) as u64;
    }

    let mut results = Vec::new();
    for (index, record) in records.iter().enumerate() {
        let Some(node_index) = node_of_record[index] else { continue };
        let node = &mut nodes[node_index];
        if node.visited || node.invalid {
            continue;
        }
        node.visited = true;
        results.push(ProfileResult { category: record.category.clone(), name: record.name.clone(), total_time_ns: node.total_time });
    }
    Ok(results)
}
