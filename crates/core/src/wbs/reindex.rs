//! Sibling reindexing.
//!
//! After any insertion, deletion, or move touching a sibling group, the
//! group's `order_idx` values are rewritten to `0..n-1` in display order.
//! Every sibling is touched (and its `updated_at` bumped), not only the one
//! that moved, so this is O(siblings).

use std::collections::HashMap;

use crate::types::{DbId, Timestamp};
use crate::wbs::node::WbsNode;

/// Ids of one sibling group in current display order.
pub fn sibling_ids(nodes: &[WbsNode], project_id: DbId, parent_id: Option<DbId>) -> Vec<DbId> {
    let mut group: Vec<&WbsNode> = nodes
        .iter()
        .filter(|n| n.project_id == project_id && n.parent_id == parent_id)
        .collect();
    group.sort_by_key(|n| (n.order_idx, n.id));
    group.into_iter().map(|n| n.id).collect()
}

/// `order_idx` a node appended to the group would receive.
pub fn next_order_idx(nodes: &[WbsNode], project_id: DbId, parent_id: Option<DbId>) -> i32 {
    nodes
        .iter()
        .filter(|n| n.project_id == project_id && n.parent_id == parent_id)
        .count() as i32
}

/// Rewrite the group's `order_idx` to a consecutive 0-based sequence,
/// keeping the current relative order. Returns the touched ids in order.
pub fn reindex(
    nodes: &mut [WbsNode],
    project_id: DbId,
    parent_id: Option<DbId>,
    now: Timestamp,
) -> Vec<DbId> {
    let ordered = sibling_ids(nodes, project_id, parent_id);
    assign(nodes, &ordered, now);
    ordered
}

/// Reindex the group with `node_id` placed at `rank` and its siblings
/// shifted around it. `node_id` must already carry `parent_id`.
///
/// `rank` counts positions among the other siblings and is clamped to the
/// group bounds.
pub fn reindex_with_insert(
    nodes: &mut [WbsNode],
    project_id: DbId,
    parent_id: Option<DbId>,
    node_id: DbId,
    rank: i32,
    now: Timestamp,
) -> Vec<DbId> {
    let mut ordered = sibling_ids(nodes, project_id, parent_id);
    ordered.retain(|&id| id != node_id);
    let at = rank.clamp(0, ordered.len() as i32) as usize;
    ordered.insert(at, node_id);
    assign(nodes, &ordered, now);
    ordered
}

fn assign(nodes: &mut [WbsNode], ordered: &[DbId], now: Timestamp) {
    let position: HashMap<DbId, i32> = ordered
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, i as i32))
        .collect();
    for node in nodes.iter_mut() {
        if let Some(&idx) = position.get(&node.id) {
            node.order_idx = idx;
            node.updated_at = now;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
