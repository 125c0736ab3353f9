//! Shared builders for engine unit tests.

use crate::types::{DbId, Timestamp};
use crate::wbs::node::{NodeType, WbsNode};

pub const PROJECT: DbId = 1;

pub fn epoch() -> Timestamp {
    chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

pub fn later() -> Timestamp {
    chrono::DateTime::from_timestamp(1_700_000_600, 0).unwrap()
}

/// A node with `level` and `wbs_code` left for the engine to fill in.
pub fn node(id: DbId, parent_id: Option<DbId>, order_idx: i32, name: &str) -> WbsNode {
    WbsNode {
        id,
        project_id: PROJECT,
        parent_id,
        name: name.to_string(),
        description: None,
        order_idx,
        level: 0,
        wbs_code: None,
        node_type: NodeType::Task,
        created_at: epoch(),
        updated_at: epoch(),
    }
}

/// Fill in levels and codes so the set starts out consistent.
pub fn settle(mut nodes: Vec<WbsNode>) -> Vec<WbsNode> {
    let roots: Vec<DbId> = nodes.iter().filter(|n| n.is_root()).map(|n| n.id).collect();
    for id in roots {
        crate::wbs::propagate::propagate_codes(&mut nodes, id, epoch());
    }
    nodes
}

/// ```text
/// 1 Design            (1)
///   1.1 Specs         (3)
///   1.2 Review        (4)
/// 2 Build             (2)
///   2.1 Backend       (5)
///     2.1.1 Api       (6)
///     2.1.2 Storage   (7)
/// ```
pub fn sample() -> Vec<WbsNode> {
    settle(vec![
        node(1, None, 0, "Design"),
        node(2, None, 1, "Build"),
        node(3, Some(1), 0, "Specs"),
        node(4, Some(1), 1, "Review"),
        node(5, Some(2), 0, "Backend"),
        node(6, Some(5), 0, "Api"),
        node(7, Some(5), 1, "Storage"),
    ])
}

pub fn find(nodes: &[WbsNode], id: DbId) -> &WbsNode {
    nodes.iter().find(|n| n.id == id).unwrap()
}

pub fn code(nodes: &[WbsNode], id: DbId) -> &str {
    find(nodes, id).wbs_code.as_deref().unwrap()
}
