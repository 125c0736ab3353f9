//! Whole-project invariant check.
//!
//! Reports every place where stored `parent_id` / `order_idx` / `level` /
//! `wbs_code` disagree with what the engine would derive. An empty report
//! means the project is consistent.

use std::collections::HashSet;

use serde::Serialize;

use crate::types::DbId;
use crate::wbs::code::code_from_index;
use crate::wbs::index::SiblingIndex;
use crate::wbs::node::WbsNode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    DanglingParent {
        id: DbId,
        parent_id: DbId,
    },
    /// The node's own parent exists but a higher ancestor does not.
    BrokenAncestry {
        id: DbId,
        missing_id: DbId,
    },
    Cycle {
        id: DbId,
    },
    WrongLevel {
        id: DbId,
        expected: i32,
        actual: i32,
    },
    OrderNotConsecutive {
        project_id: DbId,
        parent_id: Option<DbId>,
        orders: Vec<i32>,
    },
    StaleCode {
        id: DbId,
        expected: Option<String>,
        actual: Option<String>,
    },
}

pub fn verify_consistency(nodes: &[WbsNode]) -> Vec<Violation> {
    let index = SiblingIndex::new(nodes);
    let mut violations = Vec::new();

    for node in nodes {
        if let Some(parent_id) = node.parent_id {
            if index.get(parent_id).is_none() {
                violations.push(Violation::DanglingParent {
                    id: node.id,
                    parent_id,
                });
                continue;
            }
        }
        let Some(expected) = index.depth(node.id) else {
            violations.push(match missing_ancestor(&index, node) {
                Some(missing_id) => Violation::BrokenAncestry {
                    id: node.id,
                    missing_id,
                },
                None => Violation::Cycle { id: node.id },
            });
            continue;
        };
        if node.level != expected {
            violations.push(Violation::WrongLevel {
                id: node.id,
                expected,
                actual: node.level,
            });
        }
        let code = code_from_index(&index, node.id);
        if node.wbs_code != code {
            violations.push(Violation::StaleCode {
                id: node.id,
                expected: code,
                actual: node.wbs_code.clone(),
            });
        }
    }

    let mut gaps: Vec<Violation> = index
        .groups()
        .filter_map(|(&(project_id, parent_id), group)| {
            let orders: Vec<i32> = group.iter().map(|n| n.order_idx).collect();
            let consecutive = orders.iter().enumerate().all(|(i, &o)| o == i as i32);
            (!consecutive).then_some(Violation::OrderNotConsecutive {
                project_id,
                parent_id,
                orders,
            })
        })
        .collect();
    gaps.sort_by_key(|v| match v {
        Violation::OrderNotConsecutive {
            project_id,
            parent_id,
            ..
        } => (*project_id, *parent_id),
        _ => (0, None),
    });
    violations.extend(gaps);
    violations
}

/// Walk up from `node` and return the first parent id that is absent from
/// the set. `None` when the walk loops back on itself instead.
fn missing_ancestor(index: &SiblingIndex<'_>, node: &WbsNode) -> Option<DbId> {
    let mut seen = HashSet::new();
    let mut current = node;
    while seen.insert(current.id) {
        let parent_id = current.parent_id?;
        match index.get(parent_id) {
            Some(parent) => current = parent,
            None => return Some(parent_id),
        }
    }
    None
}
