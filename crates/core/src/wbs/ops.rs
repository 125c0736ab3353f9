//! Structural operations over one project's flat node set.
//!
//! Each operation validates first, then runs its steps against the current
//! records in a fixed order (detach, reindex source, reindex destination,
//! regenerate codes) and reports which rows it touched. The store wraps
//! one call in a single transaction and writes back exactly those rows.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};
use crate::wbs::index::SiblingIndex;
use crate::wbs::move_plan::{plan_move, MovePlan};
use crate::wbs::node::{MoveRelation, WbsNode, NODE_ENTITY};
use crate::wbs::propagate::{propagate_codes, propagate_group_codes};
use crate::wbs::reindex::{next_order_idx, reindex, reindex_with_insert};

/// Position assigned to a freshly inserted node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub order_idx: i32,
    pub level: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MoveOutcome {
    pub plan: MovePlan,
    /// Ids whose stored fields changed, ascending.
    pub changed: Vec<DbId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    /// The deleted node followed by its descendants.
    pub removed: Vec<DbId>,
    /// Former siblings (and their subtrees) renumbered by the delete.
    pub changed: Vec<DbId>,
}

/// Append position under `parent_id`. The parent must be a node of the
/// same project; `None` targets the project's root level.
pub fn place_new(
    nodes: &[WbsNode],
    project_id: DbId,
    parent_id: Option<DbId>,
) -> Result<Placement, CoreError> {
    let level = match parent_id {
        None => 0,
        Some(pid) => {
            let index = SiblingIndex::new(nodes);
            let parent = index
                .get(pid)
                .filter(|p| p.project_id == project_id)
                .ok_or(CoreError::NotFound {
                    entity: NODE_ENTITY,
                    id: pid,
                })?;
            index.depth(pid).unwrap_or(parent.level) + 1
        }
    };
    Ok(Placement {
        order_idx: next_order_idx(nodes, project_id, parent_id),
        level,
    })
}

/// Insert a node whose id is already assigned. Position fields are
/// overwritten from [`place_new`] and its code is generated.
pub fn apply_insert(
    nodes: &mut Vec<WbsNode>,
    mut node: WbsNode,
    now: Timestamp,
) -> Result<Vec<DbId>, CoreError> {
    if nodes.iter().any(|n| n.id == node.id) {
        return Err(CoreError::Conflict(format!(
            "Node with id {} already exists",
            node.id
        )));
    }
    let placement = place_new(nodes, node.project_id, node.parent_id)?;
    node.order_idx = placement.order_idx;
    node.level = placement.level;
    node.wbs_code = None;
    node.updated_at = now;
    let id = node.id;
    nodes.push(node);

    propagate_codes(nodes, id, now);
    tracing::debug!(node_id = id, order_idx = placement.order_idx, "Inserted WBS node");
    Ok(vec![id])
}

/// Move `node_id` relative to `target_id`.
///
/// Nothing is modified when the planner rejects the move.
pub fn apply_move(
    nodes: &mut [WbsNode],
    node_id: DbId,
    target_id: DbId,
    relation: MoveRelation,
    now: Timestamp,
) -> Result<MoveOutcome, CoreError> {
    let plan = plan_move(nodes, node_id, target_id, relation).inspect_err(|err| {
        tracing::warn!(node_id, target_id, %relation, error = %err, "Rejected WBS move");
    })?;

    let mut changed = BTreeSet::from([node_id]);
    for node in nodes.iter_mut().filter(|n| n.id == node_id) {
        node.parent_id = plan.new_parent_id;
        node.level = plan.new_level;
        node.updated_at = now;
    }

    // Source and destination groups are independent; both settle before
    // any code is read.
    if plan.changes_parent() {
        changed.extend(reindex(nodes, plan.project_id, plan.old_parent_id, now));
    }
    changed.extend(reindex_with_insert(
        nodes,
        plan.project_id,
        plan.new_parent_id,
        node_id,
        plan.insert_rank,
        now,
    ));

    if plan.changes_parent() {
        changed.extend(propagate_group_codes(
            nodes,
            plan.project_id,
            plan.old_parent_id,
            now,
        ));
    }
    changed.extend(propagate_group_codes(
        nodes,
        plan.project_id,
        plan.new_parent_id,
        now,
    ));

    tracing::debug!(
        node_id,
        target_id,
        %relation,
        insert_rank = plan.insert_rank,
        changed = changed.len(),
        "Applied WBS move"
    );
    Ok(MoveOutcome {
        plan,
        changed: changed.into_iter().collect(),
    })
}

/// Delete `node_id` with its whole subtree, then close the gap it left in
/// its sibling group right away.
pub fn apply_delete(
    nodes: &mut Vec<WbsNode>,
    node_id: DbId,
    now: Timestamp,
) -> Result<DeleteOutcome, CoreError> {
    let (project_id, parent_id, removed) = {
        let index = SiblingIndex::new(nodes);
        let node = index.get(node_id).ok_or(CoreError::NotFound {
            entity: NODE_ENTITY,
            id: node_id,
        })?;
        let mut removed = vec![node_id];
        removed.extend(index.descendant_ids(node_id));
        (node.project_id, node.parent_id, removed)
    };

    let doomed: BTreeSet<DbId> = removed.iter().copied().collect();
    nodes.retain(|n| !doomed.contains(&n.id));

    let mut changed: BTreeSet<DbId> = reindex(nodes, project_id, parent_id, now)
        .into_iter()
        .collect();
    changed.extend(propagate_group_codes(nodes, project_id, parent_id, now));

    tracing::debug!(
        node_id,
        removed = removed.len(),
        changed = changed.len(),
        "Deleted WBS subtree"
    );
    Ok(DeleteOutcome {
        removed,
        changed: changed.into_iter().collect(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
