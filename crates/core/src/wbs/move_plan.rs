//! Move planning: validate a drag-and-drop move and compute where the node
//! lands. Pure; the caller applies the plan.
//!
//! Every rejection happens here, before any reindex or propagation step, so a
//! doomed move never leaves a partially renumbered group behind.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::DbId;
use crate::wbs::index::SiblingIndex;
use crate::wbs::node::{MoveRelation, WbsNode, NODE_ENTITY};

/// Resolved destination of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MovePlan {
    pub node_id: DbId,
    pub project_id: DbId,
    pub old_parent_id: Option<DbId>,
    pub new_parent_id: Option<DbId>,
    pub new_level: i32,
    /// Position among the destination siblings once the node itself has been
    /// taken out of its old slot.
    pub insert_rank: i32,
}

impl MovePlan {
    pub fn changes_parent(&self) -> bool {
        self.old_parent_id != self.new_parent_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Cannot move node {0} onto itself")]
    SelfMove(DbId),

    #[error("Node {node_id} is already a direct child of {target_id}")]
    AlreadyChild { node_id: DbId, target_id: DbId },

    #[error("Cannot move node {node_id} into its own descendant {target_id}")]
    IntoOwnSubtree { node_id: DbId, target_id: DbId },

    #[error("Node {node_id} and target {target_id} belong to different projects")]
    ProjectMismatch { node_id: DbId, target_id: DbId },
}

impl From<MoveError> for CoreError {
    fn from(err: MoveError) -> Self {
        match err {
            MoveError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            other => CoreError::Conflict(other.to_string()),
        }
    }
}

/// Plan moving `node_id` relative to `target_id`.
///
/// Rejects self-moves, a redundant `inside` move onto the current parent,
/// and any move whose target lies inside the moved subtree (for `above` /
/// `below` that would make the node its own ancestor just as `inside` does).
pub fn plan_move(
    nodes: &[WbsNode],
    node_id: DbId,
    target_id: DbId,
    relation: MoveRelation,
) -> Result<MovePlan, MoveError> {
    if node_id == target_id {
        return Err(MoveError::SelfMove(node_id));
    }

    let index = SiblingIndex::new(nodes);
    let node = index.get(node_id).ok_or(MoveError::NotFound {
        entity: NODE_ENTITY,
        id: node_id,
    })?;
    let target = index.get(target_id).ok_or(MoveError::NotFound {
        entity: NODE_ENTITY,
        id: target_id,
    })?;

    if node.project_id != target.project_id {
        return Err(MoveError::ProjectMismatch { node_id, target_id });
    }
    if relation == MoveRelation::Inside && node.parent_id == Some(target_id) {
        return Err(MoveError::AlreadyChild { node_id, target_id });
    }
    if index.is_descendant(node_id, target_id) {
        return Err(MoveError::IntoOwnSubtree { node_id, target_id });
    }

    // Sibling position equals order_idx whenever the group is consecutive;
    // using the position keeps the plan sane if a gap slipped through.
    let target_pos = index.rank(target_id).map_or(target.order_idx, |r| r as i32 - 1);
    let target_level = index.depth(target_id).unwrap_or(target.level);

    let (new_parent_id, new_level, mut insert_rank) = match relation {
        MoveRelation::Above => (target.parent_id, target_level, target_pos),
        MoveRelation::Below => (target.parent_id, target_level, target_pos + 1),
        MoveRelation::Inside => (
            Some(target_id),
            target_level + 1,
            index.children(target).len() as i32,
        ),
    };

    if node.parent_id == new_parent_id {
        let old_pos = index.rank(node_id).map_or(node.order_idx, |r| r as i32 - 1);
        if old_pos < insert_rank {
            insert_rank -= 1;
        }
    }

    Ok(MovePlan {
        node_id,
        project_id: node.project_id,
        old_parent_id: node.parent_id,
        new_parent_id,
        new_level,
        insert_rank,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wbs::fixtures::{node, sample, settle, PROJECT};
    use assert_matches::assert_matches;

    fn design_build() -> Vec<WbsNode> {
        settle(vec![node(1, None, 0, "Design"), node(2, None, 1, "Build")])
    }

    // -- rejections ----------------------------------------------------------

    #[test]
    fn rejects_self_move() {
        let nodes = sample();
        assert_matches!(
            plan_move(&nodes, 2, 2, MoveRelation::Above),
            Err(MoveError::SelfMove(2))
        );
    }

    #[test]
    fn rejects_inside_current_parent() {
        let nodes = sample();
        assert_matches!(
            plan_move(&nodes, 5, 2, MoveRelation::Inside),
            Err(MoveError::AlreadyChild {
                node_id: 5,
                target_id: 2
            })
        );
    }

    #[test]
    fn rejects_inside_own_descendant() {
        let nodes = sample();
        assert_matches!(
            plan_move(&nodes, 2, 7, MoveRelation::Inside),
            Err(MoveError::IntoOwnSubtree { .. })
        );
    }

    #[test]
    fn rejects_beside_own_descendant() {
        // Below child 5 would make 2's new parent 2 itself.
        let nodes = sample();
        assert_matches!(
            plan_move(&nodes, 2, 5, MoveRelation::Below),
            Err(MoveError::IntoOwnSubtree { .. })
        );
    }

    #[test]
    fn rejects_missing_node_and_target() {
        let nodes = sample();
        assert_matches!(
            plan_move(&nodes, 99, 1, MoveRelation::Above),
            Err(MoveError::NotFound { id: 99, .. })
        );
        assert_matches!(
            plan_move(&nodes, 1, 99, MoveRelation::Above),
            Err(MoveError::NotFound { id: 99, .. })
        );
    }

    #[test]
    fn rejects_cross_project_move() {
        let mut nodes = sample();
        let mut stranger = node(50, None, 0, "Elsewhere");
        stranger.project_id = PROJECT + 1;
        nodes.push(stranger);
        assert_matches!(
            plan_move(&nodes, 1, 50, MoveRelation::Inside),
            Err(MoveError::ProjectMismatch { .. })
        );
    }

    #[test]
    fn illegal_moves_map_to_conflict() {
        let err: CoreError = MoveError::SelfMove(3).into();
        assert_matches!(err, CoreError::Conflict(msg) if msg.contains("onto itself"));
        let err: CoreError = MoveError::NotFound {
            entity: NODE_ENTITY,
            id: 3,
        }
        .into();
        assert_matches!(err, CoreError::NotFound { id: 3, .. });
    }

    // -- positions -----------------------------------------------------------

    #[test]
    fn above_earlier_sibling_takes_its_slot() {
        let plan = plan_move(&design_build(), 2, 1, MoveRelation::Above).unwrap();
        assert_eq!(plan.new_parent_id, None);
        assert_eq!(plan.new_level, 0);
        assert_eq!(plan.insert_rank, 0);
        assert!(!plan.changes_parent());
    }

    #[test]
    fn below_later_sibling_accounts_for_gap() {
        // Design (0) below Build (1): raw rank 2, minus the vacated slot.
        let plan = plan_move(&design_build(), 1, 2, MoveRelation::Below).unwrap();
        assert_eq!(plan.insert_rank, 1);
    }

    #[test]
    fn above_later_sibling_accounts_for_gap() {
        let nodes = settle(vec![
            node(1, None, 0, "a"),
            node(2, None, 1, "b"),
            node(3, None, 2, "c"),
        ]);
        let plan = plan_move(&nodes, 1, 3, MoveRelation::Above).unwrap();
        assert_eq!(plan.insert_rank, 1);
    }

    #[test]
    fn inside_appends_after_existing_children() {
        let nodes = sample();
        let plan = plan_move(&nodes, 3, 5, MoveRelation::Inside).unwrap();
        assert_eq!(plan.new_parent_id, Some(5));
        assert_eq!(plan.new_level, 2);
        assert_eq!(plan.insert_rank, 2);
        assert!(plan.changes_parent());
    }

    #[test]
    fn inside_childless_target_is_rank_zero() {
        let nodes = sample();
        let plan = plan_move(&nodes, 2, 4, MoveRelation::Inside).unwrap();
        assert_eq!(plan.new_parent_id, Some(4));
        assert_eq!(plan.new_level, 2);
        assert_eq!(plan.insert_rank, 0);
    }

    #[test]
    fn beside_node_in_other_group_uses_target_parent() {
        let nodes = sample();
        let plan = plan_move(&nodes, 6, 1, MoveRelation::Below).unwrap();
        assert_eq!(plan.old_parent_id, Some(5));
        assert_eq!(plan.new_parent_id, None);
        assert_eq!(plan.new_level, 0);
        assert_eq!(plan.insert_rank, 1);
    }

    #[test]
    fn planning_does_not_mutate() {
        let nodes = sample();
        let before = nodes.clone();
        let _ = plan_move(&nodes, 6, 1, MoveRelation::Below);
        assert_eq!(nodes, before);
    }
}
