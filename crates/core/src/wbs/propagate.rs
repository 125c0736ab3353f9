//! Subtree code propagation.
//!
//! Once a node's ancestry or sibling rank changes, its code and every
//! descendant's code are stale, and so are their levels when the parent
//! changed. Each code is derived independently from the current snapshot,
//! so the order in which nodes are regenerated does not matter.

use std::collections::{HashMap, HashSet};

use crate::types::{DbId, Timestamp};
use crate::wbs::code::code_from_index;
use crate::wbs::index::SiblingIndex;
use crate::wbs::node::WbsNode;
use crate::wbs::reindex::sibling_ids;

/// Regenerate level and code for `node_id` and all of its descendants.
///
/// Returns ids whose stored level or code actually changed; those rows also
/// get `updated_at = now`. Unknown ids are a no-op.
pub fn propagate_codes(nodes: &mut [WbsNode], node_id: DbId, now: Timestamp) -> Vec<DbId> {
    regenerate(nodes, &[node_id], now)
}

/// Regenerate every member of a sibling group together with its subtree.
///
/// Needed after a reindex: closing or opening a gap shifts the rank, and so
/// the code, of every later sibling and everything below it.
pub fn propagate_group_codes(
    nodes: &mut [WbsNode],
    project_id: DbId,
    parent_id: Option<DbId>,
    now: Timestamp,
) -> Vec<DbId> {
    let members = sibling_ids(nodes, project_id, parent_id);
    regenerate(nodes, &members, now)
}

fn regenerate(nodes: &mut [WbsNode], starts: &[DbId], now: Timestamp) -> Vec<DbId> {
    let updates: HashMap<DbId, (i32, Option<String>)> = {
        let index = SiblingIndex::new(nodes);
        let mut seen = HashSet::new();
        let mut targets = Vec::new();
        for &start in starts {
            if index.get(start).is_none() {
                continue;
            }
            for id in std::iter::once(start).chain(index.descendant_ids(start)) {
                if seen.insert(id) {
                    targets.push(id);
                }
            }
        }

        targets
            .into_iter()
            .filter_map(|id| {
                let level = index.depth(id)?;
                Some((id, (level, code_from_index(&index, id))))
            })
            .collect()
    };

    let mut changed = Vec::new();
    for node in nodes.iter_mut() {
        let Some((level, code)) = updates.get(&node.id) else {
            continue;
        };
        if node.level != *level || node.wbs_code != *code {
            node.level = *level;
            node.wbs_code = code.clone();
            node.updated_at = now;
            changed.push(node.id);
        }
    }

    tracing::debug!(
        starts = starts.len(),
        regenerated = updates.len(),
        changed = changed.len(),
        "Propagated WBS codes"
    );
    changed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wbs::fixtures::{code, find, later, node, sample, PROJECT};

    #[test]
    fn fills_codes_and_levels_for_subtree() {
        let mut nodes = vec![
            node(1, None, 0, "root"),
            node(2, Some(1), 0, "child"),
            node(3, Some(2), 0, "grandchild"),
        ];
        let changed = propagate_codes(&mut nodes, 1, later());
        assert_eq!(changed.len(), 3);
        assert_eq!(code(&nodes, 3), "1.1.1");
        assert_eq!(find(&nodes, 3).level, 2);
    }

    #[test]
    fn consistent_subtree_reports_no_changes() {
        let mut nodes = sample();
        let before = nodes.clone();
        assert!(propagate_codes(&mut nodes, 2, later()).is_empty());
        assert_eq!(nodes, before);
    }

    #[test]
    fn reparented_subtree_is_recomputed() {
        let mut nodes = sample();
        // Hand-reparent Backend (5) under Review (4) as its only child.
        for n in nodes.iter_mut().filter(|n| n.id == 5) {
            n.parent_id = Some(4);
            n.order_idx = 0;
        }
        let mut changed = propagate_codes(&mut nodes, 5, later());
        changed.sort_unstable();
        assert_eq!(changed, vec![5, 6, 7]);
        assert_eq!(code(&nodes, 5), "1.2.1");
        assert_eq!(code(&nodes, 7), "1.2.1.2");
        assert_eq!(find(&nodes, 7).level, 3);
        assert_eq!(find(&nodes, 7).updated_at, later());
    }

    #[test]
    fn untouched_nodes_keep_timestamps() {
        let mut nodes = sample();
        for n in nodes.iter_mut().filter(|n| n.id == 7) {
            n.wbs_code = Some("stale".into());
        }
        propagate_codes(&mut nodes, 5, later());
        assert_eq!(find(&nodes, 6).updated_at, find(&nodes, 1).updated_at);
        assert_eq!(code(&nodes, 7), "2.1.2");
    }

    #[test]
    fn group_propagation_covers_shifted_siblings() {
        let mut nodes = sample();
        // Swap the two roots by hand; both subtrees need new codes.
        for n in nodes.iter_mut() {
            match n.id {
                1 => n.order_idx = 1,
                2 => n.order_idx = 0,
                _ => {}
            }
        }
        propagate_group_codes(&mut nodes, 1, None, later());
        assert_eq!(code(&nodes, 2), "1");
        assert_eq!(code(&nodes, 6), "1.1.1");
        assert_eq!(code(&nodes, 4), "2.2");
    }

    #[test]
    fn unknown_start_is_a_no_op() {
        let mut nodes = sample();
        assert!(propagate_codes(&mut nodes, 404, later()).is_empty());
    }

    #[test]
    fn root_group_settles_everything() {
        let mut nodes = vec![node(1, None, 0, "a"), node(2, Some(1), 0, "b")];
        propagate_group_codes(&mut nodes, PROJECT, None, later());
        assert_eq!(code(&nodes, 2), "1.1");
        assert_eq!(find(&nodes, 2).level, 1);
    }
}
