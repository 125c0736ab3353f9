//! Client-side view of one project tree.
//!
//! A [`TreeSession`] holds the tree currently on screen. A local edit is
//! applied optimistically and the session goes read-only until the store
//! answers; [`TreeSession::settle`] then swaps in the authoritative tree.

use crate::error::CoreError;
use crate::types::DbId;
use crate::wbs::node::MoveRelation;
use crate::wbs::optimistic::{add_local, move_local};
use crate::wbs::tree::TreeNode;

/// An edit applied locally ahead of confirmation.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalEdit {
    Add {
        parent_id: Option<DbId>,
        node: TreeNode,
    },
    Move {
        node_id: DbId,
        target_id: DbId,
        relation: MoveRelation,
    },
}

#[derive(Debug, Clone, Default)]
pub struct TreeSession {
    version: u64,
    roots: Vec<TreeNode>,
    pending: Option<LocalEdit>,
}

impl TreeSession {
    pub fn new(roots: Vec<TreeNode>) -> Self {
        Self {
            version: 0,
            roots,
            pending: None,
        }
    }

    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    /// Bumped every time an authoritative tree is installed.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// True while an edit is in flight; no further edits are accepted.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&LocalEdit> {
        self.pending.as_ref()
    }

    /// Apply `edit` optimistically and lock the session until it settles.
    pub fn begin(&mut self, edit: LocalEdit) -> Result<&[TreeNode], CoreError> {
        if self.pending.is_some() {
            return Err(CoreError::Conflict(
                "Another tree edit is still in flight".to_string(),
            ));
        }
        self.roots = match &edit {
            LocalEdit::Add { parent_id, node } => add_local(&self.roots, *parent_id, node.clone()),
            LocalEdit::Move {
                node_id,
                target_id,
                relation,
            } => move_local(&self.roots, *node_id, *target_id, *relation),
        };
        self.pending = Some(edit);
        Ok(&self.roots)
    }

    /// Install the tree read back from the store.
    ///
    /// Used both after a confirmed edit and after a rejected one; the
    /// predicted tree is discarded either way.
    pub fn settle(&mut self, authoritative: Vec<TreeNode>) {
        if let Some(edit) = self.pending.take() {
            tracing::debug!(?edit, version = self.version + 1, "Settled tree edit");
        }
        self.roots = authoritative;
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wbs::fixtures::{node, sample};
    use crate::wbs::tree::{build_tree, find_by_id};
    use assert_matches::assert_matches;

    fn session() -> TreeSession {
        TreeSession::new(build_tree(&sample()))
    }

    #[test]
    fn begin_applies_edit_and_locks() {
        let mut s = session();
        let roots = s
            .begin(LocalEdit::Move {
                node_id: 2,
                target_id: 1,
                relation: MoveRelation::Above,
            })
            .unwrap();
        assert_eq!(roots[0].id(), 2);
        assert!(s.is_pending());
    }

    #[test]
    fn second_edit_while_pending_is_rejected() {
        let mut s = session();
        s.begin(LocalEdit::Add {
            parent_id: Some(1),
            node: TreeNode::leaf(node(30, None, 0, "Draft")),
        })
        .unwrap();
        let err = s.begin(LocalEdit::Move {
            node_id: 3,
            target_id: 4,
            relation: MoveRelation::Below,
        });
        assert_matches!(err, Err(CoreError::Conflict(_)));
        // The rejected edit left the tree as the first edit predicted it.
        assert!(find_by_id(s.roots(), 30).is_some());
        assert_eq!(s.roots()[0].children[0].id(), 3);
    }

    #[test]
    fn settle_replaces_prediction_wholesale() {
        let mut s = session();
        s.begin(LocalEdit::Add {
            parent_id: Some(5),
            node: TreeNode::leaf(node(30, None, 0, "Temp")),
        })
        .unwrap();

        // The store assigned a different id; the temporary node must vanish.
        let mut stored = sample();
        stored.push(node(8, Some(5), 2, "Temp"));
        s.settle(build_tree(&stored));

        assert!(!s.is_pending());
        assert_eq!(s.version(), 1);
        assert!(find_by_id(s.roots(), 30).is_none());
        assert!(find_by_id(s.roots(), 8).is_some());
    }

    #[test]
    fn settle_after_rejection_restores_store_view() {
        let mut s = session();
        s.begin(LocalEdit::Move {
            node_id: 1,
            target_id: 2,
            relation: MoveRelation::Below,
        })
        .unwrap();
        s.settle(build_tree(&sample()));
        assert_eq!(s.roots()[0].id(), 1);
        assert!(s.begin(LocalEdit::Move {
            node_id: 1,
            target_id: 2,
            relation: MoveRelation::Below,
        })
        .is_ok());
    }
}
