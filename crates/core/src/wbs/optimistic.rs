//! Optimistic edits over the nested tree.
//!
//! The client applies these immediately so an edit shows up before the
//! store confirms it. Every function returns a new tree and leaves its input
//! untouched. The result is a prediction only: once the store read-back
//! arrives it replaces the predicted tree wholesale, never field by field.

use crate::types::DbId;
use crate::wbs::node::MoveRelation;
use crate::wbs::tree::TreeNode;

/// Append `new_node` under `parent_id` (`None` for the root level).
///
/// Returns the tree unchanged if the parent is not in it.
pub fn add_local(tree: &[TreeNode], parent_id: Option<DbId>, new_node: TreeNode) -> Vec<TreeNode> {
    let mut next = tree.to_vec();
    let mut added = new_node;
    added.node.parent_id = parent_id;

    match parent_id {
        None => {
            relevel(&mut added, 0);
            next.push(added);
        }
        Some(pid) => match find_mut(&mut next, pid) {
            Some(parent) => {
                relevel(&mut added, parent.node.level + 1);
                parent.children.push(added);
            }
            None => return tree.to_vec(),
        },
    }
    next
}

/// Detach `node_id` and reinsert it relative to `target_id`.
///
/// A missing node, a missing target, or a target inside the moved subtree
/// leaves the tree unchanged; the authoritative store decides those cases.
pub fn move_local(
    tree: &[TreeNode],
    node_id: DbId,
    target_id: DbId,
    relation: MoveRelation,
) -> Vec<TreeNode> {
    if node_id == target_id {
        return tree.to_vec();
    }

    let mut next = tree.to_vec();
    let Some(mut moved) = detach(&mut next, node_id) else {
        return tree.to_vec();
    };

    match relation {
        MoveRelation::Inside => {
            let Some(target) = find_mut(&mut next, target_id) else {
                return tree.to_vec();
            };
            moved.node.parent_id = Some(target_id);
            relevel(&mut moved, target.node.level + 1);
            target.children.push(moved);
        }
        MoveRelation::Above | MoveRelation::Below => {
            let Some(slot) = siblings_of_mut(&mut next, target_id) else {
                return tree.to_vec();
            };
            let at = if relation == MoveRelation::Above {
                slot.pos
            } else {
                slot.pos + 1
            };
            moved.node.parent_id = slot.parent_id;
            relevel(&mut moved, slot.level);
            slot.list.insert(at, moved);
        }
    }
    next
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Slot<'a> {
    list: &'a mut Vec<TreeNode>,
    pos: usize,
    parent_id: Option<DbId>,
    level: i32,
}

fn find_mut(roots: &mut [TreeNode], id: DbId) -> Option<&mut TreeNode> {
    let mut stack: Vec<&mut TreeNode> = roots.iter_mut().rev().collect();
    while let Some(current) = stack.pop() {
        if current.id() == id {
            return Some(current);
        }
        stack.extend(current.children.iter_mut().rev());
    }
    None
}

/// The list holding `id`, its position in it, and that list's parent.
fn siblings_of_mut(roots: &mut Vec<TreeNode>, id: DbId) -> Option<Slot<'_>> {
    if let Some(pos) = roots.iter().position(|t| t.id() == id) {
        return Some(Slot {
            list: roots,
            pos,
            parent_id: None,
            level: 0,
        });
    }

    let mut stack: Vec<&mut TreeNode> = roots.iter_mut().collect();
    while let Some(current) = stack.pop() {
        if let Some(pos) = current.children.iter().position(|c| c.id() == id) {
            return Some(Slot {
                parent_id: Some(current.node.id),
                level: current.node.level + 1,
                list: &mut current.children,
                pos,
            });
        }
        stack.extend(current.children.iter_mut());
    }
    None
}

fn detach(roots: &mut Vec<TreeNode>, id: DbId) -> Option<TreeNode> {
    let slot = siblings_of_mut(roots, id)?;
    Some(slot.list.remove(slot.pos))
}

fn relevel(root: &mut TreeNode, level: i32) {
    let mut stack = vec![(root, level)];
    while let Some((current, lvl)) = stack.pop() {
        current.node.level = lvl;
        stack.extend(current.children.iter_mut().map(|c| (c, lvl + 1)));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
