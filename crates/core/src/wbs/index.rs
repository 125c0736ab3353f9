//! Read-only lookup structure over one snapshot of the flat node set.
//!
//! Built immediately before a structural step acts, so every sibling rank
//! and ancestor chain it answers reflects the current records.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::types::DbId;
use crate::wbs::node::WbsNode;

/// `(project_id, parent_id)`: root-level nodes of different projects never
/// share a sibling group.
pub type GroupKey = (DbId, Option<DbId>);

pub struct SiblingIndex<'a> {
    by_id: HashMap<DbId, &'a WbsNode>,
    groups: HashMap<GroupKey, Vec<&'a WbsNode>>,
    /// 1-indexed position within the node's sibling group.
    rank: HashMap<DbId, usize>,
}

impl<'a> SiblingIndex<'a> {
    pub fn new(nodes: &'a [WbsNode]) -> Self {
        let mut groups: HashMap<GroupKey, Vec<&'a WbsNode>> = HashMap::new();
        for node in nodes {
            groups
                .entry((node.project_id, node.parent_id))
                .or_default()
                .push(node);
        }
        // Ties on order_idx should not happen; the id tiebreak only keeps
        // the result deterministic if they do.
        for group in groups.values_mut() {
            group.sort_by_key(|n| (n.order_idx, n.id));
        }

        let rank = groups
            .values()
            .flat_map(|g| g.iter().enumerate().map(|(i, n)| (n.id, i + 1)))
            .collect();
        let by_id = nodes.iter().map(|n| (n.id, n)).collect();

        Self {
            by_id,
            groups,
            rank,
        }
    }

    pub fn get(&self, id: DbId) -> Option<&'a WbsNode> {
        self.by_id.get(&id).copied()
    }

    /// Siblings sharing `parent_id` in display order.
    pub fn siblings(&self, project_id: DbId, parent_id: Option<DbId>) -> &[&'a WbsNode] {
        self.groups
            .get(&(project_id, parent_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn children(&self, node: &WbsNode) -> &[&'a WbsNode] {
        self.siblings(node.project_id, Some(node.id))
    }

    pub fn groups(&self) -> impl Iterator<Item = (&GroupKey, &Vec<&'a WbsNode>)> {
        self.groups.iter()
    }

    /// 1-indexed rank of `id` within its sibling group.
    pub fn rank(&self, id: DbId) -> Option<usize> {
        self.rank.get(&id).copied()
    }

    /// The node followed by each ancestor up to its root-level ancestor.
    ///
    /// `None` if the node is missing, an ancestor is missing, or the chain
    /// loops back on itself.
    pub fn ancestor_chain(&self, id: DbId) -> Option<Vec<&'a WbsNode>> {
        let mut chain = Vec::new();
        let mut current = self.get(id)?;
        loop {
            chain.push(current);
            if chain.len() > self.by_id.len() {
                return None;
            }
            match current.parent_id {
                None => return Some(chain),
                Some(parent_id) => current = self.get(parent_id)?,
            }
        }
    }

    /// Whether `candidate` sits strictly below `ancestor`.
    pub fn is_descendant(&self, ancestor: DbId, candidate: DbId) -> bool {
        self.ancestor_chain(candidate)
            .map(|chain| chain.iter().skip(1).any(|n| n.id == ancestor))
            .unwrap_or(false)
    }

    /// All ids strictly below `id`, breadth-first (parents before children).
    pub fn descendant_ids(&self, id: DbId) -> Vec<DbId> {
        let Some(root) = self.get(id) else {
            return Vec::new();
        };
        let mut seen = HashSet::from([id]);
        let mut out = Vec::new();
        let mut queue = VecDeque::from([root]);
        while let Some(node) = queue.pop_front() {
            for child in self.children(node) {
                if seen.insert(child.id) {
                    out.push(child.id);
                    queue.push_back(child);
                }
            }
        }
        out
    }

    /// Depth from the root level, or `None` for a broken chain.
    pub fn depth(&self, id: DbId) -> Option<i32> {
        self.ancestor_chain(id).map(|chain| chain.len() as i32 - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wbs::fixtures::{node, sample, PROJECT};

    #[test]
    fn siblings_follow_order_idx() {
        let nodes = vec![
            node(1, None, 2, "c"),
            node(2, None, 0, "a"),
            node(3, None, 1, "b"),
        ];
        let index = SiblingIndex::new(&nodes);
        let ids: Vec<DbId> = index.siblings(PROJECT, None).iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(index.rank(1), Some(3));
    }

    #[test]
    fn root_groups_are_scoped_per_project() {
        let mut other = node(9, None, 0, "other project");
        other.project_id = PROJECT + 1;
        let nodes = vec![node(1, None, 0, "a"), other];
        let index = SiblingIndex::new(&nodes);
        assert_eq!(index.siblings(PROJECT, None).len(), 1);
        assert_eq!(index.rank(9), Some(1));
    }

    #[test]
    fn ancestor_chain_runs_node_to_root() {
        let nodes = sample();
        let index = SiblingIndex::new(&nodes);
        let ids: Vec<DbId> = index.ancestor_chain(7).unwrap().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![7, 5, 2]);
    }

    #[test]
    fn ancestor_chain_none_for_cycle() {
        let nodes = vec![node(1, Some(2), 0, "a"), node(2, Some(1), 0, "b")];
        let index = SiblingIndex::new(&nodes);
        assert!(index.ancestor_chain(1).is_none());
    }

    #[test]
    fn ancestor_chain_none_for_dangling_parent() {
        let nodes = vec![node(1, Some(42), 0, "orphan")];
        let index = SiblingIndex::new(&nodes);
        assert!(index.ancestor_chain(1).is_none());
    }

    #[test]
    fn descendants_are_breadth_first() {
        let nodes = sample();
        let index = SiblingIndex::new(&nodes);
        assert_eq!(index.descendant_ids(2), vec![5, 6, 7]);
        assert!(index.descendant_ids(6).is_empty());
        assert!(index.descendant_ids(404).is_empty());
    }

    #[test]
    fn is_descendant_is_strict() {
        let nodes = sample();
        let index = SiblingIndex::new(&nodes);
        assert!(index.is_descendant(2, 7));
        assert!(!index.is_descendant(7, 2));
        assert!(!index.is_descendant(2, 2));
        assert!(!index.is_descendant(1, 7));
    }

    #[test]
    fn depth_counts_ancestors() {
        let nodes = sample();
        let index = SiblingIndex::new(&nodes);
        assert_eq!(index.depth(2), Some(0));
        assert_eq!(index.depth(6), Some(2));
    }
}
