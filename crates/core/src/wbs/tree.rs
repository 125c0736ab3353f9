//! Nested tree projection of a project's flat node records.
//!
//! [`build_tree`] groups records by parent and orders every sibling group by
//! `order_idx`; that order is the canonical display order at every level.
//! Traversals walk the projection pre-order (parent before children) with an
//! explicit stack, so deep trees never hit the call-depth limit.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};
use crate::wbs::node::WbsNode;

/// Version stamped on every export document.
pub const EXPORT_VERSION: &str = "1.0";

/// A node together with the children it owns in the projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub node: WbsNode,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(node: WbsNode) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> DbId {
        self.node.id
    }
}

/// The owning project shown as a synthetic root above the root-level nodes.
///
/// Display-only: it is never persisted as a node and no tree operation can
/// move, reparent, or delete it.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectTree {
    pub project_id: DbId,
    pub name: String,
    pub level: i32,
    pub children: Vec<TreeNode>,
}

impl ProjectTree {
    pub fn new(project_id: DbId, name: impl Into<String>, roots: Vec<TreeNode>) -> Self {
        Self {
            project_id,
            name: name.into(),
            level: 0,
            children: roots,
        }
    }
}

/// Point-in-time dump of the tree for download or backup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeExport {
    pub version: String,
    #[serde(rename = "exportDate")]
    pub exported_at: Timestamp,
    pub nodes: Vec<TreeNode>,
}

// ---------------------------------------------------------------------------
// Build / flatten
// ---------------------------------------------------------------------------

/// Assemble flat records into nested roots.
///
/// Records whose parent is absent from `flat` are unreachable and dropped.
pub fn build_tree(flat: &[WbsNode]) -> Vec<TreeNode> {
    let mut groups: HashMap<Option<DbId>, Vec<&WbsNode>> = HashMap::new();
    for node in flat {
        groups.entry(node.parent_id).or_default().push(node);
    }
    for group in groups.values_mut() {
        group.sort_by_key(|n| (n.order_idx, n.id));
    }

    let roots: Vec<TreeNode> = groups
        .get(&None)
        .map(|roots| roots.iter().map(|n| attach(n, &groups)).collect())
        .unwrap_or_default();

    let placed = count(&roots);
    if placed < flat.len() {
        tracing::debug!(
            dropped = flat.len() - placed,
            "Dropped unreachable nodes while building tree"
        );
    }
    roots
}

fn attach(node: &WbsNode, groups: &HashMap<Option<DbId>, Vec<&WbsNode>>) -> TreeNode {
    let children = groups
        .get(&Some(node.id))
        .map(|kids| kids.iter().map(|k| attach(k, groups)).collect())
        .unwrap_or_default();
    TreeNode {
        node: node.clone(),
        children,
    }
}

/// Pre-order iterator over a forest.
pub struct Preorder<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        self.stack.extend(current.children.iter().rev());
        Some(current)
    }
}

pub fn preorder(roots: &[TreeNode]) -> Preorder<'_> {
    Preorder {
        stack: roots.iter().rev().collect(),
    }
}

/// Flat records in display order (parent before children).
pub fn flatten(roots: &[TreeNode]) -> Vec<WbsNode> {
    preorder(roots).map(|t| t.node.clone()).collect()
}

/// Total number of nodes in the forest.
pub fn count(roots: &[TreeNode]) -> usize {
    preorder(roots).count()
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

pub fn find_by_id(roots: &[TreeNode], id: DbId) -> Option<&TreeNode> {
    preorder(roots).find(|t| t.id() == id)
}

/// Records from the root-level ancestor down to `id`, inclusive.
/// Empty if `id` is not in the tree.
pub fn path_to_root(roots: &[TreeNode], id: DbId) -> Vec<&WbsNode> {
    let mut stack: Vec<(&TreeNode, usize)> = roots.iter().rev().map(|t| (t, 0)).collect();
    let mut path: Vec<&WbsNode> = Vec::new();

    while let Some((current, depth)) = stack.pop() {
        path.truncate(depth);
        path.push(&current.node);
        if current.id() == id {
            return path;
        }
        stack.extend(current.children.iter().rev().map(|c| (c, depth + 1)));
    }
    Vec::new()
}

/// Nodes whose name, description, or code contains `query`, ignoring case.
///
/// Matches are independent per node: a parent that does not match still has
/// its children searched. The query is matched as given, surrounding
/// whitespace included. A blank query matches nothing.
pub fn search<'a>(roots: &'a [TreeNode], query: &str) -> Vec<&'a WbsNode> {
    let needle = query.to_lowercase();
    if needle.trim().is_empty() {
        return Vec::new();
    }
    preorder(roots)
        .map(|t| &t.node)
        .filter(|n| matches_query(n, &needle))
        .collect()
}

fn matches_query(node: &WbsNode, needle: &str) -> bool {
    let hit = |s: &str| s.to_lowercase().contains(needle);
    hit(&node.name)
        || node.description.as_deref().is_some_and(hit)
        || node.wbs_code.as_deref().is_some_and(hit)
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

pub fn export_snapshot(roots: &[TreeNode]) -> TreeExport {
    TreeExport {
        version: EXPORT_VERSION.to_string(),
        exported_at: chrono::Utc::now(),
        nodes: roots.to_vec(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
