//! Hierarchical code generation.
//!
//! A node's code is the dot-joined sequence of 1-indexed sibling ranks from
//! its root-level ancestor down to the node itself (e.g. `"2.1.3"`). Codes
//! are always regenerated from scratch against current `parent_id` /
//! `order_idx` values; they are never patched incrementally.

use crate::types::DbId;
use crate::wbs::index::SiblingIndex;
use crate::wbs::node::WbsNode;

/// Generate the code for `node_id` from the given flat node set.
///
/// Returns `None` if the node does not exist or its ancestor chain is broken.
pub fn generate_code(nodes: &[WbsNode], node_id: DbId) -> Option<String> {
    code_from_index(&SiblingIndex::new(nodes), node_id)
}

/// Same as [`generate_code`] against a prebuilt index, for bulk regeneration.
pub fn code_from_index(index: &SiblingIndex<'_>, node_id: DbId) -> Option<String> {
    let chain = index.ancestor_chain(node_id)?;
    let ranks = chain
        .iter()
        .rev()
        .map(|n| index.rank(n.id))
        .collect::<Option<Vec<usize>>>()?;
    Some(format_code(&ranks))
}

/// Join 1-indexed ranks into a dotted code.
fn format_code(ranks: &[usize]) -> String {
    ranks
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wbs::fixtures::{node, sample};

    // -- generate_code -------------------------------------------------------

    #[test]
    fn root_nodes_get_single_segment() {
        let nodes = sample();
        assert_eq!(generate_code(&nodes, 1).as_deref(), Some("1"));
        assert_eq!(generate_code(&nodes, 2).as_deref(), Some("2"));
    }

    #[test]
    fn nested_nodes_join_ancestor_ranks() {
        let nodes = sample();
        assert_eq!(generate_code(&nodes, 4).as_deref(), Some("1.2"));
        assert_eq!(generate_code(&nodes, 6).as_deref(), Some("2.1.1"));
        assert_eq!(generate_code(&nodes, 7).as_deref(), Some("2.1.2"));
    }

    #[test]
    fn missing_node_yields_none() {
        assert!(generate_code(&sample(), 999).is_none());
    }

    #[test]
    fn rank_follows_order_not_insertion() {
        // Slice order deliberately disagrees with order_idx.
        let nodes = vec![node(10, None, 1, "second"), node(11, None, 0, "first")];
        assert_eq!(generate_code(&nodes, 10).as_deref(), Some("2"));
        assert_eq!(generate_code(&nodes, 11).as_deref(), Some("1"));
    }

    #[test]
    fn gaps_in_order_do_not_leak_into_ranks() {
        let nodes = vec![node(1, None, 0, "a"), node(2, None, 5, "b")];
        assert_eq!(generate_code(&nodes, 2).as_deref(), Some("2"));
    }

    #[test]
    fn cycle_yields_none() {
        let nodes = vec![node(1, Some(2), 0, "a"), node(2, Some(1), 0, "b")];
        assert!(generate_code(&nodes, 1).is_none());
    }

    // -- format_code ---------------------------------------------------------

    #[test]
    fn format_joins_ranks_with_dots() {
        assert_eq!(format_code(&[2, 1, 3]), "2.1.3");
        assert_eq!(format_code(&[4]), "4");
    }
}
