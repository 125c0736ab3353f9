//! Work Breakdown Structure engine.
//!
//! Leaf-first:
//!
//! - [`index`]: sibling groups, ranks, and ancestor chains over one snapshot.
//! - [`code`]: dotted hierarchical code from ancestor sibling ranks.
//! - [`reindex`]: consecutive `order_idx` assignment within a sibling group.
//! - [`move_plan`]: validation and target position of a move.
//! - [`propagate`]: level and code regeneration over a moved subtree.
//! - [`tree`]: nested projection of the flat record set.
//! - [`optimistic`]: pure edits over the nested projection.
//! - [`session`]: client-held tree snapshot with a single pending edit.
//! - [`ops`]: add/move/delete applied to a flat node set, composing the above.
//! - [`verify`]: whole-project invariant report.

pub mod code;
pub mod index;
pub mod move_plan;
pub mod node;
pub mod ops;
pub mod optimistic;
pub mod propagate;
pub mod reindex;
pub mod session;
pub mod tree;
pub mod verify;

#[cfg(test)]
pub(crate) mod fixtures;
