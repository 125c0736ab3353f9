//! Domain core for the WBS service.
//!
//! Holds the node record, the tree reordering and hierarchical-code engine,
//! and the client-side optimistic tree helpers. Nothing in this crate does
//! I/O; the `db` crate feeds it the current flat node set and writes back
//! whatever it changes.

pub mod error;
pub mod types;
pub mod wbs;
