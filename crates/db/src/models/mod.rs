//! Row structs and DTOs.
//!
//! Node DTOs live in `wbs_core` because the engine validates them; they are
//! re-exported here next to the row types.

pub mod project;
pub mod wbs_node;
