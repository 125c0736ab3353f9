//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument.

pub mod project_repo;
pub mod wbs_node_repo;

pub use project_repo::ProjectRepo;
pub use wbs_node_repo::WbsNodeRepo;
