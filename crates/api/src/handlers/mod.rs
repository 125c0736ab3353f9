//! Request handlers, one module per resource.

pub mod project;
pub mod tree;
pub mod wbs_node;

use wbs_core::error::CoreError;
use wbs_core::types::DbId;
use wbs_db::models::project::{Project, PROJECT_ENTITY};
use wbs_db::repositories::ProjectRepo;
use wbs_db::DbPool;

use crate::error::AppResult;

/// Load a project or fail with 404.
pub(crate) async fn ensure_project(pool: &DbPool, id: DbId) -> AppResult<Project> {
    let project = ProjectRepo::find_by_id(pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: PROJECT_ENTITY,
            id,
        })?;
    Ok(project)
}
