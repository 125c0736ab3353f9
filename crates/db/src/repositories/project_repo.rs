//! Repository for the `projects` table.

use sqlx::{PgConnection, PgPool};
use wbs_core::error::CoreError;
use wbs_core::types::DbId;

use crate::error::RepoResult;
use crate::models::project::{CreateProject, Project, PROJECT_ENTITY};

const COLUMNS: &str = "id, name, description, created_at, updated_at";

pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (name, description)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(input.name.trim())
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all projects, most recently created first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Project>(&query).fetch_all(pool).await
    }

    /// Delete a project and, through the foreign key, its whole tree.
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Take the per-project write lock for the rest of the transaction.
    ///
    /// Every structural edit of a project's tree goes through this row, so two
    /// edits of the same tree never interleave their reindex passes.
    pub(crate) async fn lock(conn: &mut PgConnection, id: DbId) -> RepoResult<()> {
        let found: Option<DbId> =
            sqlx::query_scalar("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;
        match found {
            Some(_) => Ok(()),
            None => Err(CoreError::NotFound {
                entity: PROJECT_ENTITY,
                id,
            }
            .into()),
        }
    }
}
