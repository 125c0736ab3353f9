//! Repository for the `wbs_nodes` table.
//!
//! Reads are plain queries. Structural writes (insert, move, delete, reindex,
//! code propagation) follow one pattern: lock the owning project row, load
//! the project's current node set, run the engine over it, write back the
//! rows it reports as changed, commit. A rejected edit drops the transaction
//! before anything is written.

use std::collections::HashSet;

use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use wbs_core::error::CoreError;
use wbs_core::types::DbId;
use wbs_core::wbs::code::generate_code;
use wbs_core::wbs::move_plan::MoveError;
use wbs_core::wbs::node::{validate_id, MoveRelation, NewNode, NodeUpdate, WbsNode, NODE_ENTITY};
use wbs_core::wbs::ops::{apply_delete, apply_insert, apply_move, place_new, DeleteOutcome};
use wbs_core::wbs::propagate::{propagate_codes, propagate_group_codes};
use wbs_core::wbs::reindex::reindex;

use crate::error::RepoResult;
use crate::models::wbs_node::{into_nodes, WbsNodeRow, COLUMNS};
use crate::repositories::ProjectRepo;

pub struct WbsNodeRepo;

impl WbsNodeRepo {
    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// All nodes of a project, grouped by parent and ordered by `order_idx`.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<WbsNode>, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        load_project(&mut conn, project_id).await
    }

    /// Every node of the project that contains `id`, or `None` if no such
    /// node exists.
    pub async fn list_by_node_project(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Vec<WbsNode>>, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        let Some(project_id) = project_of(&mut conn, id).await? else {
            return Ok(None);
        };
        load_project(&mut conn, project_id).await.map(Some)
    }

    /// Find a node by id. The returned code is derived from the current
    /// sibling ranks rather than read from the cached column.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<WbsNode>, sqlx::Error> {
        let Some(nodes) = Self::list_by_node_project(pool, id).await? else {
            return Ok(None);
        };
        let code = generate_code(&nodes, id);
        Ok(nodes.into_iter().find(|n| n.id == id).map(|mut node| {
            node.wbs_code = code.or(node.wbs_code);
            node
        }))
    }

    // -----------------------------------------------------------------------
    // Field edits
    // -----------------------------------------------------------------------

    /// Insert a node at the end of its sibling group and generate its code.
    pub async fn create(pool: &PgPool, project_id: DbId, input: &NewNode) -> RepoResult<WbsNode> {
        input.check()?;
        if let Some(parent_id) = input.parent_id {
            validate_id("parent_id", parent_id)?;
        }

        let mut tx = pool.begin().await?;
        ProjectRepo::lock(&mut tx, project_id).await?;
        let mut nodes = load_project(&mut tx, project_id).await?;
        let placement = place_new(&nodes, project_id, input.parent_id)?;

        let query = format!(
            "INSERT INTO wbs_nodes
                (project_id, parent_id, name, description, order_idx, level, node_type)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, WbsNodeRow>(&query)
            .bind(project_id)
            .bind(input.parent_id)
            .bind(input.name.trim())
            .bind(&input.description)
            .bind(placement.order_idx)
            .bind(placement.level)
            .bind(input.node_type.as_str())
            .fetch_one(&mut *tx)
            .await?;
        let inserted = WbsNode::try_from(row)?;
        let id = inserted.id;
        let now = inserted.updated_at;

        let changed = apply_insert(&mut nodes, inserted, now)?;
        write_back(&mut tx, &nodes, &changed).await?;
        tx.commit().await?;

        tracing::info!(
            node_id = id,
            project_id,
            parent_id = ?input.parent_id,
            order_idx = placement.order_idx,
            "Created WBS node"
        );
        take(nodes, id)
    }

    /// Apply name / description / type changes. `None` fields are left as-is
    /// and structure is untouched, so no code needs regenerating. A
    /// `Some(None)` description clears it.
    ///
    /// Returns `None` if no node with the given `id` exists.
    pub async fn update_fields(
        pool: &PgPool,
        id: DbId,
        input: &NodeUpdate,
    ) -> RepoResult<Option<WbsNode>> {
        input.check()?;
        if input.is_empty() {
            return Ok(Self::find_by_id(pool, id).await?);
        }

        let query = format!(
            "UPDATE wbs_nodes SET
                name = COALESCE($2, name),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                node_type = COALESCE($5, node_type),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, WbsNodeRow>(&query)
            .bind(id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(input.description.is_some())
            .bind(input.description.as_ref().and_then(|d| d.as_deref()))
            .bind(input.node_type.map(|t| t.as_str()))
            .fetch_optional(pool)
            .await?;
        Ok(row.map(WbsNode::try_from).transpose()?)
    }

    // -----------------------------------------------------------------------
    // Structural edits
    // -----------------------------------------------------------------------

    /// Move `node_id` relative to `target_id` and return the moved record.
    pub async fn move_node(
        pool: &PgPool,
        node_id: DbId,
        target_id: DbId,
        relation: MoveRelation,
    ) -> RepoResult<WbsNode> {
        validate_id("node_id", node_id)?;
        validate_id("target_id", target_id)?;
        if node_id == target_id {
            return Err(CoreError::from(MoveError::SelfMove(node_id)).into());
        }

        let mut tx = pool.begin().await?;
        let project_id = project_of(&mut tx, node_id)
            .await?
            .ok_or(not_found(node_id))?;
        let target_project_id = project_of(&mut tx, target_id)
            .await?
            .ok_or(not_found(target_id))?;
        if target_project_id != project_id {
            return Err(CoreError::from(MoveError::ProjectMismatch { node_id, target_id }).into());
        }

        ProjectRepo::lock(&mut tx, project_id).await?;
        let mut nodes = load_project(&mut tx, project_id).await?;
        let outcome = apply_move(&mut nodes, node_id, target_id, relation, Utc::now())?;
        write_back(&mut tx, &nodes, &outcome.changed).await?;
        tx.commit().await?;

        tracing::info!(
            node_id,
            target_id,
            project_id,
            %relation,
            changed = outcome.changed.len(),
            "Moved WBS node"
        );
        take(nodes, node_id)
    }

    /// Delete a node with its subtree and renumber the siblings it leaves.
    pub async fn delete(pool: &PgPool, node_id: DbId) -> RepoResult<DeleteOutcome> {
        let mut tx = pool.begin().await?;
        let project_id = project_of(&mut tx, node_id)
            .await?
            .ok_or(not_found(node_id))?;

        ProjectRepo::lock(&mut tx, project_id).await?;
        let mut nodes = load_project(&mut tx, project_id).await?;
        let outcome = apply_delete(&mut nodes, node_id, Utc::now())?;

        sqlx::query("DELETE FROM wbs_nodes WHERE id = ANY($1)")
            .bind(&outcome.removed)
            .execute(&mut *tx)
            .await?;
        write_back(&mut tx, &nodes, &outcome.changed).await?;
        tx.commit().await?;

        tracing::info!(
            node_id,
            project_id,
            removed = outcome.removed.len(),
            renumbered = outcome.changed.len(),
            "Deleted WBS subtree"
        );
        Ok(outcome)
    }

    /// Renumber one sibling group to `0..n` and refresh the codes below it.
    ///
    /// Returns the ids whose rows changed.
    pub async fn reindex(
        pool: &PgPool,
        project_id: DbId,
        parent_id: Option<DbId>,
    ) -> RepoResult<Vec<DbId>> {
        let mut tx = pool.begin().await?;
        ProjectRepo::lock(&mut tx, project_id).await?;
        let mut nodes = load_project(&mut tx, project_id).await?;
        if let Some(pid) = parent_id {
            if !nodes.iter().any(|n| n.id == pid) {
                return Err(not_found(pid).into());
            }
        }

        let now = Utc::now();
        let mut changed: HashSet<DbId> = reindex(&mut nodes, project_id, parent_id, now)
            .into_iter()
            .collect();
        changed.extend(propagate_group_codes(&mut nodes, project_id, parent_id, now));
        let changed: Vec<DbId> = changed.into_iter().collect();

        write_back(&mut tx, &nodes, &changed).await?;
        tx.commit().await?;

        tracing::info!(project_id, parent_id = ?parent_id, changed = changed.len(), "Reindexed sibling group");
        Ok(changed)
    }

    /// Regenerate level and code for a node and its whole subtree.
    pub async fn propagate_codes(pool: &PgPool, node_id: DbId) -> RepoResult<Vec<DbId>> {
        let mut tx = pool.begin().await?;
        let project_id = project_of(&mut tx, node_id)
            .await?
            .ok_or(not_found(node_id))?;

        ProjectRepo::lock(&mut tx, project_id).await?;
        let mut nodes = load_project(&mut tx, project_id).await?;
        let changed = propagate_codes(&mut nodes, node_id, Utc::now());
        write_back(&mut tx, &nodes, &changed).await?;
        tx.commit().await?;

        tracing::info!(node_id, project_id, changed = changed.len(), "Propagated WBS codes");
        Ok(changed)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn not_found(id: DbId) -> CoreError {
    CoreError::NotFound {
        entity: NODE_ENTITY,
        id,
    }
}

async fn project_of(conn: &mut PgConnection, id: DbId) -> Result<Option<DbId>, sqlx::Error> {
    sqlx::query_scalar::<_, DbId>("SELECT project_id FROM wbs_nodes WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

async fn load_project(conn: &mut PgConnection, project_id: DbId) -> Result<Vec<WbsNode>, sqlx::Error> {
    let query = format!(
        "SELECT {COLUMNS} FROM wbs_nodes
         WHERE project_id = $1
         ORDER BY parent_id NULLS FIRST, order_idx, id"
    );
    let rows = sqlx::query_as::<_, WbsNodeRow>(&query)
        .bind(project_id)
        .fetch_all(&mut *conn)
        .await?;
    into_nodes(rows)
}

/// Persist the position fields of `ids`. Names, descriptions and types are
/// never touched by a structural edit.
async fn write_back(conn: &mut PgConnection, nodes: &[WbsNode], ids: &[DbId]) -> Result<(), sqlx::Error> {
    let wanted: HashSet<DbId> = ids.iter().copied().collect();
    for node in nodes.iter().filter(|n| wanted.contains(&n.id)) {
        sqlx::query(
            "UPDATE wbs_nodes SET
                parent_id = $2,
                order_idx = $3,
                level = $4,
                wbs_code = $5,
                updated_at = $6
             WHERE id = $1",
        )
        .bind(node.id)
        .bind(node.parent_id)
        .bind(node.order_idx)
        .bind(node.level)
        .bind(&node.wbs_code)
        .bind(node.updated_at)
        .execute(&mut *conn)
        .await?;
    }
    tracing::debug!(rows = wanted.len(), "Wrote back WBS rows");
    Ok(())
}

fn take(nodes: Vec<WbsNode>, id: DbId) -> RepoResult<WbsNode> {
    nodes
        .into_iter()
        .find(|n| n.id == id)
        .ok_or_else(|| not_found(id).into())
}
