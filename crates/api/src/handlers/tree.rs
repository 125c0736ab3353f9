//! Handlers for the nested tree views of a project.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;
use wbs_core::types::DbId;
use wbs_core::wbs::node::WbsNode;
use wbs_core::wbs::tree::{build_tree, export_snapshot, search, ProjectTree, TreeExport};
use wbs_core::wbs::verify::{verify_consistency, Violation};
use wbs_db::repositories::WbsNodeRepo;

use crate::error::AppResult;
use crate::handlers::ensure_project;
use crate::query::SearchParams;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct VerifyReport {
    pub consistent: bool,
    pub node_count: usize,
    pub violations: Vec<Violation>,
}

/// GET /api/v1/projects/{project_id}/tree
pub async fn get_tree(
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectTree>>> {
    let project = ensure_project(&state.pool, project_id).await?;
    let nodes = WbsNodeRepo::list_by_project(&state.pool, project_id).await?;
    let tree = ProjectTree::new(project.id, project.name, build_tree(&nodes));
    Ok(Json(DataResponse { data: tree }))
}

/// GET /api/v1/projects/{project_id}/tree/search?q=
pub async fn search_tree(
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<DataResponse<Vec<WbsNode>>>> {
    ensure_project(&state.pool, project_id).await?;
    let nodes = WbsNodeRepo::list_by_project(&state.pool, project_id).await?;
    let roots = build_tree(&nodes);
    let hits: Vec<WbsNode> = search(&roots, &params.q).into_iter().cloned().collect();
    tracing::debug!(project_id, query = %params.q, hits = hits.len(), "Searched WBS tree");
    Ok(Json(DataResponse { data: hits }))
}

/// GET /api/v1/projects/{project_id}/tree/export
pub async fn export(
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<TreeExport>>> {
    ensure_project(&state.pool, project_id).await?;
    let nodes = WbsNodeRepo::list_by_project(&state.pool, project_id).await?;
    let snapshot = export_snapshot(&build_tree(&nodes));
    Ok(Json(DataResponse { data: snapshot }))
}

/// GET /api/v1/projects/{project_id}/tree/verify
pub async fn verify(
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<VerifyReport>>> {
    ensure_project(&state.pool, project_id).await?;
    let nodes = WbsNodeRepo::list_by_project(&state.pool, project_id).await?;
    let violations = verify_consistency(&nodes);
    if !violations.is_empty() {
        tracing::warn!(project_id, violations = violations.len(), "WBS tree is inconsistent");
    }
    Ok(Json(DataResponse {
        data: VerifyReport {
            consistent: violations.is_empty(),
            node_count: nodes.len(),
            violations,
        },
    }))
}
