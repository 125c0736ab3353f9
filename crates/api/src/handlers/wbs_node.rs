//! Handlers for WBS nodes: flat listing, field edits, move, delete, path.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use wbs_core::error::CoreError;
use wbs_core::types::DbId;
use wbs_core::wbs::node::{MoveRelation, NewNode, NodeUpdate, WbsNode, NODE_ENTITY};
use wbs_core::wbs::tree::{build_tree, flatten, path_to_root};
use wbs_db::repositories::WbsNodeRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::ensure_project;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /nodes/{id}/move`.
#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub target_id: DbId,
    pub relation: MoveRelation,
}

fn node_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: NODE_ENTITY,
        id,
    })
}

/// GET /api/v1/projects/{project_id}/nodes
///
/// Flat records in display order: parents before children, siblings by
/// `order_idx`.
pub async fn list_by_project(
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<WbsNode>>>> {
    ensure_project(&state.pool, project_id).await?;
    let nodes = WbsNodeRepo::list_by_project(&state.pool, project_id).await?;
    Ok(Json(DataResponse {
        data: flatten(&build_tree(&nodes)),
    }))
}

/// POST /api/v1/projects/{project_id}/nodes
pub async fn create(
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<NewNode>,
) -> AppResult<(StatusCode, Json<DataResponse<WbsNode>>)> {
    let node = WbsNodeRepo::create(&state.pool, project_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: node })))
}

/// GET /api/v1/nodes/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<WbsNode>>> {
    let node = WbsNodeRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| node_not_found(id))?;
    Ok(Json(DataResponse { data: node }))
}

/// PUT /api/v1/nodes/{id}
///
/// Only name, description and type; structure changes go through move.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<NodeUpdate>,
) -> AppResult<Json<DataResponse<WbsNode>>> {
    if input.is_empty() {
        return Err(AppError::BadRequest(
            "At least one of name, description or node_type is required".to_string(),
        ));
    }
    let node = WbsNodeRepo::update_fields(&state.pool, id, &input)
        .await?
        .ok_or_else(|| node_not_found(id))?;
    Ok(Json(DataResponse { data: node }))
}

/// DELETE /api/v1/nodes/{id}
///
/// Cascades to the whole subtree and renumbers the remaining siblings.
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    WbsNodeRepo::delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/nodes/{id}/move
pub async fn move_node(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<MoveRequest>,
) -> AppResult<Json<DataResponse<WbsNode>>> {
    let node = WbsNodeRepo::move_node(&state.pool, id, input.target_id, input.relation).await?;
    Ok(Json(DataResponse { data: node }))
}

/// GET /api/v1/nodes/{id}/path
///
/// Records from the root-level ancestor down to the node itself.
pub async fn path(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<WbsNode>>>> {
    let nodes = WbsNodeRepo::list_by_node_project(&state.pool, id)
        .await?
        .ok_or_else(|| node_not_found(id))?;
    let roots = build_tree(&nodes);
    let path: Vec<WbsNode> = path_to_root(&roots, id).into_iter().cloned().collect();
    Ok(Json(DataResponse { data: path }))
}
