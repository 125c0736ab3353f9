//! Route definitions for the `/projects` resource, including the
//! project-scoped node and tree routes.

use axum::routing::get;
use axum::Router;

use crate::handlers::{project, tree, wbs_node};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                          -> list
/// POST   /                          -> create
/// GET    /{id}                      -> get_by_id
/// DELETE /{id}                      -> delete
///
/// GET    /{id}/nodes                -> wbs_node::list_by_project
/// POST   /{id}/nodes                -> wbs_node::create
///
/// GET    /{id}/tree                 -> tree::get_tree
/// GET    /{id}/tree/search          -> tree::search_tree
/// GET    /{id}/tree/export          -> tree::export
/// GET    /{id}/tree/verify          -> tree::verify
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list).post(project::create))
        .route("/{id}", get(project::get_by_id).delete(project::delete))
        .route(
            "/{id}/nodes",
            get(wbs_node::list_by_project).post(wbs_node::create),
        )
        .route("/{id}/tree", get(tree::get_tree))
        .route("/{id}/tree/search", get(tree::search_tree))
        .route("/{id}/tree/export", get(tree::export))
        .route("/{id}/tree/verify", get(tree::verify))
}
