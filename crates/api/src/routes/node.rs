//! Route definitions for the `/nodes` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::wbs_node;
use crate::state::AppState;

/// Routes mounted at `/nodes`.
///
/// ```text
/// GET    /{id}            -> get_by_id
/// PUT    /{id}            -> update
/// DELETE /{id}            -> delete
/// POST   /{id}/move       -> move_node
/// GET    /{id}/path       -> path
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(wbs_node::get_by_id)
                .put(wbs_node::update)
                .delete(wbs_node::delete),
        )
        .route("/{id}/move", post(wbs_node::move_node))
        .route("/{id}/path", get(wbs_node::path))
}
