pub mod health;
pub mod node;
pub mod project;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /projects                                  list, create
/// /projects/{id}                             get, delete
/// /projects/{id}/nodes                       flat list, insert
/// /projects/{id}/tree                        nested projection
/// /projects/{id}/tree/search?q=              search (GET)
/// /projects/{id}/tree/export                 export snapshot (GET)
/// /projects/{id}/tree/verify                 invariant report (GET)
///
/// /nodes/{id}                                get, update, delete
/// /nodes/{id}/move                           move (POST)
/// /nodes/{id}/path                           path to root (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/projects", project::router())
        .nest("/nodes", node::router())
}
