//! Query parameter types for API handlers.

use serde::Deserialize;

/// `?q=` for tree search. A missing parameter behaves like a blank query.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}
