//! WBS node row mapping.

use sqlx::FromRow;
use wbs_core::types::{DbId, Timestamp};
use wbs_core::wbs::node::{NodeType, WbsNode};

pub use wbs_core::wbs::node::{NewNode, NodeUpdate};

/// Column list shared across queries.
pub const COLUMNS: &str = "id, project_id, parent_id, name, description, order_idx, level, \
                           wbs_code, node_type, created_at, updated_at";

/// A raw row from `wbs_nodes`. `node_type` is stored as text and checked
/// by a constraint, so it is parsed on the way out.
#[derive(Debug, Clone, FromRow)]
pub struct WbsNodeRow {
    pub id: DbId,
    pub project_id: DbId,
    pub parent_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub order_idx: i32,
    pub level: i32,
    pub wbs_code: Option<String>,
    pub node_type: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<WbsNodeRow> for WbsNode {
    type Error = sqlx::Error;

    fn try_from(row: WbsNodeRow) -> Result<Self, Self::Error> {
        let node_type: NodeType = row
            .node_type
            .parse()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(WbsNode {
            id: row.id,
            project_id: row.project_id,
            parent_id: row.parent_id,
            name: row.name,
            description: row.description,
            order_idx: row.order_idx,
            level: row.level,
            wbs_code: row.wbs_code,
            node_type,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Convert a batch of rows, failing on the first undecodable one.
pub fn into_nodes(rows: Vec<WbsNodeRow>) -> Result<Vec<WbsNode>, sqlx::Error> {
    rows.into_iter().map(WbsNode::try_from).collect()
}
