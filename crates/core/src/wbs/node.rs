//! WBS node record, node types, and input DTOs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum allowed length for a node name.
pub const MAX_NODE_NAME_LENGTH: u64 = 200;

/// Maximum allowed length for a node description.
pub const MAX_NODE_DESCRIPTION_LENGTH: u64 = 4000;

/// Entity label used in not-found errors.
pub const NODE_ENTITY: &str = "WbsNode";

// ---------------------------------------------------------------------------
// Node type
// ---------------------------------------------------------------------------

/// Closed set of node kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    #[default]
    Task,
    Milestone,
    Deliverable,
    Phase,
}

impl NodeType {
    pub const ALL: [NodeType; 4] = [
        NodeType::Task,
        NodeType::Milestone,
        NodeType::Deliverable,
        NodeType::Phase,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Task => "task",
            NodeType::Milestone => "milestone",
            NodeType::Deliverable => "deliverable",
            NodeType::Phase => "phase",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid node type '{s}'. Must be one of: task, milestone, deliverable, phase"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Move relation
// ---------------------------------------------------------------------------

/// Where a moved node lands relative to the drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveRelation {
    /// Same parent as the target, immediately before it.
    Above,
    /// Same parent as the target, immediately after it.
    Below,
    /// Last child of the target.
    Inside,
}

impl MoveRelation {
    pub fn as_str(self) -> &'static str {
        match self {
            MoveRelation::Above => "above",
            MoveRelation::Below => "below",
            MoveRelation::Inside => "inside",
        }
    }
}

impl fmt::Display for MoveRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Node record
// ---------------------------------------------------------------------------

/// One row of a project's WBS.
///
/// `parent_id = None` means root level within the project. `wbs_code` is a
/// derived cache of the node's position and is regenerated, never patched,
/// whenever ancestry or sibling order changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WbsNode {
    pub id: DbId,
    pub project_id: DbId,
    pub parent_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub order_idx: i32,
    pub level: i32,
    pub wbs_code: Option<String>,
    pub node_type: NodeType,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WbsNode {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

// ---------------------------------------------------------------------------
// Input DTOs
// ---------------------------------------------------------------------------

/// Input for inserting a node. Position fields are assigned by the engine.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewNode {
    pub parent_id: Option<DbId>,
    #[validate(length(min = 1, max = MAX_NODE_NAME_LENGTH), custom(function = "not_blank"))]
    pub name: String,
    #[validate(length(max = MAX_NODE_DESCRIPTION_LENGTH))]
    pub description: Option<String>,
    #[serde(default)]
    pub node_type: NodeType,
}

/// Partial field update. Structure (`parent_id`, `order_idx`) only changes
/// through a move, so it is deliberately absent here.
///
/// `description` uses `Option<Option<String>>`: an absent field keeps the
/// stored value, an explicit `null` clears it.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NodeUpdate {
    #[validate(length(min = 1, max = MAX_NODE_NAME_LENGTH), custom(function = "not_blank"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub node_type: Option<NodeType>,
}

impl NewNode {
    /// Validate field constraints, mapping failures to [`CoreError::Validation`].
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate().map_err(validation_error)
    }
}

impl NodeUpdate {
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate().map_err(validation_error)?;
        if let Some(Some(description)) = &self.description {
            if description.chars().count() as u64 > MAX_NODE_DESCRIPTION_LENGTH {
                return Err(CoreError::Validation(format!(
                    "description: must be at most {MAX_NODE_DESCRIPTION_LENGTH} characters"
                )));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.node_type.is_none()
    }
}

/// Map a present field, `null` included, to `Some`. Paired with
/// `#[serde(default)]` so an absent field stays `None`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

fn validation_error(errors: validator::ValidationErrors) -> CoreError {
    CoreError::Validation(errors.to_string())
}

/// Reject non-positive identifiers before they reach the store.
pub fn validate_id(field: &str, id: DbId) -> Result<(), CoreError> {
    if id <= 0 {
        return Err(CoreError::Validation(format!(
            "{field} must be a positive integer, got {id}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn new_node(name: &str) -> NewNode {
        NewNode {
            parent_id: None,
            name: name.to_string(),
            description: None,
            node_type: NodeType::Task,
        }
    }

    // -- NodeType ------------------------------------------------------------

    #[test]
    fn node_type_round_trips_through_str() {
        for t in NodeType::ALL {
            assert_eq!(t.as_str().parse::<NodeType>().unwrap(), t);
        }
    }

    #[test]
    fn node_type_rejects_unknown() {
        assert_matches!("epic".parse::<NodeType>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn node_type_serializes_lowercase() {
        let json = serde_json::to_string(&NodeType::Deliverable).unwrap();
        assert_eq!(json, "\"deliverable\"");
    }

    #[test]
    fn move_relation_deserializes_lowercase() {
        let rel: MoveRelation = serde_json::from_str("\"inside\"").unwrap();
        assert_eq!(rel, MoveRelation::Inside);
    }

    // -- NewNode::check ------------------------------------------------------

    #[test]
    fn accepts_plain_name() {
        assert!(new_node("Design").check().is_ok());
    }

    #[test]
    fn rejects_empty_name() {
        assert_matches!(new_node("").check(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_whitespace_only_name() {
        assert_matches!(new_node("   ").check(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_name_exceeding_max() {
        let name = "a".repeat(MAX_NODE_NAME_LENGTH as usize + 1);
        assert!(new_node(&name).check().is_err());
    }

    #[test]
    fn accepts_name_at_max() {
        let name = "a".repeat(MAX_NODE_NAME_LENGTH as usize);
        assert!(new_node(&name).check().is_ok());
    }

    #[test]
    fn description_limit_follows_constant() {
        let mut input = new_node("Design");
        input.description = Some("d".repeat(MAX_NODE_DESCRIPTION_LENGTH as usize));
        assert!(input.check().is_ok());
        input.description = Some("d".repeat(MAX_NODE_DESCRIPTION_LENGTH as usize + 1));
        assert_matches!(input.check(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn node_type_defaults_to_task_when_omitted() {
        let input: NewNode = serde_json::from_str(r#"{"parent_id": null, "name": "X"}"#).unwrap();
        assert_eq!(input.node_type, NodeType::Task);
    }

    // -- NodeUpdate ----------------------------------------------------------

    #[test]
    fn empty_update_is_valid_and_empty() {
        let update = NodeUpdate::default();
        assert!(update.check().is_ok());
        assert!(update.is_empty());
    }

    #[test]
    fn update_rejects_blank_rename() {
        let update = NodeUpdate {
            name: Some("  ".into()),
            ..Default::default()
        };
        assert!(update.check().is_err());
    }

    #[test]
    fn update_distinguishes_null_from_absent_description() {
        let absent: NodeUpdate = serde_json::from_str(r#"{"name": "X"}"#).unwrap();
        assert_eq!(absent.description, None);

        let cleared: NodeUpdate = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));
        assert!(!cleared.is_empty());

        let set: NodeUpdate = serde_json::from_str(r#"{"description": "Scope"}"#).unwrap();
        assert_eq!(set.description, Some(Some("Scope".to_string())));
    }

    #[test]
    fn update_rejects_overlong_description() {
        let update = NodeUpdate {
            description: Some(Some("d".repeat(MAX_NODE_DESCRIPTION_LENGTH as usize + 1))),
            ..Default::default()
        };
        assert_matches!(update.check(), Err(CoreError::Validation(_)));
    }

    // -- validate_id ---------------------------------------------------------

    #[test]
    fn rejects_non_positive_ids() {
        assert!(validate_id("node_id", 0).is_err());
        assert!(validate_id("node_id", -3).is_err());
        assert!(validate_id("node_id", 1).is_ok());
    }
}
