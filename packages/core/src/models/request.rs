//! Clone Request and Reply Wire Types
//!
//! `CloneRequest` is the unit of recursive work: the root request is created
//! by an external caller, every further one by the Cloner itself while
//! walking the Blueprint. Each request is consumed by exactly one Cloner
//! invocation and has no persisted existence beyond it.

use serde::{Deserialize, Serialize};

/// One step of a clone operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneRequest {
    /// The Blueprint (or Blueprint-descendant) node to clone
    pub source_node_id: String,

    /// The already-created node the new copy must attach under
    pub parent_id: String,

    /// Title for the new node. Required for root requests (the Fragment
    /// title); for recursive requests it carries the source child's own
    /// title. Defaults to empty when absent on the wire.
    #[serde(default)]
    pub title: String,

    /// True only for the very first call of a clone operation, which
    /// creates the Fragment root and the BLUEPRINT_INSTANCE link
    pub is_root: bool,
}

impl CloneRequest {
    /// The initial request of a clone operation.
    pub fn root(
        source_node_id: impl Into<String>,
        parent_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            source_node_id: source_node_id.into(),
            parent_id: parent_id.into(),
            title: title.into(),
            is_root: true,
        }
    }

    /// A recursive request emitted while expanding a parent node.
    pub fn child(
        source_node_id: impl Into<String>,
        parent_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            source_node_id: source_node_id.into(),
            parent_id: parent_id.into(),
            title: title.into(),
            is_root: false,
        }
    }
}

/// Successful completion of one clone step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneReply {
    /// Human-readable status naming the source Blueprint
    pub status: String,

    /// Id of the node this step created
    pub new_node_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Contract test: documents the exact wire format consumed by the
    /// intake endpoint. Field names are camelCase and `title` is optional.
    #[test]
    fn clone_request_serialization_contract() {
        let request = CloneRequest::root("B1", "P", "Run1");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json.get("sourceNodeId").unwrap(), "B1");
        assert_eq!(json.get("parentId").unwrap(), "P");
        assert_eq!(json.get("title").unwrap(), "Run1");
        assert_eq!(json.get("isRoot").unwrap(), true);
        assert!(json.get("source_node_id").is_none());
    }

    #[test]
    fn clone_request_title_defaults_to_empty() {
        let parsed: CloneRequest = serde_json::from_str(
            r#"{"sourceNodeId":"B1","parentId":"P","isRoot":false}"#,
        )
        .unwrap();

        assert_eq!(parsed.title, "");
        assert!(!parsed.is_root);
    }

    #[test]
    fn clone_reply_round_trips() {
        let reply = CloneReply {
            status: "Successfully created Fragment from Blueprint B1".to_string(),
            new_node_id: "f-1".to_string(),
        };

        let json = serde_json::to_string(&reply).unwrap();
        let parsed: CloneReply = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, reply);
        assert!(json.contains("newNodeId"));
    }
}
