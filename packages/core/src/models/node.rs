//! Node Data Structures
//!
//! A node carries exactly one `label` (its type tag) and an optional `title`.
//! Everything else lives in `properties`, which the clone algorithm never
//! touches. Ids are opaque strings, assigned once at creation and never
//! reused.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Node labels with fixed meaning to the clone algorithm.
///
/// Any other label is a Blueprint-defined domain type and is carried over
/// verbatim when the node is cloned.
pub mod label {
    /// A template node fragments are instantiated from.
    pub const BLUEPRINT: &str = "Blueprint";
    /// The root node of one clone operation's output.
    pub const FRAGMENT: &str = "Fragment";
    /// A shared leaf attached by reference, never cloned.
    pub const MODIFIER: &str = "Modifier";
}

/// Relationship kinds with fixed meaning to the clone algorithm.
pub mod relation {
    /// Child → parent containment edge. Carries `node_order` on Blueprint
    /// child edges to sequence traversal.
    pub const USES: &str = "USES";
    /// Fragment root → originating Blueprint node.
    pub const BLUEPRINT_INSTANCE: &str = "BLUEPRINT_INSTANCE";
    /// Modifier → the node it modifies.
    pub const MODIFIES: &str = "MODIFIES";
}

/// A node as stored in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    /// Unique opaque identifier, assigned once at creation
    pub id: String,

    /// Single type tag (e.g. "Blueprint", "Fragment", "Modifier", or a
    /// Blueprint-defined domain type)
    pub label: String,

    /// Optional display title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Creation timestamp, never mutated afterwards
    pub created_at: DateTime<Utc>,

    /// Arbitrary additional properties, untouched by the clone algorithm
    #[serde(default)]
    pub properties: serde_json::Value,
}

impl NodeRecord {
    /// Create a new record stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            title: Some(title.into()),
            created_at: Utc::now(),
            properties: serde_json::json!({}),
        }
    }
}
