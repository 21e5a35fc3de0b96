//! GraphStore Trait - Graph Database Abstraction
//!
//! The contract between the clone algorithm and the database. The clone
//! walk needs exactly four primitives: fetch the ordered relationship
//! closure around a node, look a node up by id, upsert a node, and upsert
//! a relationship between two existing nodes.
//!
//! Implementations must be `Send + Sync`; all methods are async so both
//! embedded and network backends fit behind the same trait.

use crate::db::error::GraphStoreError;
use crate::models::NodeRecord;
use async_trait::async_trait;

/// Which side of an edge touches the node whose closure is being fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    /// The edge starts at the node (node → other)
    Outgoing,
    /// The edge ends at the node (other → node)
    Incoming,
}

/// One directed edge kind to leave out of a closure fetch.
///
/// The clone walk excludes the expanded node's own parent edge and
/// `BLUEPRINT_INSTANCE` edges; this is the sole mechanism preventing
/// re-traversal of ancestry and of previously-instantiated Fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeExclusion {
    pub kind: String,
    pub direction: EdgeDirection,
}

impl EdgeExclusion {
    /// Exclude edges of `kind` leaving the node.
    pub fn outgoing(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            direction: EdgeDirection::Outgoing,
        }
    }

    /// Exclude edges of `kind` arriving at the node.
    pub fn incoming(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            direction: EdgeDirection::Incoming,
        }
    }
}

/// One row of a node's relationship closure: the related node plus the
/// edge that connects it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosureEntry {
    /// Id of the node on the other end of the edge
    pub node_id: String,

    /// Label of the related node
    pub label: String,

    /// Title of the related node, if it has one
    pub title: Option<String>,

    /// Relationship kind of the connecting edge
    pub relation_kind: String,

    /// Sequencing attribute of the connecting edge, if set
    pub node_order: Option<f64>,
}

impl ClosureEntry {
    /// Whether the related node is a shared Modifier leaf.
    pub fn is_modifier(&self) -> bool {
        self.label == crate::models::label::MODIFIER
    }

    /// The related node's title, or the empty string when it has none.
    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }
}

/// Abstraction layer for graph persistence operations
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Fetch every relationship incident to `node_id` (either direction)
    /// except the excluded directed kinds, ascending by `node_order`.
    ///
    /// A node with no matching edges, including a node that does not
    /// exist, yields an empty closure. The closure is a snapshot: writes
    /// performed after the fetch do not change what the caller iterates.
    async fn fetch_ordered_closure(
        &self,
        node_id: &str,
        exclude: &[EdgeExclusion],
    ) -> Result<Vec<ClosureEntry>, GraphStoreError>;

    /// Look up a node by id.
    ///
    /// Returns `Ok(None)` when the node does not exist; that is not an
    /// error.
    async fn get_node(&self, id: &str) -> Result<Option<NodeRecord>, GraphStoreError>;

    /// Create the node if absent, otherwise match it by id.
    ///
    /// Idempotent: repeating the call with the same id is a no-op, so a
    /// retried step after a transient failure never duplicates a node.
    async fn upsert_node(
        &self,
        id: &str,
        label: &str,
        title: &str,
    ) -> Result<(), GraphStoreError>;

    /// Create a directed relationship between two **existing** nodes if an
    /// identical one is not already present.
    ///
    /// Fails with [`GraphStoreError::DanglingReference`] when either
    /// endpoint does not exist. Idempotent on (from, to, kind).
    async fn upsert_relationship(
        &self,
        from_id: &str,
        to_id: &str,
        kind: &str,
        node_order: Option<f64>,
    ) -> Result<(), GraphStoreError>;
}
