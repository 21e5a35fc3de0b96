//! SurrealStore - GraphStore Implementation for SurrealDB
//!
//! Embedded SurrealDB (RocksDB engine) backend. Nodes live in a SCHEMALESS
//! `nodes` table keyed by `node_id`; every relationship kind lives in one
//! `related` relation table whose records carry `kind` and `node_order`.
//!
//! All statements bind their values; node ids, labels, and relationship
//! kinds never appear in query text. Idempotency of the upserts is
//! check-then-create: merge by id for nodes, merge by (from, to, kind) for
//! relationships. Sibling processing is serialized upstream, so the check
//! and the create never race within one clone operation.

use crate::db::error::GraphStoreError;
use crate::db::graph_store::{ClosureEntry, EdgeDirection, EdgeExclusion, GraphStore};
use crate::models::NodeRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use surrealdb::engine::local::{Db, RocksDb};
use surrealdb::sql::{Id, Thing};
use surrealdb::Surreal;

/// Internal struct matching the `nodes` table schema
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredNode {
    node_id: String,
    label: String,
    title: Option<String>,
    created_at: String,
    #[serde(default)]
    properties: serde_json::Value,
}

impl From<StoredNode> for NodeRecord {
    fn from(stored: StoredNode) -> Self {
        NodeRecord {
            id: stored.node_id,
            label: stored.label,
            title: stored.title,
            created_at: DateTime::parse_from_rfc3339(&stored.created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            properties: stored.properties,
        }
    }
}

impl From<NodeRecord> for StoredNode {
    fn from(record: NodeRecord) -> Self {
        StoredNode {
            node_id: record.id,
            label: record.label,
            title: record.title,
            created_at: record.created_at.to_rfc3339(),
            properties: record.properties,
        }
    }
}

/// Internal struct matching one `related` edge record
#[derive(Debug, Deserialize)]
struct StoredEdge {
    #[serde(rename = "in")]
    source: Thing,
    out: Thing,
    kind: String,
    node_order: Option<f64>,
}

/// SurrealStore implements GraphStore for the embedded SurrealDB backend
pub struct SurrealStore {
    /// SurrealDB connection (embedded RocksDB)
    db: Arc<Surreal<Db>>,
}

impl SurrealStore {
    /// Open (or create) the store at `db_path` and initialize its schema.
    pub async fn new(db_path: PathBuf) -> Result<Self, GraphStoreError> {
        let db = Surreal::new::<RocksDb>(db_path).await?;

        db.use_ns("fragmentforge").use_db("graph").await?;

        let db = Arc::new(db);
        Self::initialize_schema(&db).await?;

        Ok(Self { db })
    }

    /// Create the universal nodes table and the relation table.
    async fn initialize_schema(db: &Surreal<Db>) -> Result<(), GraphStoreError> {
        db.query("DEFINE TABLE IF NOT EXISTS nodes SCHEMALESS;")
            .await?
            .check()?;

        db.query("DEFINE TABLE IF NOT EXISTS related SCHEMALESS TYPE RELATION;")
            .await?
            .check()?;

        Ok(())
    }

    /// Record id for a node: `nodes:⟨node_id⟩`.
    fn node_thing(id: &str) -> Thing {
        Thing::from(("nodes", Id::String(id.to_string())))
    }

    /// Extract the opaque node id from a record id.
    fn thing_node_id(thing: &Thing) -> Option<String> {
        match &thing.id {
            Id::String(id) => Some(id.clone()),
            _ => None,
        }
    }

    /// All nodes carrying `label`. Query helper used by operational checks
    /// and tests; not part of the clone walk itself.
    pub async fn nodes_with_label(
        &self,
        label: &str,
    ) -> Result<Vec<NodeRecord>, GraphStoreError> {
        let mut response = self
            .db
            .query("SELECT * FROM nodes WHERE label = $label;")
            .bind(("label", label.to_string()))
            .await?;

        let stored: Vec<StoredNode> = response.take(0)?;
        Ok(stored.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl GraphStore for SurrealStore {
    async fn fetch_ordered_closure(
        &self,
        node_id: &str,
        exclude: &[EdgeExclusion],
    ) -> Result<Vec<ClosureEntry>, GraphStoreError> {
        let node = Self::node_thing(node_id);

        let exclude_outgoing: Vec<String> = exclude
            .iter()
            .filter(|e| e.direction == EdgeDirection::Outgoing)
            .map(|e| e.kind.clone())
            .collect();
        let exclude_incoming: Vec<String> = exclude
            .iter()
            .filter(|e| e.direction == EdgeDirection::Incoming)
            .map(|e| e.kind.clone())
            .collect();

        let query = "
            SELECT in, out, kind, node_order FROM related
            WHERE (in = $node AND kind NOT IN $exclude_outgoing)
               OR (out = $node AND kind NOT IN $exclude_incoming)
            ORDER BY node_order ASC;
        ";

        let mut response = self
            .db
            .query(query)
            .bind(("node", node.clone()))
            .bind(("exclude_outgoing", exclude_outgoing))
            .bind(("exclude_incoming", exclude_incoming))
            .await?;

        let edges: Vec<StoredEdge> = response.take(0)?;

        let mut entries = Vec::with_capacity(edges.len());
        for edge in edges {
            let related = if edge.source == node {
                &edge.out
            } else {
                &edge.source
            };

            let Some(related_id) = Self::thing_node_id(related) else {
                return Err(GraphStoreError::query_failed(format!(
                    "edge endpoint {} has a non-string record id",
                    related
                )));
            };

            // Edges are only created between existing nodes; a miss here
            // means the graph was mutated outside this subsystem.
            let record = self
                .get_node(&related_id)
                .await?
                .ok_or_else(|| GraphStoreError::node_not_found(related_id.clone()))?;

            entries.push(ClosureEntry {
                node_id: related_id,
                label: record.label,
                title: record.title,
                relation_kind: edge.kind,
                node_order: edge.node_order,
            });
        }

        Ok(entries)
    }

    async fn get_node(&self, id: &str) -> Result<Option<NodeRecord>, GraphStoreError> {
        let mut response = self
            .db
            .query("SELECT * FROM nodes WHERE node_id = $node_id LIMIT 1;")
            .bind(("node_id", id.to_string()))
            .await?;

        let stored: Vec<StoredNode> = response.take(0)?;
        Ok(stored.into_iter().map(Into::into).next())
    }

    async fn upsert_node(
        &self,
        id: &str,
        label: &str,
        title: &str,
    ) -> Result<(), GraphStoreError> {
        // Merge by id: an existing node is matched, never rewritten
        if self.get_node(id).await?.is_some() {
            return Ok(());
        }

        let content = StoredNode::from(NodeRecord::new(id, label, title));
        self.db
            .query("CREATE type::thing($table, $id) CONTENT $content;")
            .bind(("table", "nodes"))
            .bind(("id", id.to_string()))
            .bind(("content", content))
            .await?
            .check()?;

        Ok(())
    }

    async fn upsert_relationship(
        &self,
        from_id: &str,
        to_id: &str,
        kind: &str,
        node_order: Option<f64>,
    ) -> Result<(), GraphStoreError> {
        // Both endpoints must already exist
        if self.get_node(from_id).await?.is_none() {
            return Err(GraphStoreError::dangling_reference(from_id));
        }
        if self.get_node(to_id).await?.is_none() {
            return Err(GraphStoreError::dangling_reference(to_id));
        }

        let from = Self::node_thing(from_id);
        let to = Self::node_thing(to_id);

        // Merge by (from, to, kind)
        let mut check = self
            .db
            .query(
                "SELECT VALUE id FROM related WHERE in = $from_node AND out = $to_node AND kind = $kind;",
            )
            .bind(("from_node", from.clone()))
            .bind(("to_node", to.clone()))
            .bind(("kind", kind.to_string()))
            .await?;

        let existing: Vec<Thing> = check.take(0)?;
        if !existing.is_empty() {
            return Ok(());
        }

        self.db
            .query("RELATE $from_node->related->$to_node CONTENT { kind: $kind, node_order: $node_order };")
            .bind(("from_node", from))
            .bind(("to_node", to))
            .bind(("kind", kind.to_string()))
            .bind(("node_order", node_order))
            .await?
            .check()?;

        Ok(())
    }
}
