//! Graph Store Layer
//!
//! This module handles all graph database interactions using SurrealDB:
//!
//! - `GraphStore` - the three-operation contract the clone algorithm needs
//!   (ordered closure fetch, idempotent node/relationship upserts) plus a
//!   point lookup
//! - `SurrealStore` - embedded SurrealDB (RocksDB engine) implementation
//!
//! Nodes live in a SCHEMALESS `nodes` table; relationships of every kind
//! live in a single `related` relation table carrying `kind` and
//! `node_order`. All queries bind parameters; identifiers are never
//! interpolated into query text.

mod error;
mod graph_store;
mod surreal_store;

pub use error::GraphStoreError;
pub use graph_store::{ClosureEntry, EdgeDirection, EdgeExclusion, GraphStore};
pub use surreal_store::SurrealStore;
