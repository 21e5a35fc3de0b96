//! Graph Store Error Types
//!
//! Error cases for graph database operations. Higher-level clone failures
//! are handled by the service-layer error type.

use thiserror::Error;

/// Graph store operation errors
#[derive(Error, Debug)]
pub enum GraphStoreError {
    /// A node the store expected to exist could not be loaded
    #[error("Node not found: {id}")]
    NodeNotFound { id: String },

    /// Attempted to create a relationship to a node that does not exist
    #[error("Relationship endpoint does not exist: {id}")]
    DanglingReference { id: String },

    /// The database rejected or could not execute an operation
    #[error("Graph store unavailable: {0}")]
    Unavailable(#[from] surrealdb::Error),

    /// A query completed but its result could not be used
    #[error("Query failed: {context}")]
    QueryFailed { context: String },
}

impl GraphStoreError {
    /// Create a node not found error
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    /// Create a dangling reference error
    pub fn dangling_reference(id: impl Into<String>) -> Self {
        Self::DanglingReference { id: id.into() }
    }

    /// Create a query failed error with context
    pub fn query_failed(context: impl Into<String>) -> Self {
        Self::QueryFailed {
            context: context.into(),
        }
    }
}
