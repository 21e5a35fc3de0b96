//! Clone Error Types
//!
//! Failure taxonomy of a clone operation. Store-level failures
//! ([`GraphStoreError`], including dangling references and outages) are
//! wrapped rather than flattened, so the requester can still see which
//! operation failed. A descendant's failure is wrapped in `Aborted` once
//! per level, which is what [`CloneError::depth`] counts.

use crate::db::GraphStoreError;
use thiserror::Error;

/// Clone operation errors
#[derive(Error, Debug)]
pub enum CloneError {
    /// Malformed or missing request fields
    #[error("Invalid clone request: {reason}")]
    InvalidRequest { reason: String },

    /// A referenced node is absent from the store
    #[error("Node not found: {id}")]
    NotFound { id: String },

    /// A graph store operation failed
    #[error("Graph store operation failed: {0}")]
    Store(#[from] GraphStoreError),

    /// The request bus could not deliver a request or return its reply
    #[error("Request transport failed: {reason}")]
    Transport { reason: String },

    /// A descendant sub-clone failed; remaining siblings were skipped
    #[error("Sub-clone of {source_node_id} failed")]
    Aborted {
        source_node_id: String,
        #[source]
        cause: Box<CloneError>,
    },
}

impl CloneError {
    /// Create an invalid request error
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a transport error
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Wrap a failed sub-clone of `source_node_id`
    pub fn aborted(source_node_id: impl Into<String>, cause: CloneError) -> Self {
        Self::Aborted {
            source_node_id: source_node_id.into(),
            cause: Box::new(cause),
        }
    }

    /// How many traversal levels below the requester the failure occurred.
    /// Zero for a failure in the invocation itself.
    pub fn depth(&self) -> usize {
        match self {
            Self::Aborted { cause, .. } => 1 + cause.depth(),
            _ => 0,
        }
    }

    /// The innermost failure underneath any `Aborted` wrapping.
    pub fn root_cause(&self) -> &CloneError {
        match self {
            Self::Aborted { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}
