//! Dispatcher - inbound clone request handling
//!
//! Sits between the request bus and the cloner: validates fields, checks
//! that a root request's nodes actually exist, guards against two
//! structurally identical requests running at once, and never swallows a
//! failure. Recursive requests reference a parent their emitter just
//! created and a source taken from a closure row, so their store lookups
//! happen inside the cloner instead of being repeated here.

use crate::bus::CloneHandler;
use crate::db::GraphStore;
use crate::models::{CloneReply, CloneRequest};
use crate::services::cloner::FragmentCloner;
use crate::services::error::CloneError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, instrument, warn};

pub struct Dispatcher {
    store: Arc<dyn GraphStore>,
    cloner: Arc<FragmentCloner>,
    /// (source_node_id, parent_id) pairs currently being cloned
    in_flight: Mutex<HashSet<(String, String)>>,
}

/// Reject requests with missing identifiers before touching the store.
pub(crate) fn validate(request: &CloneRequest) -> Result<(), CloneError> {
    if request.source_node_id.trim().is_empty() {
        return Err(CloneError::invalid_request("sourceNodeId must not be empty"));
    }
    if request.parent_id.trim().is_empty() {
        return Err(CloneError::invalid_request("parentId must not be empty"));
    }
    Ok(())
}

impl Dispatcher {
    pub fn new(store: Arc<dyn GraphStore>, cloner: Arc<FragmentCloner>) -> Self {
        Self {
            store,
            cloner,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    fn in_flight(&self) -> MutexGuard<'_, HashSet<(String, String)>> {
        // A poisoned lock only means a panicking task died mid-insert; the
        // set itself is still usable.
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn ensure_exists(&self, id: &str) -> Result<(), CloneError> {
        match self.store.get_node(id).await? {
            Some(_) => Ok(()),
            None => Err(CloneError::not_found(id)),
        }
    }
}

/// Removes the in-flight marker on every exit path.
struct FlightGuard<'a> {
    dispatcher: &'a Dispatcher,
    key: (String, String),
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.dispatcher.in_flight().remove(&self.key);
    }
}

#[async_trait]
impl CloneHandler for Dispatcher {
    #[instrument(
        skip(self, request),
        fields(
            source = %request.source_node_id,
            parent = %request.parent_id,
            root = request.is_root
        )
    )]
    async fn handle(&self, request: CloneRequest) -> Result<CloneReply, CloneError> {
        validate(&request)?;

        let key = (request.source_node_id.clone(), request.parent_id.clone());
        if !self.in_flight().insert(key.clone()) {
            return Err(CloneError::invalid_request(format!(
                "clone of {} under {} is already in flight",
                request.source_node_id, request.parent_id
            )));
        }
        let _guard = FlightGuard {
            dispatcher: self,
            key,
        };

        if request.is_root {
            self.ensure_exists(&request.source_node_id).await?;
            self.ensure_exists(&request.parent_id).await?;
        }

        match self.cloner.run(&request).await {
            Ok(reply) => {
                info!(new_node = %reply.new_node_id, "clone request completed");
                Ok(reply)
            }
            Err(error) => {
                warn!(%error, depth = error.depth(), "clone request failed");
                Err(error)
            }
        }
    }
}
