//! FragmentCloner - the recursive clone algorithm
//!
//! One invocation clones exactly one Blueprint node: it creates the copy,
//! attaches it under its parent, links Modifiers by reference, and submits
//! a further `CloneRequest` per non-Modifier related node, awaiting each
//! before moving to the next sibling, in ascending `node_order`.
//!
//! The closure is fetched once, before any write; the writes of this
//! invocation must not influence what it traverses. Loop prevention is
//! entirely in the closure exclusions: the expanded node's own parent edge
//! and `BLUEPRINT_INSTANCE` edges are never part of the walk.
//!
//! Failure semantics: a failed sub-clone aborts the remaining siblings and
//! propagates as `Aborted`; siblings that already completed stay in place.
//! Retried steps are safe because every write is an idempotent upsert.

use crate::bus::RequestBus;
use crate::db::{EdgeExclusion, GraphStore};
use crate::id::IdGenerator;
use crate::models::{label, relation, CloneReply, CloneRequest};
use crate::services::error::CloneError;
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct FragmentCloner {
    store: Arc<dyn GraphStore>,
    ids: Arc<dyn IdGenerator>,
    bus: Arc<dyn RequestBus>,
}

impl FragmentCloner {
    pub fn new(
        store: Arc<dyn GraphStore>,
        ids: Arc<dyn IdGenerator>,
        bus: Arc<dyn RequestBus>,
    ) -> Self {
        Self { store, ids, bus }
    }

    /// Directed edge kinds the walk never follows: the edge toward the
    /// expanded node's own parent, and instance links of already-created
    /// Fragments.
    fn closure_exclusions() -> [EdgeExclusion; 3] {
        [
            EdgeExclusion::outgoing(relation::USES),
            EdgeExclusion::incoming(relation::BLUEPRINT_INSTANCE),
            EdgeExclusion::outgoing(relation::BLUEPRINT_INSTANCE),
        ]
    }

    /// Clone the node named by `request` under `request.parent_id`, then
    /// its descendants. Returns the id of the node this step created.
    #[instrument(skip(self, request), fields(source = %request.source_node_id, root = request.is_root))]
    pub async fn run(&self, request: &CloneRequest) -> Result<CloneReply, CloneError> {
        let closure = self
            .store
            .fetch_ordered_closure(&request.source_node_id, &Self::closure_exclusions())
            .await?;

        // A root call creates the Fragment itself; a recursive call adopts
        // the label of whatever it is cloning.
        let new_label = if request.is_root {
            label::FRAGMENT.to_string()
        } else {
            self.store
                .get_node(&request.source_node_id)
                .await?
                .ok_or_else(|| CloneError::not_found(request.source_node_id.clone()))?
                .label
        };

        let new_id = self.ids.generate();
        self.store
            .upsert_node(&new_id, &new_label, &request.title)
            .await?;
        self.store
            .upsert_relationship(&new_id, &request.parent_id, relation::USES, None)
            .await?;
        if request.is_root {
            self.store
                .upsert_relationship(
                    &new_id,
                    &request.source_node_id,
                    relation::BLUEPRINT_INSTANCE,
                    None,
                )
                .await?;
        }

        for entry in &closure {
            if entry.is_modifier() {
                debug!(modifier = %entry.node_id, "attaching modifier by reference");
                self.store
                    .upsert_relationship(&entry.node_id, &new_id, relation::MODIFIES, None)
                    .await?;
            } else {
                debug!(child = %entry.node_id, order = ?entry.node_order, "descending into child");
                let child = CloneRequest::child(
                    entry.node_id.clone(),
                    new_id.clone(),
                    entry.title_or_empty(),
                );
                self.bus
                    .submit(child)
                    .await
                    .map_err(|cause| CloneError::aborted(entry.node_id.clone(), cause))?;
            }
        }

        Ok(CloneReply {
            status: format!(
                "Successfully created Fragment from Blueprint {}",
                request.source_node_id
            ),
            new_node_id: new_id,
        })
    }
}
