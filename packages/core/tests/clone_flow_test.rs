//! End-to-end clone scenarios against an embedded store.
//!
//! Each test wires the real pipeline (SurrealStore, LocalBus, Dispatcher,
//! FragmentCloner) exactly as the service binary does, with a
//! deterministic id generator so creation order is observable.

use async_trait::async_trait;
use fragmentforge_core::bus::{LocalBus, RequestBus};
use fragmentforge_core::db::{
    ClosureEntry, EdgeExclusion, GraphStore, GraphStoreError, SurrealStore,
};
use fragmentforge_core::id::IdGenerator;
use fragmentforge_core::models::{label, relation, CloneRequest, NodeRecord};
use fragmentforge_core::services::{CloneError, Dispatcher, FragmentCloner};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Deterministic ids ("new-1", "new-2", ...) so tests can observe the
/// order nodes were created in.
struct SequentialIds {
    counter: AtomicUsize,
}

impl SequentialIds {
    fn new() -> Self {
        Self {
            counter: AtomicUsize::new(0),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn generate(&self) -> String {
        format!("new-{}", self.counter.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

struct Harness {
    store: Arc<SurrealStore>,
    bus: Arc<LocalBus>,
    _temp_dir: TempDir,
}

async fn harness() -> anyhow::Result<Harness> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(SurrealStore::new(temp_dir.path().join("graph.db")).await?);
    let (bus, inbox) = LocalBus::channel(16);
    let bus = Arc::new(bus);
    let cloner = Arc::new(FragmentCloner::new(
        store.clone(),
        Arc::new(SequentialIds::new()),
        bus.clone(),
    ));
    let dispatcher = Arc::new(Dispatcher::new(store.clone(), cloner));
    LocalBus::serve(inbox, dispatcher);
    Ok(Harness {
        store,
        bus,
        _temp_dir: temp_dir,
    })
}

/// The blueprint of the reference scenario: root `B1` with a Step child
/// (order 1) and a Modifier (order 2), plus an existing parent `P`.
async fn seed_reference_blueprint(store: &SurrealStore) -> Result<(), GraphStoreError> {
    store.upsert_node("P", label::FRAGMENT, "Existing parent").await?;
    store.upsert_node("B1", label::BLUEPRINT, "Pipeline").await?;
    store.upsert_node("B2", "Step", "First step").await?;
    store.upsert_node("M1", label::MODIFIER, "Speed modifier").await?;
    store
        .upsert_relationship("B2", "B1", relation::USES, Some(1.0))
        .await?;
    store
        .upsert_relationship("M1", "B1", relation::USES, Some(2.0))
        .await?;
    Ok(())
}

fn edges_of_kind<'a>(edges: &'a [ClosureEntry], kind: &str) -> Vec<&'a ClosureEntry> {
    edges.iter().filter(|e| e.relation_kind == kind).collect()
}

#[tokio::test]
async fn clone_creates_fragment_and_links_modifier_by_reference() -> anyhow::Result<()> {
    let h = harness().await?;
    seed_reference_blueprint(&h.store).await?;

    let reply = h.bus.submit(CloneRequest::root("B1", "P", "Run1")).await?;
    assert!(reply.status.contains("B1"));
    assert_eq!(reply.new_node_id, "new-1");

    let f1 = h.store.get_node("new-1").await?.expect("fragment root");
    assert_eq!(f1.label, label::FRAGMENT);
    assert_eq!(f1.title.as_deref(), Some("Run1"));

    // every edge around the fragment root, unfiltered
    let edges = h.store.fetch_ordered_closure("new-1", &[]).await?;

    let uses = edges_of_kind(&edges, relation::USES);
    assert_eq!(uses.len(), 2, "USES to parent plus USES from cloned child");
    assert!(uses.iter().any(|e| e.node_id == "P"));

    let instance = edges_of_kind(&edges, relation::BLUEPRINT_INSTANCE);
    assert_eq!(instance.len(), 1);
    assert_eq!(instance[0].node_id, "B1");

    let modifies = edges_of_kind(&edges, relation::MODIFIES);
    assert_eq!(modifies.len(), 1);
    assert_eq!(modifies[0].node_id, "M1", "modifier linked, not cloned");

    // the Step child was cloned with inherited label and title
    let f2 = h.store.get_node("new-2").await?.expect("cloned step");
    assert_eq!(f2.label, "Step");
    assert_eq!(f2.title.as_deref(), Some("First step"));

    // exactly two nodes were created in total
    assert!(h.store.get_node("new-3").await?.is_none());
    // the modifier was never duplicated
    assert_eq!(h.store.nodes_with_label(label::MODIFIER).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn siblings_are_cloned_in_ascending_node_order() -> anyhow::Result<()> {
    let h = harness().await?;
    h.store.upsert_node("P", label::FRAGMENT, "parent").await?;
    h.store.upsert_node("R", label::BLUEPRINT, "root").await?;
    for (id, title, order) in [("C3", "c3", 3.0), ("C1", "c1", 1.0), ("C2", "c2", 2.0)] {
        h.store.upsert_node(id, "Step", title).await?;
        h.store
            .upsert_relationship(id, "R", relation::USES, Some(order))
            .await?;
    }

    h.bus.submit(CloneRequest::root("R", "P", "ordered run")).await?;

    // new-1 is the fragment root; children follow in node_order, not in
    // the order the blueprint edges were written
    let created: Vec<Option<NodeRecord>> = vec![
        h.store.get_node("new-2").await?,
        h.store.get_node("new-3").await?,
        h.store.get_node("new-4").await?,
    ];
    let titles: Vec<String> = created
        .into_iter()
        .map(|n| n.expect("cloned child").title.unwrap_or_default())
        .collect();

    assert_eq!(titles, vec!["c1", "c2", "c3"]);
    Ok(())
}

#[tokio::test]
async fn clone_recurses_through_nested_children() -> anyhow::Result<()> {
    let h = harness().await?;
    h.store.upsert_node("P", label::FRAGMENT, "parent").await?;
    h.store.upsert_node("B1", label::BLUEPRINT, "chain").await?;
    h.store.upsert_node("B2", "Stage", "stage one").await?;
    h.store.upsert_node("B3", "Task", "task one").await?;
    h.store
        .upsert_relationship("B2", "B1", relation::USES, Some(1.0))
        .await?;
    h.store
        .upsert_relationship("B3", "B2", relation::USES, Some(1.0))
        .await?;

    h.bus.submit(CloneRequest::root("B1", "P", "deep run")).await?;

    let stage = h.store.get_node("new-2").await?.expect("stage clone");
    assert_eq!(stage.label, "Stage");
    let task = h.store.get_node("new-3").await?.expect("task clone");
    assert_eq!(task.label, "Task");

    // the task clone hangs under the stage clone, not under the root
    let stage_edges = h.store.fetch_ordered_closure("new-2", &[]).await?;
    assert!(stage_edges
        .iter()
        .any(|e| e.relation_kind == relation::USES && e.node_id == "new-3"));
    assert!(stage_edges
        .iter()
        .any(|e| e.relation_kind == relation::USES && e.node_id == "new-1"));
    Ok(())
}

#[tokio::test]
async fn previously_instantiated_fragments_are_not_revisited() -> anyhow::Result<()> {
    let h = harness().await?;
    seed_reference_blueprint(&h.store).await?;

    h.bus.submit(CloneRequest::root("B1", "P", "first run")).await?;
    h.bus.submit(CloneRequest::root("B1", "P", "second run")).await?;

    // each run created its fragment root plus one step clone; the first
    // run's fragment was never traversed by the second
    assert!(h.store.get_node("new-4").await?.is_some());
    assert!(h.store.get_node("new-5").await?.is_none());

    // the walk's view of B1 still contains only the blueprint children
    let exclusions = [
        EdgeExclusion::outgoing(relation::USES),
        EdgeExclusion::incoming(relation::BLUEPRINT_INSTANCE),
        EdgeExclusion::outgoing(relation::BLUEPRINT_INSTANCE),
    ];
    let closure = h.store.fetch_ordered_closure("B1", &exclusions).await?;
    let ids: Vec<&str> = closure.iter().map(|e| e.node_id.as_str()).collect();
    assert_eq!(ids, vec!["B2", "M1"]);

    // and the child's walk never climbs back to its parent
    let child_closure = h.store.fetch_ordered_closure("B2", &exclusions).await?;
    assert!(child_closure.is_empty());
    Ok(())
}

#[tokio::test]
async fn root_request_for_unknown_nodes_is_rejected() -> anyhow::Result<()> {
    let h = harness().await?;
    seed_reference_blueprint(&h.store).await?;

    let error = h
        .bus
        .submit(CloneRequest::root("nope", "P", "run"))
        .await
        .unwrap_err();
    assert!(matches!(error, CloneError::NotFound { ref id } if id == "nope"));

    let error = h
        .bus
        .submit(CloneRequest::root("B1", "gone", "run"))
        .await
        .unwrap_err();
    assert!(matches!(error, CloneError::NotFound { ref id } if id == "gone"));

    // nothing was created
    assert!(h.store.get_node("new-1").await?.is_none());
    Ok(())
}

/// Store wrapper that injects a failure on the nth node upsert.
struct FailingStore {
    inner: Arc<SurrealStore>,
    fail_on_call: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl GraphStore for FailingStore {
    async fn fetch_ordered_closure(
        &self,
        node_id: &str,
        exclude: &[EdgeExclusion],
    ) -> Result<Vec<ClosureEntry>, GraphStoreError> {
        self.inner.fetch_ordered_closure(node_id, exclude).await
    }

    async fn get_node(&self, id: &str) -> Result<Option<NodeRecord>, GraphStoreError> {
        self.inner.get_node(id).await
    }

    async fn upsert_node(
        &self,
        id: &str,
        node_label: &str,
        title: &str,
    ) -> Result<(), GraphStoreError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on_call {
            return Err(GraphStoreError::query_failed("injected store outage"));
        }
        self.inner.upsert_node(id, node_label, title).await
    }

    async fn upsert_relationship(
        &self,
        from_id: &str,
        to_id: &str,
        kind: &str,
        node_order: Option<f64>,
    ) -> Result<(), GraphStoreError> {
        self.inner
            .upsert_relationship(from_id, to_id, kind, node_order)
            .await
    }
}

#[tokio::test]
async fn failed_sub_clone_aborts_remaining_siblings_and_keeps_partial_state(
) -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let inner = Arc::new(SurrealStore::new(temp_dir.path().join("graph.db")).await?);
    seed_reference_blueprint(&inner).await?;

    // first upsert creates the fragment root; the second (the Step clone)
    // hits the injected outage
    let failing = Arc::new(FailingStore {
        inner: inner.clone(),
        fail_on_call: 2,
        calls: AtomicUsize::new(0),
    });

    let (bus, inbox) = LocalBus::channel(16);
    let bus = Arc::new(bus);
    let cloner = Arc::new(FragmentCloner::new(
        failing.clone(),
        Arc::new(SequentialIds::new()),
        bus.clone(),
    ));
    let dispatcher = Arc::new(Dispatcher::new(failing, cloner));
    LocalBus::serve(inbox, dispatcher);

    let error = bus
        .submit(CloneRequest::root("B1", "P", "doomed run"))
        .await
        .unwrap_err();

    match &error {
        CloneError::Aborted {
            source_node_id,
            cause,
        } => {
            assert_eq!(source_node_id, "B2");
            assert!(matches!(**cause, CloneError::Store(_)));
        }
        other => panic!("expected Aborted, got: {other:?}"),
    }
    assert_eq!(error.depth(), 1);

    // the fragment root and its links survive the abort
    let f1 = inner.get_node("new-1").await?.expect("fragment root kept");
    assert_eq!(f1.label, label::FRAGMENT);

    let edges = inner.fetch_ordered_closure("new-1", &[]).await?;
    assert!(edges
        .iter()
        .any(|e| e.relation_kind == relation::USES && e.node_id == "P"));
    assert!(edges
        .iter()
        .any(|e| e.relation_kind == relation::BLUEPRINT_INSTANCE && e.node_id == "B1"));

    // the failed child was never created, and the modifier sibling after
    // it was never attempted
    assert!(inner.get_node("new-2").await?.is_none());
    assert!(!edges.iter().any(|e| e.relation_kind == relation::MODIFIES));
    Ok(())
}
