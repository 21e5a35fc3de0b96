//! Clone Request Bus
//!
//! The clone walk recurses by submitting further `CloneRequest`s through a
//! bus and awaiting their completion, instead of growing an in-process call
//! stack. [`RequestBus`] is the emitting side, [`CloneHandler`] the
//! receiving side.
//!
//! [`LocalBus`] is the in-process implementation: requests flow through an
//! mpsc inbox into a serve loop that spawns one tokio task per request and
//! routes the reply back over a oneshot channel. The tokio runtime is the
//! worker pool, so a recursive request can never starve waiting for a
//! bounded pool occupied by its own ancestors. Delivery here is
//! exactly-once; the trait contract only promises at-least-once, which the
//! store's idempotent upserts make safe for any conforming transport.

use crate::models::{CloneReply, CloneRequest};
use crate::services::CloneError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Receiving side of the bus: handles one clone request to completion.
#[async_trait]
pub trait CloneHandler: Send + Sync {
    async fn handle(&self, request: CloneRequest) -> Result<CloneReply, CloneError>;
}

/// Emitting side of the bus: delivers a clone request and waits for its
/// completion result.
#[async_trait]
pub trait RequestBus: Send + Sync {
    async fn submit(&self, request: CloneRequest) -> Result<CloneReply, CloneError>;
}

/// A request queued on the local bus.
struct BusItem {
    request: CloneRequest,
    respond: oneshot::Sender<Result<CloneReply, CloneError>>,
}

/// In-process request/response bus.
pub struct LocalBus {
    tx: mpsc::Sender<BusItem>,
}

/// Receiver half of a [`LocalBus`], consumed by [`LocalBus::serve`].
pub struct LocalBusInbox {
    rx: mpsc::Receiver<BusItem>,
}

impl LocalBus {
    /// Create a bus and its inbox. The inbox must be passed to
    /// [`LocalBus::serve`] once a handler exists; until then submissions
    /// queue up to `buffer` deep.
    pub fn channel(buffer: usize) -> (Self, LocalBusInbox) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, LocalBusInbox { rx })
    }

    /// Drain the inbox, handing each request to `handler` on its own task.
    ///
    /// The loop itself never awaits a handler, so requests submitted
    /// recursively from inside a running handler are always picked up.
    pub fn serve(inbox: LocalBusInbox, handler: Arc<dyn CloneHandler>) {
        let mut rx = inbox.rx;
        tokio::spawn(async move {
            while let Some(item) = rx.recv().await {
                let handler = handler.clone();
                tokio::spawn(async move {
                    let result = handler.handle(item.request).await;
                    if item.respond.send(result).is_err() {
                        warn!("clone requester went away before the reply was ready");
                    }
                });
            }
            debug!("local bus inbox closed, serve loop ending");
        });
    }
}

#[async_trait]
impl RequestBus for LocalBus {
    async fn submit(&self, request: CloneRequest) -> Result<CloneReply, CloneError> {
        let (respond, reply) = oneshot::channel();
        self.tx
            .send(BusItem { request, respond })
            .await
            .map_err(|_| CloneError::transport("request bus is not accepting requests"))?;

        reply
            .await
            .map_err(|_| CloneError::transport("clone handler dropped the reply channel"))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoHandler;

    #[async_trait]
    impl CloneHandler for EchoHandler {
        async fn handle(&self, request: CloneRequest) -> Result<CloneReply, CloneError> {
            Ok(CloneReply {
                status: format!("echo {}", request.source_node_id),
                new_node_id: "echo-1".to_string(),
            })
        }
    }

    struct RejectingHandler;

    #[async_trait]
    impl CloneHandler for RejectingHandler {
        async fn handle(&self, _request: CloneRequest) -> Result<CloneReply, CloneError> {
            Err(CloneError::invalid_request("rejected"))
        }
    }

    #[tokio::test]
    async fn submit_round_trips_through_handler() {
        let (bus, inbox) = LocalBus::channel(4);
        LocalBus::serve(inbox, Arc::new(EchoHandler));

        let reply = bus
            .submit(CloneRequest::root("B1", "P", "Run1"))
            .await
            .expect("echo handler always succeeds");

        assert_eq!(reply.status, "echo B1");
        assert_eq!(reply.new_node_id, "echo-1");
    }

    #[tokio::test]
    async fn handler_error_reaches_the_submitter() {
        let (bus, inbox) = LocalBus::channel(4);
        LocalBus::serve(inbox, Arc::new(RejectingHandler));

        let error = bus
            .submit(CloneRequest::root("B1", "P", "Run1"))
            .await
            .unwrap_err();

        assert!(matches!(error, CloneError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn submit_fails_when_inbox_is_gone() {
        let (bus, inbox) = LocalBus::channel(4);
        drop(inbox);

        let error = bus
            .submit(CloneRequest::root("B1", "P", "Run1"))
            .await
            .unwrap_err();

        assert!(matches!(error, CloneError::Transport { .. }));
    }
}
