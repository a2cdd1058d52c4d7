//! In-flight request tracking
//!
//! The registry owns every outstanding call, keyed by message id. An entry
//! is removed exactly once: by a correlated response, by its expiry timer,
//! or by a teardown drain. Settling an id that is no longer present is a
//! no-op, so late responses and timer/response races cannot double-settle
//! a handle.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::AbortHandle;

use dashlink_protocol::{MessageId, ResponseKind, Status};

use crate::error::ClientError;

/// Value carried by a successfully settled call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Server status from a generic RESPONSE frame (always OK on success)
    Status(Status),
    /// NUL-split field list from a hardware read
    Fields(Vec<String>),
    /// Raw text, e.g. a dashboard token
    Text(String),
    /// Inflated profile snapshot text
    Profile(String),
    /// Fire-and-forget command settled on send
    Done,
}

/// One outstanding call
pub(crate) struct PendingEntry {
    tx: oneshot::Sender<Result<Reply, ClientError>>,
    /// How the correlated response body will be decoded
    pub(crate) expects: ResponseKind,
    /// Expiry timer task, if the command awaits a response
    expiry: Option<AbortHandle>,
}

impl PendingEntry {
    /// Settle the call, cancelling any still-armed expiry.
    ///
    /// The receiver may already be gone (caller dropped its future); that
    /// is not an error.
    pub(crate) fn settle(self, result: Result<Reply, ClientError>) {
        if let Some(expiry) = self.expiry {
            expiry.abort();
        }
        let _ = self.tx.send(result);
    }
}

/// Map of in-flight requests, shared between the client façade, the
/// response dispatcher and the expiry timer tasks.
#[derive(Default)]
pub(crate) struct PendingRegistry {
    entries: Mutex<HashMap<u16, PendingEntry>>,
}

impl PendingRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert a pending call and arm its expiry timer.
    ///
    /// Fails with [`ClientError::IdInFlight`] when the id is still
    /// outstanding (only reachable after the 16-bit counter wraps).
    pub(crate) fn register(
        self: &Arc<Self>,
        id: MessageId,
        expects: ResponseKind,
        timeout: Duration,
    ) -> Result<Call, ClientError> {
        let (tx, rx) = oneshot::channel();

        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(&id.as_u16()) {
            return Err(ClientError::IdInFlight(id.as_u16()));
        }

        let registry = Arc::clone(self);
        let expiry = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            tracing::debug!(%id, "request expired without a response");
            registry.fail(id, ClientError::Timeout);
        })
        .abort_handle();

        entries.insert(
            id.as_u16(),
            PendingEntry {
                tx,
                expects,
                expiry: Some(expiry),
            },
        );

        Ok(Call { rx })
    }

    /// Settle the call for `id` successfully. No-op for unknown ids.
    pub(crate) fn complete(&self, id: MessageId, reply: Reply) {
        match self.take(id) {
            Some(entry) => entry.settle(Ok(reply)),
            None => tracing::debug!(%id, "response without a pending request discarded"),
        }
    }

    /// Settle the call for `id` with an error. No-op for unknown ids.
    pub(crate) fn fail(&self, id: MessageId, error: ClientError) {
        match self.take(id) {
            Some(entry) => entry.settle(Err(error)),
            None => tracing::debug!(%id, "failure for unknown or settled id ignored"),
        }
    }

    /// Remove the entry for `id`, cancelling its expiry immediately and
    /// leaving settlement to the caller. Used when producing the reply
    /// takes further work that must not count against the deadline.
    pub(crate) fn take(&self, id: MessageId) -> Option<PendingEntry> {
        let entry = self.entries.lock().unwrap().remove(&id.as_u16());
        if let Some(entry) = &entry {
            if let Some(expiry) = &entry.expiry {
                expiry.abort();
            }
        }
        entry
    }

    /// Fail every still-pending call; used on transport teardown.
    pub(crate) fn drain_all(&self, error: impl Fn() -> ClientError) {
        let drained: Vec<PendingEntry> = {
            let mut entries = self.entries.lock().unwrap();
            entries.drain().map(|(_, entry)| entry).collect()
        };

        if !drained.is_empty() {
            tracing::debug!(count = drained.len(), "failing outstanding requests");
        }
        for entry in drained {
            entry.settle(Err(error()));
        }
    }

    /// Number of currently outstanding requests
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

/// Handle that settles when the correlated response arrives, the expiry
/// timer fires, or the transport closes.
pub(crate) struct Call {
    rx: oneshot::Receiver<Result<Reply, ClientError>>,
}

impl Future for Call {
    type Output = Result<Reply, ClientError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            // Sender dropped without settling: the session is gone
            Poll::Ready(Err(_)) => Poll::Ready(Err(ClientError::TransportClosed)),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn registry() -> Arc<PendingRegistry> {
        Arc::new(PendingRegistry::new())
    }

    #[tokio::test]
    async fn test_complete_settles_call() {
        let registry = registry();
        let call = registry
            .register(MessageId::new(7), ResponseKind::Status, TIMEOUT)
            .unwrap();

        registry.complete(MessageId::new(7), Reply::Status(Status::Ok));

        assert_eq!(call.await.unwrap(), Reply::Status(Status::Ok));
        assert_eq!(registry.len(), 0);
    }

    #[tokio::test]
    async fn test_pending_calls_resolve_independently() {
        let registry = registry();
        let call_a = registry
            .register(MessageId::new(1), ResponseKind::Status, TIMEOUT)
            .unwrap();
        let call_b = registry
            .register(MessageId::new(2), ResponseKind::Text, TIMEOUT)
            .unwrap();

        registry.complete(MessageId::new(1), Reply::Status(Status::Ok));

        // Completing id 1 must not touch id 2
        assert_eq!(registry.len(), 1);
        assert_eq!(call_a.await.unwrap(), Reply::Status(Status::Ok));

        registry.complete(MessageId::new(2), Reply::Text("tok".to_string()));
        assert_eq!(call_b.await.unwrap(), Reply::Text("tok".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_fails_with_timeout() {
        let registry = registry();
        let call = registry
            .register(MessageId::new(3), ResponseKind::Fields, TIMEOUT)
            .unwrap();

        // Virtual time advances straight to the timer
        let result = call.await;
        assert!(matches!(result, Err(ClientError::Timeout)));
        assert_eq!(registry.len(), 0);

        // A response arriving after expiry is a silent no-op
        registry.complete(MessageId::new(3), Reply::Fields(vec![]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_cancels_expiry() {
        let registry = registry();
        let call = registry
            .register(MessageId::new(4), ResponseKind::Status, TIMEOUT)
            .unwrap();

        registry.complete(MessageId::new(4), Reply::Status(Status::Ok));
        assert_eq!(call.await.unwrap(), Reply::Status(Status::Ok));

        // Let the (aborted) timer's deadline pass; nothing must fire
        tokio::time::sleep(TIMEOUT * 2).await;
        assert_eq!(registry.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_take_cancels_expiry_but_leaves_settlement_open() {
        let registry = registry();
        let call = registry
            .register(MessageId::new(5), ResponseKind::Snapshot, TIMEOUT)
            .unwrap();

        let entry = registry.take(MessageId::new(5)).unwrap();
        assert_eq!(entry.expects, ResponseKind::Snapshot);
        assert_eq!(registry.len(), 0);

        // Deadline passes while the reply is still being produced
        tokio::time::sleep(TIMEOUT * 2).await;

        entry.settle(Ok(Reply::Profile("{}".to_string())));
        assert_eq!(call.await.unwrap(), Reply::Profile("{}".to_string()));
    }

    #[tokio::test]
    async fn test_duplicate_id_is_refused() {
        let registry = registry();
        let _call = registry
            .register(MessageId::new(6), ResponseKind::Status, TIMEOUT)
            .unwrap();

        let result = registry.register(MessageId::new(6), ResponseKind::Status, TIMEOUT);
        assert!(matches!(result, Err(ClientError::IdInFlight(6))));
    }

    #[tokio::test]
    async fn test_drain_all_fails_everything() {
        let registry = registry();
        let call_a = registry
            .register(MessageId::new(1), ResponseKind::Status, TIMEOUT)
            .unwrap();
        let call_b = registry
            .register(MessageId::new(2), ResponseKind::Text, TIMEOUT)
            .unwrap();

        registry.drain_all(|| ClientError::TransportClosed);

        assert!(matches!(call_a.await, Err(ClientError::TransportClosed)));
        assert!(matches!(call_b.await, Err(ClientError::TransportClosed)));
        assert_eq!(registry.len(), 0);
    }

    #[tokio::test]
    async fn test_dropped_sender_maps_to_transport_closed() {
        let registry = registry();
        let call = registry
            .register(MessageId::new(9), ResponseKind::Status, TIMEOUT)
            .unwrap();

        // Simulate teardown that drops entries without settling
        drop(registry.take(MessageId::new(9)).map(|entry| entry.tx));

        assert!(matches!(call.await, Err(ClientError::TransportClosed)));
    }
}
