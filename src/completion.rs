//! One-shot completion channel shared across an invocation.
//!
//! Exactly one of resolve/reject fires per invocation; later attempts are
//! silent no-ops because defensive double-finalize is common in middleware
//! chains. The slot also holds a clone of the output-stream sender so a
//! request-body fault that arrives after resolution can surface as an
//! error item on the response body instead of silently truncating it.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::error::{BridgeError, StreamError};
use crate::invocation::ResolvedResponse;

pub(crate) type ReplyReceiver = oneshot::Receiver<Result<ResolvedResponse, BridgeError>>;

#[derive(Clone)]
pub(crate) struct Completion {
    slot: Arc<Mutex<Slot>>,
}

struct Slot {
    reply: Option<oneshot::Sender<Result<ResolvedResponse, BridgeError>>>,
    body: Option<mpsc::UnboundedSender<Result<Bytes, StreamError>>>,
}

impl Completion {
    pub(crate) fn new() -> (Self, ReplyReceiver) {
        let (tx, rx) = oneshot::channel();
        let completion = Self {
            slot: Arc::new(Mutex::new(Slot {
                reply: Some(tx),
                body: None,
            })),
        };
        (completion, rx)
    }

    /// Resolve the invocation with a response value. No-op if already settled.
    pub(crate) fn resolve(&self, response: ResolvedResponse) {
        let mut slot = self.slot.lock().expect("completion lock poisoned");
        match slot.reply.take() {
            // The receiver side may already be gone (host cancelled); that
            // is not this layer's problem.
            Some(tx) => {
                let _ = tx.send(Ok(response));
            }
            None => debug!("ignoring duplicate resolution attempt"),
        }
    }

    /// Fail the invocation. No-op if already settled.
    pub(crate) fn reject(&self, err: BridgeError) {
        let mut slot = self.slot.lock().expect("completion lock poisoned");
        match slot.reply.take() {
            Some(tx) => {
                let _ = tx.send(Err(err));
            }
            None => debug!(error = %err, "rejection after settlement, dropping"),
        }
    }

    /// Record the producer half of the output stream once it exists.
    pub(crate) fn set_body_sender(&self, tx: mpsc::UnboundedSender<Result<Bytes, StreamError>>) {
        self.slot.lock().expect("completion lock poisoned").body = Some(tx);
    }

    /// Drop the recorded body sender so the output stream can close.
    pub(crate) fn close_body(&self) {
        self.slot.lock().expect("completion lock poisoned").body = None;
    }

    /// Route a body-stream fault to whichever channel is still open:
    /// the pending reply if unresolved, else the output stream.
    pub(crate) fn fail(&self, err: StreamError) {
        let mut slot = self.slot.lock().expect("completion lock poisoned");
        if let Some(tx) = slot.reply.take() {
            let _ = tx.send(Err(err.into()));
        } else if let Some(body) = slot.body.take() {
            let _ = body.send(Err(err));
        } else {
            debug!(error = %err, "body fault after stream close, dropping");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HeaderMap;

    fn response() -> ResolvedResponse {
        ResolvedResponse {
            status: 200,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    #[test]
    fn first_resolution_wins() {
        let (completion, mut rx) = Completion::new();
        completion.resolve(response());
        completion.reject(BridgeError::Abandoned);

        let outcome = rx.try_recv().unwrap();
        assert!(outcome.is_ok());
    }

    #[test]
    fn reject_then_resolve_is_a_noop() {
        let (completion, mut rx) = Completion::new();
        completion.reject(BridgeError::Abandoned);
        completion.resolve(response());

        let outcome = rx.try_recv().unwrap();
        assert!(matches!(outcome, Err(BridgeError::Abandoned)));
    }

    #[test]
    fn fail_rejects_while_pending() {
        let (completion, mut rx) = Completion::new();
        completion.fail(StreamError::new("boom"));

        match rx.try_recv().unwrap() {
            Err(BridgeError::BodyStream(e)) => assert_eq!(e.message(), "boom"),
            other => panic!("expected body stream rejection, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn fail_after_resolution_errors_the_body_stream() {
        let (completion, mut rx) = Completion::new();
        completion.resolve(response());

        let (tx, mut body_rx) = mpsc::unbounded_channel();
        completion.set_body_sender(tx);
        completion.fail(StreamError::new("aborted"));

        assert!(rx.try_recv().unwrap().is_ok());
        let item = body_rx.try_recv().unwrap();
        assert_eq!(item.unwrap_err().message(), "aborted");
        // The sender was dropped by fail(); the stream is now closed.
        assert!(body_rx.try_recv().is_err());
    }

    #[test]
    fn fail_after_close_is_a_noop() {
        let (completion, _rx) = Completion::new();
        completion.resolve(response());
        completion.close_body();
        completion.fail(StreamError::new("late"));
    }
}
