//! Byte stream primitives shared by both sides of the bridge.
//!
//! Inbound request bodies and the outbound response body are both
//! pull-based `futures_core::Stream`s of `Bytes` chunks. The response side
//! is push-fed by the interceptor through an unbounded channel; the
//! consumer drains it at its own pace after the response value resolves.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_core::Stream;
use tokio::sync::mpsc;

use crate::error::StreamError;

/// A type-erased, fallible async stream of byte chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StreamError>> + Send>>;

/// An already-ended stream: signals end-of-input on the first poll.
pub(crate) struct EndedStream;

impl Stream for EndedStream {
    type Item = Result<Bytes, StreamError>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Poll::Ready(None)
    }
}

/// A stream that yields one buffer then ends.
pub(crate) struct OnceStream(pub(crate) Option<Bytes>);

impl Stream for OnceStream {
    type Item = Result<Bytes, StreamError>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Poll::Ready(self.get_mut().0.take().map(Ok))
    }
}

/// An already-ended [`ByteStream`].
pub fn empty() -> ByteStream {
    Box::pin(EndedStream)
}

/// A [`ByteStream`] over a single pre-buffered payload.
///
/// Hosts that receive request bodies fully buffered use this to feed the
/// bridge; an empty buffer behaves like [`empty()`].
pub fn buffered(buf: impl Into<Bytes>) -> ByteStream {
    let buf = buf.into();
    if buf.is_empty() {
        empty()
    } else {
        Box::pin(OnceStream(Some(buf)))
    }
}

/// The lazily-produced response body.
///
/// Created by the interceptor at the header-sent transition when the first
/// write carries data. The producer side lives inside the response writer;
/// this is the consumer half handed to the invocation host inside the
/// resolved response value. The channel is unbounded — pacing the drain is
/// the host's concern, the bridge only enqueues and closes.
#[derive(Debug)]
pub struct OutputStream {
    rx: mpsc::UnboundedReceiver<Result<Bytes, StreamError>>,
}

impl OutputStream {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Result<Bytes, StreamError>>) -> Self {
        Self { rx }
    }

    /// Drain the stream and concatenate every chunk.
    ///
    /// Stops at the first error item, which is how a request-body fault
    /// after resolution surfaces to the consumer.
    pub async fn into_bytes(mut self) -> Result<Bytes, StreamError> {
        let mut collected = Vec::new();
        while let Some(item) = std::future::poll_fn(|cx| self.rx.poll_recv(cx)).await {
            collected.extend_from_slice(&item?);
        }
        Ok(Bytes::from(collected))
    }
}

impl Stream for OutputStream {
    type Item = Result<Bytes, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll_all(mut stream: ByteStream) -> Vec<Bytes> {
        let mut chunks = Vec::new();
        let waker = std::task::Waker::noop();
        let mut cx = Context::from_waker(waker);
        loop {
            match stream.as_mut().poll_next(&mut cx) {
                Poll::Ready(Some(Ok(chunk))) => chunks.push(chunk),
                Poll::Ready(Some(Err(e))) => panic!("unexpected error: {e}"),
                Poll::Ready(None) => break,
                Poll::Pending => panic!("buffered streams should never pend"),
            }
        }
        chunks
    }

    #[test]
    fn empty_stream_ends_immediately() {
        assert!(poll_all(empty()).is_empty());
    }

    #[test]
    fn buffered_stream_yields_once() {
        let chunks = poll_all(buffered("hello"));
        assert_eq!(chunks, vec![Bytes::from("hello")]);
    }

    #[test]
    fn buffered_empty_payload_ends_immediately() {
        assert!(poll_all(buffered(Bytes::new())).is_empty());
    }

    #[tokio::test]
    async fn output_stream_yields_pushed_chunks_then_closes() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Ok(Bytes::from("a"))).unwrap();
        tx.send(Ok(Bytes::from("b"))).unwrap();
        drop(tx);

        let body = OutputStream::new(rx).into_bytes().await.unwrap();
        assert_eq!(body.as_ref(), b"ab");
    }

    #[tokio::test]
    async fn output_stream_surfaces_error_items() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Ok(Bytes::from("partial"))).unwrap();
        tx.send(Err(StreamError::new("body aborted"))).unwrap();
        drop(tx);

        let err = OutputStream::new(rx).into_bytes().await.unwrap_err();
        assert_eq!(err.message(), "body aborted");
    }
}
