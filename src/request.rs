//! Request synthesis — the middleware-facing view of an invocation.
//!
//! Middleware chains expect a mutable, stream-shaped request: direct field
//! access for method/url/headers and readable-stream semantics for the
//! body. [`SynthesizedRequest`] provides exactly that shape, built once
//! per invocation from the host's immutable [`InvocationRequest`].

use std::collections::HashMap;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_core::Stream;

use crate::body::{self, ByteStream};
use crate::completion::Completion;
use crate::error::StreamError;
use crate::invocation::{InvocationContext, InvocationRequest, RequestUser};

/// The readable request body handed to the middleware chain.
///
/// A pull-based stream of byte chunks; `poll_next` subsumes the
/// `data`/`end` events and pause/resume of event-based stream runtimes.
/// When the invocation carried no body this is already ended, so body
/// parsers see end-of-input immediately instead of waiting forever.
///
/// The first error item observed is forwarded to the invocation's failure
/// channel: it rejects the pending response value, or errors the output
/// stream when the response already resolved. The stream ends after an
/// error.
pub struct RequestBody {
    inner: ByteStream,
    completion: Completion,
    faulted: bool,
}

impl RequestBody {
    pub(crate) fn new(inner: ByteStream, completion: Completion) -> Self {
        Self {
            inner,
            completion,
            faulted: false,
        }
    }

    /// Collect the whole body into one buffer, for buffering body parsers.
    pub async fn into_bytes(mut self) -> Result<Bytes, StreamError> {
        let mut collected = Vec::new();
        while let Some(item) = std::future::poll_fn(|cx| Pin::new(&mut self).poll_next(cx)).await {
            collected.extend_from_slice(&item?);
        }
        Ok(Bytes::from(collected))
    }
}

impl Stream for RequestBody {
    type Item = Result<Bytes, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.faulted {
            return Poll::Ready(None);
        }
        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Err(e))) => {
                this.faulted = true;
                this.completion.fail(e.clone());
                Poll::Ready(Some(Err(e)))
            }
            other => other,
        }
    }
}

/// The mutable request object given to the middleware chain.
///
/// Fields are public because chains mutate them in place — url rewrites
/// during routing are routine. `user` and `context` are extension fields
/// outside the conventional request shape; middleware unaware of the host
/// is unaffected by them.
pub struct SynthesizedRequest {
    pub method: String,
    pub url: String,
    /// Flattened header map: names ASCII-lowercased, repeated keys
    /// resolved last-value-wins.
    pub headers: HashMap<String, String>,
    pub body: RequestBody,
    pub user: Option<RequestUser>,
    pub context: InvocationContext,
}

impl SynthesizedRequest {
    /// Case-insensitive header lookup (the map keys are lowercased).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

pub(crate) fn synthesize(
    request: InvocationRequest,
    context: InvocationContext,
    completion: Completion,
) -> SynthesizedRequest {
    let InvocationRequest {
        method,
        url,
        headers,
        body,
        user,
    } = request;

    let body = RequestBody::new(body.unwrap_or_else(body::empty), completion);

    SynthesizedRequest {
        method,
        url,
        headers: flatten_headers(headers),
        body,
        user,
        context,
    }
}

/// Materialize the ordered pair list into a plain map.
///
/// Names are lowercased; repeated keys resolve last-value-wins. Chains
/// that need multi-value request headers do not exist in the write/end
/// convention this bridge targets.
fn flatten_headers(pairs: Vec<(String, String)>) -> HashMap<String, String> {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value))
        .collect()
}
