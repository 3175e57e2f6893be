//! Handler factory — wraps a middleware chain as an invocation handler.
//!
//! The chain is invoked synchronously, once, with the synthesized request
//! and the intercepting response writer. The returned future settles when
//! the chain performs its first write or end call — which may happen
//! during the synchronous call, or later from a task the chain moved the
//! writer into.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::error;

use crate::completion::Completion;
use crate::error::{BridgeError, BridgeResult};
use crate::invocation::{InvocationContext, InvocationRequest, ResolvedResponse};
use crate::request::{self, SynthesizedRequest};
use crate::response::ResponseWriter;

/// The middleware chain being bridged.
///
/// A synchronous callable over the mutable request/response pair. It owns
/// the writer and may move it into an async task for deferred or streamed
/// responses. Returning `Err` rejects the invocation.
pub type ChainFn =
    Arc<dyn Fn(SynthesizedRequest, ResponseWriter) -> anyhow::Result<()> + Send + Sync>;

type BoxFuture = Pin<Box<dyn Future<Output = BridgeResult<ResolvedResponse>> + Send>>;

/// Handler shape consumed by the invocation host: one call per invocation,
/// one resolved response value out.
pub type InvocationHandler =
    Arc<dyn Fn(InvocationRequest, InvocationContext) -> BoxFuture + Send + Sync>;

/// Wrap a middleware chain as an [`InvocationHandler`].
///
/// Per invocation: synthesize the request, build the intercepting writer,
/// call the chain, hand back the future of the one-shot completion. A
/// chain that drops the writer without ever writing fails the invocation
/// with [`BridgeError::Abandoned`] instead of hanging it — keeping the
/// writer alive (e.g. in a spawned task) keeps the future pending.
pub fn chain_handler(chain: ChainFn) -> InvocationHandler {
    Arc::new(move |invocation: InvocationRequest, context: InvocationContext| {
        let (completion, reply) = Completion::new();
        let req = request::synthesize(invocation, context, completion.clone());
        let writer = ResponseWriter::new(completion.clone());

        if let Err(e) = (chain)(req, writer) {
            error!(error = %e, "middleware chain failed");
            completion.reject(BridgeError::Chain(e));
        }

        Box::pin(async move {
            match reply.await {
                Ok(outcome) => outcome,
                Err(_) => Err(BridgeError::Abandoned),
            }
        })
    })
}
