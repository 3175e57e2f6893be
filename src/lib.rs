//! fnbridge — bridges stream-style HTTP middleware chains to
//! function-invocation hosts.
//!
//! A middleware chain expects mutable request/response objects delivered
//! over a socket: a readable request body and a response populated through
//! low-level `write`/`end` primitives. A function-invocation host instead
//! calls a handler with an immutable request value and wants a single
//! response value back, optionally carrying a lazily-produced streaming
//! body. This crate is the adapter between the two models.
//!
//! # Architecture
//!
//! ```text
//! InvocationRequest + InvocationContext
//!       │
//!       ▼
//! SynthesizedRequest ────► middleware chain (one sync call)
//!                              │ write()/end()
//!                              ▼
//!                        ResponseWriter
//!                         │          │
//!            first write: resolve    every write: enqueue
//!                         ▼          ▼
//!              ResolvedResponse   OutputStream
//! ```
//!
//! The first write freezes status and headers and resolves the response
//! value exactly once; its body is a live [`OutputStream`] fed by that and
//! every later write, closed by `end`. A chain that never writes any data
//! resolves a body-less response.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use fnbridge::{ChainFn, register};
//!
//! let chain: ChainFn = Arc::new(|req, mut res| {
//!     res.set_header("content-type", "text/plain");
//!     res.write(format!("{} {}", req.method, req.url));
//!     res.end();
//!     Ok(())
//! });
//!
//! let registration = register(chain, "Echo");
//! assert_eq!(registration.route, "{*segments}");
//! ```

pub mod body;
mod completion;
mod error;
mod handler;
mod header;
mod invocation;
mod register;
mod request;
mod response;

pub use body::{ByteStream, OutputStream};
pub use error::{BridgeError, BridgeResult, StreamError};
pub use handler::{ChainFn, InvocationHandler, chain_handler};
pub use header::HeaderMap;
pub use invocation::{InvocationContext, InvocationRequest, RequestUser, ResolvedResponse};
pub use register::{
    AuthLevel, DEFAULT_FUNCTION_NAME, DEFAULT_METHODS, DEFAULT_ROUTE, FunctionRegistration,
    RegisterArgs, TriggerOptions, register,
};
pub use request::{RequestBody, SynthesizedRequest};
pub use response::{EndArg, Encoding, ResponseWriter, WriteArg, WriteCallback, WriteData};
