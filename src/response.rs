//! Response interception — translating write/end calls into a resolved
//! response value plus a live output stream.
//!
//! The middleware chain populates a [`ResponseWriter`] through the two
//! low-level primitives of the write/end convention. The first write (or
//! an `end` that carries data) freezes the status code and header set,
//! resolves the invocation's single response value, and — when that first
//! call carried data — creates the output stream that this and every
//! later write feeds. `end` closes the stream.
//!
//! The write primitives mirror the loosely-typed calling convention of
//! event-based stream runtimes, where an encoding or a completion callback
//! may occupy the same argument position. Here the trailing positions take
//! [`WriteArg`]/[`EndArg`] values, so the disambiguation is by type
//! rather than by runtime inspection.

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::body::OutputStream;
use crate::completion::Completion;
use crate::error::StreamError;
use crate::header::HeaderMap;
use crate::invocation::ResolvedResponse;

/// Completion callback for a write or end call.
///
/// Invoked synchronously once the chunk has been handed to the output
/// stream — there is no I/O wait at this layer.
pub type WriteCallback = Box<dyn FnOnce() + Send>;

/// Text-to-bytes conversion applied when a write payload is a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    /// Characters above U+00FF are replaced with `?`.
    Latin1,
    /// The payload string is hex digits; invalid input becomes an empty
    /// chunk with a warning.
    Hex,
}

impl Encoding {
    fn encode(self, text: &str) -> Bytes {
        match self {
            Encoding::Utf8 => Bytes::copy_from_slice(text.as_bytes()),
            Encoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect::<Vec<u8>>()
                .into(),
            Encoding::Hex => match hex::decode(text) {
                Ok(bytes) => Bytes::from(bytes),
                Err(e) => {
                    warn!(error = %e, "invalid hex payload, writing nothing");
                    Bytes::new()
                }
            },
        }
    }
}

/// A write payload: raw bytes, or text to be converted via an [`Encoding`].
#[derive(Debug, Clone)]
pub enum WriteData {
    Bytes(Bytes),
    Text(String),
}

impl WriteData {
    fn into_chunk(self, encoding: Encoding) -> Bytes {
        match self {
            WriteData::Bytes(b) => b,
            WriteData::Text(t) => encoding.encode(&t),
        }
    }
}

impl From<&str> for WriteData {
    fn from(s: &str) -> Self {
        WriteData::Text(s.to_string())
    }
}

impl From<String> for WriteData {
    fn from(s: String) -> Self {
        WriteData::Text(s)
    }
}

impl From<Bytes> for WriteData {
    fn from(b: Bytes) -> Self {
        WriteData::Bytes(b)
    }
}

impl From<Vec<u8>> for WriteData {
    fn from(b: Vec<u8>) -> Self {
        WriteData::Bytes(Bytes::from(b))
    }
}

impl From<&[u8]> for WriteData {
    fn from(b: &[u8]) -> Self {
        WriteData::Bytes(Bytes::copy_from_slice(b))
    }
}

/// What may appear in the encoding position of `write` and `end`:
/// an encoding, or the completion callback shifted forward.
pub enum WriteArg {
    Encoding(Encoding),
    Callback(WriteCallback),
}

/// What may appear in the data position of `end`: a payload, or the
/// completion callback when `end` is called with a single function
/// argument.
pub enum EndArg {
    Data(WriteData),
    Callback(WriteCallback),
}

/// The mutable response object given to the middleware chain.
///
/// Status code and headers stay freely mutable until the first write;
/// after the header-sent transition mutations still succeed but are no
/// longer reflected in the already-resolved response value.
pub struct ResponseWriter {
    status_code: u16,
    headers: HeaderMap,
    header_sent: bool,
    finished: bool,
    body_tx: Option<mpsc::UnboundedSender<Result<Bytes, StreamError>>>,
    completion: Completion,
}

impl ResponseWriter {
    pub(crate) fn new(completion: Completion) -> Self {
        Self {
            status_code: 200,
            headers: HeaderMap::new(),
            header_sent: false,
            finished: false,
            body_tx: None,
            completion,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn set_status(&mut self, status: u16) {
        self.status_code = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.set(name, value);
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Whether the header-sent transition already happened.
    pub fn header_sent(&self) -> bool {
        self.header_sent
    }

    /// Whether `end` has been called.
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Write a chunk of response data.
    ///
    /// The first call freezes status and headers and resolves the response
    /// value; this and every later call pushes the chunk into the output
    /// stream. Always returns `true` — there is no transport backpressure
    /// at this layer.
    pub fn write(&mut self, data: impl Into<WriteData>) -> bool {
        self.write_with(Some(data.into()), None, None)
    }

    /// `write` with the full trailing-argument surface.
    ///
    /// A [`WriteArg::Callback`] in the encoding position is recognized as
    /// the completion callback; a callback supplied there takes precedence
    /// over one in the trailing position, matching the primitive's own
    /// reassignment rule.
    pub fn write_with(
        &mut self,
        data: Option<WriteData>,
        arg: Option<WriteArg>,
        callback: Option<WriteCallback>,
    ) -> bool {
        let (encoding, callback) = match arg {
            Some(WriteArg::Callback(cb)) => (None, Some(cb)),
            Some(WriteArg::Encoding(enc)) => (Some(enc), callback),
            None => (None, callback),
        };
        let chunk = data.map(|d| d.into_chunk(encoding.unwrap_or_default()));
        self.deliver(chunk);
        if let Some(cb) = callback {
            cb();
        }
        true
    }

    /// Finalize the response.
    ///
    /// Runs the write path for any trailing data, then closes the output
    /// stream if one was ever created. Calling `end` again is a no-op
    /// apart from its callback.
    pub fn end(&mut self) {
        self.end_with(None, None, None);
    }

    /// `end` with the full trailing-argument surface.
    ///
    /// An [`EndArg::Callback`] in the data position means "no data, this
    /// is the callback" — the single-function-argument overload.
    pub fn end_with(
        &mut self,
        data: Option<EndArg>,
        arg: Option<WriteArg>,
        callback: Option<WriteCallback>,
    ) {
        let (data, arg, callback) = match data {
            Some(EndArg::Callback(cb)) => (None, None, Some(cb)),
            Some(EndArg::Data(d)) => (Some(d), arg, callback),
            None => (None, arg, callback),
        };
        let (encoding, callback) = match arg {
            Some(WriteArg::Callback(cb)) => (None, Some(cb)),
            Some(WriteArg::Encoding(enc)) => (Some(enc), callback),
            None => (None, callback),
        };

        self.write_with(data, encoding.map(WriteArg::Encoding), None);

        if let Some(tx) = self.body_tx.take() {
            drop(tx);
        }
        self.completion.close_body();
        self.finished = true;

        if let Some(cb) = callback {
            cb();
        }
    }

    fn deliver(&mut self, chunk: Option<Bytes>) {
        let chunk = chunk.filter(|b| !b.is_empty());

        if !self.header_sent {
            let body = chunk.is_some().then(|| {
                let (tx, rx) = mpsc::unbounded_channel();
                self.completion.set_body_sender(tx.clone());
                self.body_tx = Some(tx);
                OutputStream::new(rx)
            });
            debug!(
                status = self.status_code,
                streaming = body.is_some(),
                "response headers sent"
            );
            self.completion.resolve(ResolvedResponse {
                status: self.status_code,
                headers: self.headers.clone(),
                body,
            });
            self.header_sent = true;
        }

        if let Some(chunk) = chunk {
            match &self.body_tx {
                Some(tx) => {
                    // Send only fails when the consumer dropped the stream;
                    // the chain cannot act on that, so the chunk is dropped.
                    let _ = tx.send(Ok(chunk));
                }
                None => warn!(
                    len = chunk.len(),
                    "dropping chunk written after the response settled without a body stream"
                ),
            }
        }
    }
}
