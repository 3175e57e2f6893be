//! Bridge error types.

use std::fmt;

use thiserror::Error;

/// A lightweight, cloneable error carried by streaming body items.
///
/// Byte streams yield `Result<Bytes, StreamError>`; the item error has to
/// be cheap to clone because a single fault may be reported both to the
/// invocation's failure channel and to the response body stream.
#[derive(Debug, Clone)]
pub struct StreamError {
    message: String,
}

impl StreamError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for StreamError {}

impl From<String> for StreamError {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for StreamError {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Errors that can fail a bridged invocation.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The middleware chain returned an error before producing a response.
    #[error("middleware chain failed: {0}")]
    Chain(#[from] anyhow::Error),

    /// The inbound request body stream faulted before the response was resolved.
    #[error("request body stream failed: {0}")]
    BodyStream(#[from] StreamError),

    /// The chain dropped the response writer without ever writing or ending.
    #[error("middleware chain dropped the response writer before replying")]
    Abandoned,
}

pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_error_display() {
        let err = StreamError::new("socket reset");
        assert_eq!(format!("{err}"), "socket reset");
        assert_eq!(err.message(), "socket reset");
    }

    #[test]
    fn stream_error_is_clone() {
        let err = StreamError::from("upstream gone");
        let cloned = err.clone();
        assert_eq!(err.message(), cloned.message());
    }

    #[test]
    fn bridge_error_from_stream_error() {
        let err: BridgeError = StreamError::new("aborted").into();
        assert_eq!(
            format!("{err}"),
            "request body stream failed: aborted"
        );
    }

    #[test]
    fn bridge_error_from_anyhow() {
        let err: BridgeError = anyhow::anyhow!("handler blew up").into();
        assert!(matches!(err, BridgeError::Chain(_)));
        assert_eq!(format!("{err}"), "middleware chain failed: handler blew up");
    }
}
