//! Types exchanged with the function-invocation host.
//!
//! [`InvocationRequest`] and [`InvocationContext`] come in from the host;
//! [`ResolvedResponse`] goes back out. These are the immutable
//! function-model values — the mutable middleware-model counterparts live
//! in the `request` and `response` modules.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::body::{ByteStream, OutputStream};
use crate::header::HeaderMap;

/// The immutable request value delivered by the invocation host.
///
/// Headers are an ordered list of pairs because the inbound representation
/// allows repeated keys; the synthesizer flattens them (see
/// [`SynthesizedRequest`](crate::SynthesizedRequest)).
pub struct InvocationRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<ByteStream>,
    pub user: Option<RequestUser>,
}

impl InvocationRequest {
    /// A body-less request — the common GET/HEAD shape.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
            user: None,
        }
    }
}

/// The authenticated caller identity attached by the host, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestUser {
    /// Identity provider that authenticated the caller.
    pub provider: String,
    pub id: String,
    pub username: String,
    /// Provider-specific claims, passed through untouched.
    #[serde(default)]
    pub claims: Value,
}

/// Opaque per-invocation metadata handle.
///
/// Carried onto the synthesized request as an extension field so that
/// middleware aware of the host can reach it; middleware that is not
/// simply never looks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvocationContext {
    pub invocation_id: String,
    pub function_name: String,
    #[serde(default)]
    pub extra: Value,
}

impl InvocationContext {
    pub fn new(invocation_id: impl Into<String>, function_name: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            function_name: function_name.into(),
            extra: Value::Null,
        }
    }
}

/// The single response value produced per invocation.
///
/// Status and headers are frozen at the header-sent transition — header
/// mutations the chain performs afterwards are not reflected. The body is
/// `None` when the chain never wrote any data, otherwise a live
/// [`OutputStream`] that may still be receiving chunks while the host
/// drains it.
#[derive(Debug)]
pub struct ResolvedResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Option<OutputStream>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_request_new_defaults() {
        let req = InvocationRequest::new("GET", "/items/42");
        assert_eq!(req.method, "GET");
        assert_eq!(req.url, "/items/42");
        assert!(req.headers.is_empty());
        assert!(req.body.is_none());
        assert!(req.user.is_none());
    }

    #[test]
    fn request_user_round_trips_through_json() {
        let user = RequestUser {
            provider: "aad".into(),
            id: "u-123".into(),
            username: "sam@example.com".into(),
            claims: serde_json::json!({"roles": ["admin"]}),
        };
        let json = serde_json::to_string(&user).unwrap();
        let back: RequestUser = serde_json::from_str(&json).unwrap();
        assert_eq!(user, back);
    }

    #[test]
    fn context_deserializes_without_extra() {
        let ctx: InvocationContext =
            serde_json::from_str(r#"{"invocation_id":"inv-1","function_name":"Api"}"#).unwrap();
        assert_eq!(ctx.invocation_id, "inv-1");
        assert_eq!(ctx.extra, Value::Null);
    }
}
