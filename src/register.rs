//! Registration surface — option merging and trigger defaults.
//!
//! Turns a middleware chain plus optional name/options into the
//! [`FunctionRegistration`] value an invocation host consumes. The entry
//! point mirrors the loose `(chain, name?, options?)` convention through
//! [`RegisterArgs`] conversions, so a call site can pass a name, options,
//! both, or nothing.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::handler::{ChainFn, InvocationHandler, chain_handler};

/// Name used when registration is called without one.
pub const DEFAULT_FUNCTION_NAME: &str = "Api";

/// Match-all route pattern: the chain does its own routing.
pub const DEFAULT_ROUTE: &str = "{*segments}";

/// Full method set. The host platform's documented default sounds like
/// "all methods" but is actually just GET and POST, so registration pins
/// the complete list explicitly.
pub const DEFAULT_METHODS: [&str; 9] = [
    "CONNECT", "DELETE", "GET", "HEAD", "OPTIONS", "PATCH", "POST", "PUT", "TRACE",
];

/// Authorization level required to call the function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthLevel {
    #[default]
    Anonymous,
    Function,
    Admin,
}

/// User-supplied registration options; unset fields take the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerOptions {
    pub route: Option<String>,
    pub methods: Option<Vec<String>>,
    pub auth_level: Option<AuthLevel>,
}

/// Positional arguments accepted by [`register`].
///
/// The typed form of the name/options overload: a first argument that is
/// not a name is the options value, and the default name applies.
#[derive(Default)]
pub struct RegisterArgs {
    pub name: Option<String>,
    pub options: Option<TriggerOptions>,
}

impl From<()> for RegisterArgs {
    fn from((): ()) -> Self {
        Self::default()
    }
}

impl From<&str> for RegisterArgs {
    fn from(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            options: None,
        }
    }
}

impl From<String> for RegisterArgs {
    fn from(name: String) -> Self {
        Self {
            name: Some(name),
            options: None,
        }
    }
}

impl From<TriggerOptions> for RegisterArgs {
    fn from(options: TriggerOptions) -> Self {
        Self {
            name: None,
            options: Some(options),
        }
    }
}

impl From<(&str, TriggerOptions)> for RegisterArgs {
    fn from((name, options): (&str, TriggerOptions)) -> Self {
        Self {
            name: Some(name.to_string()),
            options: Some(options),
        }
    }
}

/// A registered HTTP function, ready for the invocation host.
///
/// `stream_enabled` is always true: the bridge resolves response values
/// whose bodies are live streams, so the host must accept chunked output.
pub struct FunctionRegistration {
    pub name: String,
    pub route: String,
    pub methods: Vec<String>,
    pub auth_level: AuthLevel,
    pub stream_enabled: bool,
    pub handler: InvocationHandler,
}

/// Register a middleware chain as an HTTP-triggered function.
///
/// Options merge over the defaults; the handler slot is never
/// user-overridable — it is always the bridging handler for `chain`.
pub fn register(chain: ChainFn, args: impl Into<RegisterArgs>) -> FunctionRegistration {
    let RegisterArgs { name, options } = args.into();
    let name = name.unwrap_or_else(|| DEFAULT_FUNCTION_NAME.to_string());
    let options = options.unwrap_or_default();

    let registration = FunctionRegistration {
        route: options
            .route
            .unwrap_or_else(|| DEFAULT_ROUTE.to_string()),
        methods: options
            .methods
            .unwrap_or_else(|| DEFAULT_METHODS.iter().map(|m| m.to_string()).collect()),
        auth_level: options.auth_level.unwrap_or_default(),
        stream_enabled: true,
        handler: chain_handler(chain),
        name,
    };

    info!(
        name = %registration.name,
        route = %registration.route,
        methods = registration.methods.len(),
        "registered middleware chain"
    );
    registration
}
