//! Error types for the Plex client.
//!
//! # Design
//! Each layer owns its error: the transport reports `TransportError`, the XML
//! layer reports `ParseError`/`QueryError`, and caller-supplied values that
//! cannot be embedded safely report `InputError`. The two operations wrap
//! those into `AuthError` and `ResolveError` so callers can match on a single
//! enum per call. `NotFound` is an expected outcome, not a failure of the
//! pipeline: the server answered with a well-formed document that lacked the
//! requested node.

use thiserror::Error;

use crate::http::HttpMethod;

/// Configuration rejected while constructing a client.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InitError {
    #[error("invalid {field} endpoint {url:?}: {reason}")]
    InvalidEndpoint {
        field: &'static str,
        url: String,
        reason: String,
    },

    #[error("{header} must be a non-empty header-safe string")]
    InvalidHeader { header: &'static str },

    #[error("timeout must be greater than zero")]
    ZeroTimeout,
}

/// The HTTP round-trip failed before a usable response was captured.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{method} {url} failed: {source}")]
    Request {
        method: HttpMethod,
        url: String,
        #[source]
        source: ureq::Error,
    },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: ureq::Error,
    },

    /// The server answered, but with a status the caller treats as failure.
    #[error("HTTP {status} from {url}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },
}

/// The response body is not a well-formed XML document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("response body is empty")]
    Empty,

    #[error("malformed XML: {0}")]
    Malformed(String),
}

/// A path expression could not be compiled or evaluated.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid path expression {expression:?}: {reason}")]
pub struct QueryError {
    pub expression: String,
    pub reason: String,
}

impl QueryError {
    pub(crate) fn new(expression: &str, reason: impl Into<String>) -> Self {
        Self {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}

/// A caller-supplied value cannot be used as-is.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("{0:?} contains a double quote and cannot be embedded in a path expression")]
    UnsafeLiteral(String),

    #[error("username must not contain ':'")]
    InvalidUsername,

    #[error("token must be a non-empty string of visible ASCII characters")]
    InvalidToken,
}

/// Failure of `get_auth_token`.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    InvalidInput(#[from] InputError),

    #[error("sign-in response has no authentication token")]
    NotFound,
}

/// Failure of `get_device_uri`.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    InvalidInput(#[from] InputError),

    #[error("no local connection found for device {device:?}")]
    NotFound { device: String },
}
