//! # Error Taxonomy
//!
//! Every failure the resolution engine can detect is a typed [`RouteError`].
//! Components return it to the [`Dispatcher`](crate::dispatcher::Dispatcher),
//! which never recovers locally: each error becomes a
//! [`Response`](crate::transport::Response) through [`RouteError::into_response`].
//!
//! | Kind | Status |
//! |---|---|
//! | `NotFound` | 404 |
//! | `MethodNotAllowed` | 405 (+ `Allow`) |
//! | `VersionNotFound` | 404 |
//! | `MissingPathParam` | 404 |
//! | `TooManyPathParams` | 404 |
//! | `AmbiguousParam` | 400 |
//! | `UnexpectedParam` | 400 |
//! | `InvalidParam` | 400 |
//! | `Http` | handler-chosen |
//! | `Internal` | 500 |
//!
//! Construction-time problems (duplicate handlers, colliding parameter
//! names) are reported separately as [`RegistryError`] so that they can never
//! reach a request.

use http::Method;
use serde_json::json;
use thiserror::Error;

use crate::transport::Response;

/// Fieldless discriminant of a [`RouteError`], handy for assertions and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    MethodNotAllowed,
    VersionNotFound,
    MissingPathParam,
    TooManyPathParams,
    AmbiguousParam,
    UnexpectedParam,
    InvalidParam,
    Http,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NotFound",
            ErrorKind::MethodNotAllowed => "MethodNotAllowed",
            ErrorKind::VersionNotFound => "VersionNotFound",
            ErrorKind::MissingPathParam => "MissingPathParam",
            ErrorKind::TooManyPathParams => "TooManyPathParams",
            ErrorKind::AmbiguousParam => "AmbiguousParam",
            ErrorKind::UnexpectedParam => "UnexpectedParam",
            ErrorKind::InvalidParam => "InvalidParam",
            ErrorKind::Http => "Http",
            ErrorKind::Internal => "Internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-time failure produced by the resolver, binder, validators or a handler.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RouteError {
    /// No namespace/handler group resolves for the path
    #[error("no handler group found for path '{path}'")]
    NotFound { path: String },

    /// A group resolved but has no handler for the request method
    #[error("method {method} not allowed")]
    MethodNotAllowed { method: Method, allowed: Vec<Method> },

    /// The `Accept` header names a version with no registered root
    #[error("unknown version '{version}'")]
    VersionNotFound { version: String },

    /// Fewer path segments than required parameters
    #[error("missing path parameter '{name}'")]
    MissingPathParam { name: String },

    /// More path segments than declared parameters
    #[error("too many path parameters: expected at most {expected}, received {received}")]
    TooManyPathParams { expected: usize, received: usize },

    /// A name supplied both positionally and by keyword
    #[error("parameter '{name}' supplied both in the path and as a keyword")]
    AmbiguousParam { name: String },

    /// A keyword the handler does not declare and cannot absorb
    #[error("unexpected parameter '{name}'")]
    UnexpectedParam { name: String },

    /// A validator step rejected a bound value
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParam { name: String, reason: String },

    /// Typed error raised by a handler to signal a specific status
    #[error("{message}")]
    Http { status: u16, message: String },

    /// Unrecognised handler failure
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl RouteError {
    /// Shorthand for a handler-signalled error with an explicit status.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        RouteError::Http {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        RouteError::Internal {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            RouteError::NotFound { .. } => ErrorKind::NotFound,
            RouteError::MethodNotAllowed { .. } => ErrorKind::MethodNotAllowed,
            RouteError::VersionNotFound { .. } => ErrorKind::VersionNotFound,
            RouteError::MissingPathParam { .. } => ErrorKind::MissingPathParam,
            RouteError::TooManyPathParams { .. } => ErrorKind::TooManyPathParams,
            RouteError::AmbiguousParam { .. } => ErrorKind::AmbiguousParam,
            RouteError::UnexpectedParam { .. } => ErrorKind::UnexpectedParam,
            RouteError::InvalidParam { .. } => ErrorKind::InvalidParam,
            RouteError::Http { .. } => ErrorKind::Http,
            RouteError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// HTTP status the caller should send for this error
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            RouteError::NotFound { .. }
            | RouteError::VersionNotFound { .. }
            | RouteError::MissingPathParam { .. }
            | RouteError::TooManyPathParams { .. } => 404,
            RouteError::MethodNotAllowed { .. } => 405,
            RouteError::AmbiguousParam { .. }
            | RouteError::UnexpectedParam { .. }
            | RouteError::InvalidParam { .. } => 400,
            RouteError::Http { status, .. } => *status,
            RouteError::Internal { .. } => 500,
        }
    }

    /// True for errors caused by the request rather than the server
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }

    /// Render the error as a JSON response.
    ///
    /// `MethodNotAllowed` carries an `Allow` header with the methods the group
    /// does register.
    #[must_use]
    pub fn into_response(self) -> Response {
        let status = self.status();
        let mut resp = Response::json(
            status,
            json!({
                "error": self.to_string(),
                "kind": self.kind().as_str(),
            }),
        );
        if let RouteError::MethodNotAllowed { allowed, .. } = &self {
            resp.set_header("allow", join_methods(allowed));
        }
        resp
    }
}

/// Comma-join methods the way `Allow` and `Access-Control-Allow-Methods` expect.
pub(crate) fn join_methods(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failure while building a [`HandlerRegistry`](crate::registry::HandlerRegistry).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("group '{group}' at '{namespace}' registers {method} more than once")]
    DuplicateMethod {
        namespace: String,
        group: String,
        method: Method,
    },

    #[error("group '{group}' is registered twice at '{namespace}'")]
    DuplicateGroup { namespace: String, group: String },

    #[error("handler {method} on '{group}' declares parameter '{name}' more than once")]
    DuplicateParam {
        group: String,
        method: Method,
        name: String,
    },

    #[error("group '{group}' at '{namespace}' is shadowed by a child namespace of the same name")]
    ShadowedGroup { namespace: String, group: String },

    #[error("version '{version}' is registered twice")]
    DuplicateVersion { version: String },

    #[error("empty name in {what}")]
    EmptyName { what: String },

    #[error("unknown handler '{name}' referenced by {location}")]
    UnknownHandler { name: String, location: String },

    #[error("invalid HTTP method '{method}' in {location}")]
    InvalidMethod { method: String, location: String },
}
