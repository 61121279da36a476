//! # Dispatcher Module
//!
//! Orchestrates one request through the engine:
//!
//! ```text
//! VERSIONING -> RESOLVING -> CORS_CHECK -> BINDING -> INVOKING -> DONE
//!      \____________\____________\____________\___________\_____> ERROR
//! ```
//!
//! - **VERSIONING**: [`VersionSelector`](crate::version::VersionSelector)
//!   picks the root from the `Accept` header.
//! - **RESOLVING**: [`PathResolver`](crate::router::PathResolver) finds the
//!   handler group.
//! - **CORS_CHECK**: an `OPTIONS` request to a CORS-enabled group is answered
//!   by the [`CorsPolicy`](crate::middleware::CorsPolicy) and goes straight to
//!   `DONE`. Otherwise the handler for the method is selected and the
//!   middleware `before` hooks run (a hook may short-circuit, e.g. for auth).
//! - **BINDING**: [`ParamBinder`](crate::binder::ParamBinder) produces the
//!   arguments.
//! - **INVOKING**: the handler runs once. A returned reply becomes a `200`
//!   (or the status the reply names); a returned [`RouteError`](crate::RouteError)
//!   passes through unchanged; a panic becomes `Internal`.
//!
//! Errors are never recovered from locally: each becomes a response through
//! [`RouteError::into_response`](crate::RouteError::into_response). Responses
//! for CORS-enabled groups are decorated with CORS headers and every response
//! passes through the middleware `after` hooks.
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use nsrouter::registry::{HandlerDescriptor, HandlerGroupBuilder, HandlerRegistry};
//! use nsrouter::{BoundArguments, Dispatcher, Reply, Request};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let registry = HandlerRegistry::builder()
//!     .group("/", HandlerGroupBuilder::fallback().handler(
//!         HandlerDescriptor::new(Method::GET, |_: BoundArguments| Ok(Reply::from("boom"))),
//!     ))
//!     .build()
//!     .expect("valid registry");
//!
//! let dispatcher = Dispatcher::new(Arc::new(registry));
//! let req = Request::builder("GET", "/").build().expect("valid request");
//! let resp = dispatcher.dispatch(&req);
//! assert_eq!(resp.status, 200);
//! assert_eq!(resp.body, json!("boom"));
//! ```

mod core;

pub use core::{DispatchState, Dispatcher};
