//! # nsrouter
//!
//! **nsrouter** is a table-free HTTP request resolver. Instead of matching a
//! path against a list of patterns, it walks the path segment by segment
//! through a tree of namespaces, picks a handler group, and binds whatever
//! segments are left over to the handler's declared parameters.
//!
//! ## Overview
//!
//! Handlers are registered in groups. A group lives at a namespace (a `/`
//! prefix), has a name, and bundles one handler per HTTP method. A request
//! for `/foo/bar/che` reaches the group `bar` in namespace `/foo`, and `che`
//! becomes the handler's first positional argument. Each namespace may also
//! hold a fallback group, used when the next segment names no group.
//!
//! The engine does no I/O. A transport builds a [`Request`], hands it to a
//! [`Dispatcher`] and writes the [`Response`] back on the wire.
//!
//! ## Architecture
//!
//! - **[`registry`]** - namespace tree, handler groups and handler descriptors
//! - **[`definition`]** - registries declared in YAML and bound by handler name
//! - **[`router`]** - greedy namespace descent and group resolution
//! - **[`binder`]** - positional and keyword argument binding plus validators
//! - **[`version`]** - alternate roots picked from the `Accept` header
//! - **[`middleware`]** - `before`/`after` hooks, CORS policy, request tracing
//! - **[`dispatcher`]** - the per-request state machine tying it all together
//! - **[`transport`]** - request and response types exchanged with a server
//! - **[`config`]** / **[`logging`]** - YAML plus environment configuration,
//!   structured `tracing` output
//! - **[`cli`]** - `nsrouter routes` and `nsrouter resolve`
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Transport
//!     participant Dispatcher
//!     participant Version as VersionSelector
//!     participant Resolver as PathResolver
//!     participant Cors as CorsPolicy
//!     participant Middleware as Middleware Chain
//!     participant Binder as ParamBinder
//!     participant Handler
//!
//!     Transport->>Dispatcher: dispatch(&Request)
//!     Dispatcher->>Version: select(Accept header)
//!     alt Unknown version
//!         Version-->>Transport: 404 VersionNotFound
//!     end
//!     Dispatcher->>Resolver: resolve_group(segments)
//!     alt No group
//!         Resolver-->>Transport: 404 Not Found
//!     end
//!     alt OPTIONS on CORS group
//!         Dispatcher->>Cors: preflight
//!         Cors-->>Transport: 204 / 403
//!     end
//!     Dispatcher->>Resolver: select(method)
//!     alt Method not registered
//!         Resolver-->>Transport: 405 + Allow
//!     end
//!     Dispatcher->>Middleware: before()
//!     Dispatcher->>Binder: bind(remaining, query + body)
//!     alt Binding failed
//!         Binder-->>Transport: 400 / 404
//!     end
//!     Dispatcher->>Handler: invoke(args)
//!     Handler-->>Dispatcher: Reply / RouteError / panic
//!     Dispatcher->>Middleware: after() (reverse order)
//!     Dispatcher-->>Transport: Response
//! ```
//!
//! ### Key Properties
//!
//! 1. **Frozen registry**: built once, then shared as `Arc<HandlerRegistry>`
//!    without locks.
//! 2. **No backtracking**: descent always takes the deepest matching
//!    namespace and never climbs back to a parent.
//! 3. **Errors are responses**: every failure maps to a status code through
//!    [`RouteError::into_response`].
//!
//! ## Quick Start
//!
//! ```rust
//! use http::Method;
//! use nsrouter::registry::{HandlerDescriptor, HandlerGroupBuilder, HandlerRegistry};
//! use nsrouter::{BoundArguments, Dispatcher, Reply, Request};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let registry = HandlerRegistry::builder()
//!     .group("/foo", HandlerGroupBuilder::new("Bar").handler(
//!         HandlerDescriptor::new(Method::GET, |args: BoundArguments| {
//!             Ok(Reply::from(json!({ "one": args.get("one") })))
//!         })
//!         .required(["one"]),
//!     ))
//!     .build()
//!     .expect("valid registry");
//!
//! let dispatcher = Dispatcher::new(Arc::new(registry));
//! let resp = dispatcher.dispatch(&Request::builder("GET", "/foo/bar/che").build().expect("request"));
//! assert_eq!(resp.status, 200);
//! assert_eq!(resp.body, json!({ "one": "che" }));
//! ```

pub mod binder;
pub mod cli;
pub mod config;
pub mod definition;
pub mod dispatcher;
pub mod echo;
pub mod error;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod registry;
pub mod router;
pub mod transport;
pub mod version;

pub use binder::{BoundArguments, ParamBinder};
pub use config::RouterConfig;
pub use dispatcher::{DispatchState, Dispatcher};
pub use error::{ErrorKind, RegistryError, RouteError};
pub use middleware::{CorsPolicy, Middleware};
pub use registry::{HandlerDescriptor, HandlerGroupBuilder, HandlerRegistry, Reply};
pub use router::PathResolver;
pub use transport::{Request, Response};
pub use version::VersionSelector;
