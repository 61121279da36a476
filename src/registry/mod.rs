//! # Registry Module
//!
//! The handler registry is the only shared state of the engine. It is a tree
//! of [`Namespace`]s, each holding child namespaces (keyed by path segment)
//! and [`HandlerGroup`]s (keyed by group name). A group bundles one
//! [`HandlerDescriptor`] per HTTP method.
//!
//! ## Lifecycle
//!
//! The registry is assembled once through [`RegistryBuilder`] (or from a
//! declarative [`RegistryDefinition`](crate::definition::RegistryDefinition))
//! and is frozen by [`RegistryBuilder::build`]. Nothing on the request path
//! can mutate it, so an `Arc<HandlerRegistry>` is shared by every in-flight
//! request without locking.
//!
//! ```rust
//! use http::Method;
//! use nsrouter::registry::{HandlerDescriptor, HandlerGroupBuilder, HandlerRegistry};
//! use nsrouter::{Reply, BoundArguments};
//! use serde_json::json;
//!
//! let registry = HandlerRegistry::builder()
//!     .group("/", HandlerGroupBuilder::fallback().handler(
//!         HandlerDescriptor::new(Method::GET, |_: BoundArguments| Ok(Reply::from(json!("boom")))),
//!     ))
//!     .group("/foo", HandlerGroupBuilder::new("Bar").handler(
//!         HandlerDescriptor::new(Method::GET, |args: BoundArguments| Ok(Reply::from(args.to_json())))
//!             .required(["one"])
//!             .optional("two", json!(null)),
//!     ))
//!     .build()
//!     .expect("valid registry");
//!
//! assert!(registry.root().child("foo").is_some());
//! ```
//!
//! ## Keys
//!
//! Namespace and group keys are lower-cased at build time and matched against
//! the lower-cased request segment, so group `Foo` answers `/foo`.

mod builder;
mod core;
mod descriptor;

pub use builder::{HandlerGroupBuilder, RegistryBuilder, RootBuilder};
pub use core::{HandlerGroup, HandlerRegistry, Namespace, RouteEntry, DEFAULT_GROUP};
pub use descriptor::{Handler, HandlerDescriptor, HandlerResult, OptionalParam, Reply};
