//! # Router Module
//!
//! Resolves a request path to a handler without a route table. The path is
//! walked against the registry's namespace tree:
//!
//! 1. **Descent**: consume segments while each names a child namespace.
//! 2. **Group**: try the next segment as a group name at the namespace
//!    reached; if none matches, use the fallback group there. No fallback
//!    group means `NotFound`.
//! 3. **Method**: pick the group's handler for the request method, or fail
//!    with `MethodNotAllowed` listing the methods the group does have.
//!
//! Segments left over after step 2 become positional argument candidates for
//! the [`ParamBinder`](crate::binder::ParamBinder).
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use nsrouter::registry::{HandlerDescriptor, HandlerGroupBuilder, HandlerRegistry};
//! use nsrouter::router::PathResolver;
//! use nsrouter::{BoundArguments, Reply};
//!
//! let registry = HandlerRegistry::builder()
//!     .group("/foo", HandlerGroupBuilder::new("Bar").handler(
//!         HandlerDescriptor::new(Method::GET, |_: BoundArguments| Ok(Reply::from("bar")))
//!             .required(["one"]),
//!     ))
//!     .build()
//!     .expect("valid registry");
//!
//! let segments: Vec<String> = vec!["foo".into(), "bar".into(), "che".into()];
//! let target = PathResolver::for_registry(&registry)
//!     .resolve(&Method::GET, &segments)
//!     .expect("resolves");
//! assert_eq!(target.group.name(), "Bar");
//! assert_eq!(target.remaining, vec!["che".to_string()]);
//! ```

mod core;

pub use core::{PathResolver, ResolvedGroup, ResolvedTarget};
