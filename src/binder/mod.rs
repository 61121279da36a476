//! # Binder Module
//!
//! Turns the leftovers of path resolution into the concrete arguments of a
//! handler call.
//!
//! ## Inputs
//!
//! - the unconsumed path segments of a [`ResolvedTarget`](crate::router::ResolvedTarget)
//! - a keyword map: query parameters overlaid by body parameters
//!   ([`ParamBinder::merge`], body wins on collision)
//! - the target's [`HandlerDescriptor`](crate::registry::HandlerDescriptor)
//!
//! ## Rules
//!
//! 1. Segments fill required slots, then optional slots, in order. Too few is
//!    `MissingPathParam`; too many is `TooManyPathParams` unless the
//!    descriptor declares a rest parameter.
//! 2. A keyword naming a positionally filled slot is `AmbiguousParam`.
//! 3. Undeclared keywords are `UnexpectedParam` unless the descriptor accepts
//!    a variadic keyword catch-all.
//! 4. Unfilled optional parameters receive their declared default.
//! 5. The descriptor's validator steps run in order.
//!
//! Precedence for a single name is therefore: path segment, then body, then
//! query, then default.

mod core;
mod validator;

pub use core::{BoundArguments, ParamBinder, ParamVec, MAX_INLINE_PARAMS};
pub use validator::{Coerce, OneOf, ParamType, ParamValidator, RequireParam};
