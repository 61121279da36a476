//! # Transport Boundary
//!
//! The types exchanged with whatever listens on a socket. The engine never
//! performs I/O itself: a transport decodes the wire request into a
//! [`Request`] (method, path segments, query and body parameters, headers) and
//! receives a [`Response`] back from the
//! [`Dispatcher`](crate::dispatcher::Dispatcher).
//!
//! Both types keep their small collections in `SmallVec` so the common case
//! (a handful of headers, a handful of parameters) stays on the stack.

mod request;
mod response;

pub use request::{
    parse_query_params, split_path, Params, Request, RequestBuildError, RequestBuilder,
};
pub use response::{HeaderVec, Response, MAX_INLINE_HEADERS};
