use std::time::Duration;

use crate::router::ResolvedTarget;
use crate::transport::{Request, Response};

/// Hook around handler invocation.
///
/// `before` runs once the target is resolved (after any CORS preflight) and
/// before arguments are bound; returning a response short-circuits the
/// request, which is where authentication plugs in. `after` sees every
/// response the dispatcher produces, errors and preflight answers included.
pub trait Middleware: Send + Sync {
    fn before(&self, _req: &Request, _target: &ResolvedTarget) -> Option<Response> {
        None
    }
    fn after(&self, _req: &Request, _res: &mut Response, _latency: Duration) {}
}
