use std::time::Duration;

use tracing::{error, info, warn};

use super::Middleware;
use crate::router::ResolvedTarget;
use crate::transport::{Request, Response};

/// Logs the resolved target and the outcome of every request.
///
/// Fields are recorded inside the dispatcher's `dispatch` span, so the
/// request id travels with them.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, req: &Request, target: &ResolvedTarget) -> Option<Response> {
        info!(
            method = %req.method,
            path = %req.path,
            namespace = %target.namespace_path,
            group = %target.group.name(),
            handler = target.descriptor.name().unwrap_or("<anonymous>"),
            positional = target.remaining.len(),
            "Request resolved"
        );
        None
    }

    fn after(&self, req: &Request, res: &mut Response, latency: Duration) {
        let latency_us = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        if res.status >= 500 {
            error!(method = %req.method, path = %req.path, status = res.status, latency_us, "Request failed");
        } else if res.status >= 400 {
            warn!(method = %req.method, path = %req.path, status = res.status, latency_us, "Request rejected");
        } else {
            info!(method = %req.method, path = %req.path, status = res.status, latency_us, "Request completed");
        }
    }
}
