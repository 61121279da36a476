use http::Method;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info_span, warn};

use crate::binder::{BoundArguments, ParamBinder};
use crate::config::RouterConfig;
use crate::error::RouteError;
use crate::middleware::{CorsConfigError, CorsPolicy, Middleware, TracingMiddleware};
use crate::registry::{HandlerDescriptor, HandlerRegistry, HandlerResult};
use crate::router::PathResolver;
use crate::transport::{Request, Response};
use crate::version::VersionSelector;

/// Steps of one dispatch. `Error` is reachable from every non-terminal step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Versioning,
    Resolving,
    CorsCheck,
    Binding,
    Invoking,
    Done,
    Error,
}

impl DispatchState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchState::Versioning => "VERSIONING",
            DispatchState::Resolving => "RESOLVING",
            DispatchState::CorsCheck => "CORS_CHECK",
            DispatchState::Binding => "BINDING",
            DispatchState::Invoking => "INVOKING",
            DispatchState::Done => "DONE",
            DispatchState::Error => "ERROR",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, DispatchState::Done | DispatchState::Error)
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-local bookkeeping for one pass through the state machine
#[derive(Debug)]
struct Progress {
    state: DispatchState,
    /// The resolved group has the CORS flag
    cors_group: bool,
    /// The response is a preflight answer and is already complete
    preflight: bool,
}

impl Progress {
    fn new() -> Self {
        Self {
            state: DispatchState::Versioning,
            cors_group: false,
            preflight: false,
        }
    }

    fn enter(&mut self, next: DispatchState) {
        debug!(from = %self.state, to = %next, "Dispatch state transition");
        self.state = next;
    }

    fn fail(&mut self, err: &RouteError) {
        let status = err.status();
        if status >= 500 {
            error!(state = %self.state, kind = %err.kind(), status, error = %err, "Dispatch failed");
        } else {
            warn!(state = %self.state, kind = %err.kind(), status, error = %err, "Dispatch rejected");
        }
        self.state = DispatchState::Error;
    }
}

/// Runs requests through version selection, resolution, CORS, binding and
/// invocation against a frozen registry.
///
/// A `Dispatcher` holds no per-request state; share it (or clone it, which
/// only bumps reference counts) across as many threads as needed.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    cors: CorsPolicy,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Dispatcher {
    /// Dispatcher with the permissive CORS policy and no middleware
    #[must_use]
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self {
            registry,
            cors: CorsPolicy::default(),
            middlewares: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_cors(mut self, cors: CorsPolicy) -> Self {
        self.cors = cors;
        self
    }

    /// Dispatcher configured from a [`RouterConfig`]: its CORS policy, plus
    /// [`TracingMiddleware`] when request tracing is enabled.
    pub fn from_config(
        registry: Arc<HandlerRegistry>,
        config: &RouterConfig,
    ) -> Result<Self, CorsConfigError> {
        let mut dispatcher = Self::new(registry).with_cors(config.cors.build_policy()?);
        if config.trace_requests {
            dispatcher.add_middleware(Arc::new(TracingMiddleware));
        }
        Ok(dispatcher)
    }

    /// Append a middleware. `before` hooks run in registration order, `after`
    /// hooks in reverse.
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.middlewares.push(mw);
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn cors(&self) -> &CorsPolicy {
        &self.cors
    }

    /// Dispatch one request. Every outcome, including every failure, comes
    /// back as a [`Response`].
    #[must_use]
    pub fn dispatch(&self, req: &Request) -> Response {
        let span = info_span!(
            "dispatch",
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
        );
        let _enter = span.enter();
        let start = Instant::now();

        let mut progress = Progress::new();
        let mut resp = match self.drive(req, &mut progress) {
            Ok(resp) => {
                progress.enter(DispatchState::Done);
                resp
            }
            Err(err) => {
                progress.fail(&err);
                err.into_response()
            }
        };

        if progress.cors_group && !progress.preflight {
            self.cors.decorate(req, &mut resp);
        }

        let latency = start.elapsed();
        for mw in self.middlewares.iter().rev() {
            mw.after(req, &mut resp, latency);
        }

        debug!(
            status = resp.status,
            state = %progress.state,
            latency_us = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX),
            "Dispatch finished"
        );
        resp
    }

    fn drive(&self, req: &Request, progress: &mut Progress) -> Result<Response, RouteError> {
        let selected = VersionSelector::select(&self.registry, req.get_header("accept"))?;

        progress.enter(DispatchState::Resolving);
        let resolver = PathResolver::new(selected.root, self.registry.default_group());
        let group = resolver.resolve_group(&req.segments)?;
        progress.cors_group = group.group.cors_enabled();

        progress.enter(DispatchState::CorsCheck);
        if progress.cors_group && req.method == Method::OPTIONS {
            progress.preflight = true;
            return Ok(self.cors.preflight(req, &group.group));
        }
        let target = group.select(&req.method, &req.segments)?;

        for mw in &self.middlewares {
            if let Some(resp) = mw.before(req, &target) {
                debug!(status = resp.status, "Middleware short-circuited request");
                return Ok(resp);
            }
        }

        progress.enter(DispatchState::Binding);
        let keywords = ParamBinder::merge(&req.query, &req.body);
        let args = ParamBinder::bind(&target.remaining, keywords, &target.descriptor)?;

        progress.enter(DispatchState::Invoking);
        let reply = invoke(&target.descriptor, args)?;
        Ok(reply.into_response())
    }
}

/// Call the handler exactly once, turning a panic into `Internal`.
fn invoke(descriptor: &HandlerDescriptor, args: BoundArguments) -> HandlerResult {
    match panic::catch_unwind(AssertUnwindSafe(|| descriptor.invoke(args))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            error!(
                handler = descriptor.name().unwrap_or("<anonymous>"),
                panic_message = %message,
                "Handler panicked"
            );
            Err(RouteError::internal(format!("handler panicked: {message}")))
        }
    }
}
