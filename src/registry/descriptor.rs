use http::Method;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::binder::{BoundArguments, ParamValidator};
use crate::error::{RegistryError, RouteError};
use crate::transport::{HeaderVec, Response};

/// What a handler returns: a reply or a typed error.
pub type HandlerResult = Result<Reply, RouteError>;

/// A callable bound to one HTTP method of a handler group.
///
/// Implemented for every `Fn(BoundArguments) -> HandlerResult`, so plain
/// closures and functions can be registered directly.
pub trait Handler: Send + Sync {
    fn call(&self, args: BoundArguments) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(BoundArguments) -> HandlerResult + Send + Sync,
{
    fn call(&self, args: BoundArguments) -> HandlerResult {
        self(args)
    }
}

/// Successful handler output.
///
/// `status` is `None` unless the handler wants something other than 200.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: Option<u16>,
    pub headers: HeaderVec,
    pub body: Value,
}

impl Reply {
    #[must_use]
    pub fn new(body: Value) -> Self {
        Self {
            status: None,
            headers: HeaderVec::new(),
            body,
        }
    }

    /// Reply with an explicit status code
    #[must_use]
    pub fn with_status(status: u16, body: Value) -> Self {
        Self {
            status: Some(status),
            headers: HeaderVec::new(),
            body,
        }
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .push((Arc::from(name.to_ascii_lowercase()), value.into()));
        self
    }

    /// Wrap into a response descriptor (200 unless a status was signalled).
    #[must_use]
    pub fn into_response(self) -> Response {
        let mut resp = Response::json(self.status.unwrap_or(200), self.body);
        for (name, value) in self.headers {
            resp.set_header(&name, value);
        }
        resp
    }
}

impl From<Value> for Reply {
    fn from(body: Value) -> Self {
        Reply::new(body)
    }
}

impl From<&str> for Reply {
    fn from(body: &str) -> Self {
        Reply::new(Value::String(body.to_string()))
    }
}

impl From<String> for Reply {
    fn from(body: String) -> Self {
        Reply::new(Value::String(body))
    }
}

/// Optional parameter with its declared default
#[derive(Debug, Clone, PartialEq)]
pub struct OptionalParam {
    pub name: Arc<str>,
    pub default: Value,
}

/// Static signature plus invocation hook for one HTTP method.
///
/// Built once when the registry is assembled; the binder reads it on every
/// request and never needs to inspect the handler itself.
#[derive(Clone)]
pub struct HandlerDescriptor {
    method: Method,
    name: Option<Arc<str>>,
    required: Vec<Arc<str>>,
    optional: Vec<OptionalParam>,
    variadic_keyword: bool,
    rest: Option<Arc<str>>,
    validators: Vec<Arc<dyn ParamValidator>>,
    handler: Arc<dyn Handler>,
}

impl HandlerDescriptor {
    /// Descriptor with no parameters around a handler closure
    pub fn new<F>(method: Method, handler: F) -> Self
    where
        F: Fn(BoundArguments) -> HandlerResult + Send + Sync + 'static,
    {
        Self::from_arc(method, Arc::new(handler))
    }

    /// Descriptor around an already shared handler
    #[must_use]
    pub fn from_arc(method: Method, handler: Arc<dyn Handler>) -> Self {
        Self {
            method,
            name: None,
            required: Vec::new(),
            optional: Vec::new(),
            variadic_keyword: false,
            rest: None,
            validators: Vec::new(),
            handler,
        }
    }

    /// Name used in logs and route listings
    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(Arc::from(name));
        self
    }

    /// Append required positional parameters, in order
    #[must_use]
    pub fn required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.required
            .extend(names.into_iter().map(|n| Arc::from(n.as_ref())));
        self
    }

    /// Append an optional parameter with its default
    #[must_use]
    pub fn optional(mut self, name: &str, default: Value) -> Self {
        self.optional.push(OptionalParam {
            name: Arc::from(name),
            default,
        });
        self
    }

    /// Accept arbitrary keyword parameters beyond the declared ones
    #[must_use]
    pub fn variadic_keyword(mut self) -> Self {
        self.variadic_keyword = true;
        self
    }

    /// Collect path segments beyond the declared slots under `name`
    #[must_use]
    pub fn rest(mut self, name: &str) -> Self {
        self.rest = Some(Arc::from(name));
        self
    }

    /// Append a validator step; steps run in insertion order after binding
    #[must_use]
    pub fn validator<V>(mut self, validator: V) -> Self
    where
        V: ParamValidator + 'static,
    {
        self.validators.push(Arc::new(validator));
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn required_params(&self) -> &[Arc<str>] {
        &self.required
    }

    #[must_use]
    pub fn optional_params(&self) -> &[OptionalParam] {
        &self.optional
    }

    #[must_use]
    pub fn accepts_variadic_keyword(&self) -> bool {
        self.variadic_keyword
    }

    #[must_use]
    pub fn rest_param(&self) -> Option<&Arc<str>> {
        self.rest.as_ref()
    }

    #[must_use]
    pub fn validators(&self) -> &[Arc<dyn ParamValidator>] {
        &self.validators
    }

    /// `(required, optional)` counts
    #[must_use]
    pub fn arity(&self) -> (usize, usize) {
        (self.required.len(), self.optional.len())
    }

    /// Whether `name` is a declared optional parameter
    #[must_use]
    pub fn is_optional(&self, name: &str) -> bool {
        self.optional.iter().any(|p| p.name.as_ref() == name)
    }

    /// Call the handler. Panics are the caller's concern.
    pub fn invoke(&self, args: BoundArguments) -> HandlerResult {
        self.handler.call(args)
    }

    /// Human-readable signature, e.g. `GET(one, two=null, **kwargs)`
    #[must_use]
    pub fn signature(&self) -> String {
        let mut parts: Vec<String> = self.required.iter().map(|n| n.to_string()).collect();
        parts.extend(
            self.optional
                .iter()
                .map(|p| format!("{}={}", p.name, p.default)),
        );
        if let Some(rest) = &self.rest {
            parts.push(format!("*{rest}"));
        }
        if self.variadic_keyword {
            parts.push("**kwargs".to_string());
        }
        format!("{}({})", self.method, parts.join(", "))
    }

    /// Enforce the signature invariants: no empty names, and no name declared
    /// twice across required, optional and rest parameters.
    pub(crate) fn check(&self, group: &str) -> Result<(), RegistryError> {
        let mut seen = HashSet::new();
        let names = self
            .required
            .iter()
            .chain(self.optional.iter().map(|p| &p.name))
            .chain(self.rest.iter());
        for name in names {
            if name.is_empty() {
                return Err(RegistryError::EmptyName {
                    what: format!("{} handler on '{}'", self.method, group),
                });
            }
            if !seen.insert(name.as_ref()) {
                return Err(RegistryError::DuplicateParam {
                    group: group.to_string(),
                    method: self.method.clone(),
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("method", &self.method)
            .field("name", &self.name)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("variadic_keyword", &self.variadic_keyword)
            .field("rest", &self.rest)
            .field("validators", &self.validators.len())
            .finish_non_exhaustive()
    }
}
