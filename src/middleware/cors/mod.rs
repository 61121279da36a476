//! CORS policy for handler groups flagged CORS-capable.
//!
//! The policy is not a [`Middleware`](super::Middleware): it needs the
//! resolved [`HandlerGroup`] before the method is selected, so the
//! dispatcher consults it directly. Groups without the flag never see it.

mod builder;
mod error;

pub use builder::CorsPolicyBuilder;
pub use error::CorsConfigError;

use http::Method;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::join_methods;
use crate::registry::HandlerGroup;
use crate::transport::{Request, Response};

/// Origin validation strategy
#[derive(Clone)]
pub enum OriginValidation {
    /// Exact string matching
    Exact(Vec<String>),
    /// Wildcard (allow all origins)
    Wildcard,
    /// Regex pattern matching
    Regex(Vec<Regex>),
    /// Custom validation function
    Custom(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl std::fmt::Debug for OriginValidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OriginValidation::Exact(origins) => f.debug_tuple("Exact").field(origins).finish(),
            OriginValidation::Wildcard => write!(f, "Wildcard"),
            OriginValidation::Regex(patterns) => f
                .debug_tuple("Regex")
                .field(&patterns.iter().map(Regex::as_str).collect::<Vec<_>>())
                .finish(),
            OriginValidation::Custom(_) => write!(f, "Custom(<function>)"),
        }
    }
}

impl OriginValidation {
    fn is_allowed(&self, origin: &str) -> bool {
        match self {
            OriginValidation::Exact(origins) => origins.iter().any(|o| o == origin),
            OriginValidation::Wildcard => true,
            OriginValidation::Regex(patterns) => patterns.iter().any(|re| re.is_match(origin)),
            OriginValidation::Custom(validator) => validator(origin),
        }
    }

    fn is_wildcard(&self) -> bool {
        matches!(self, OriginValidation::Wildcard)
    }
}

/// Preflight answering and response decoration for CORS-enabled groups.
///
/// # Preflight
///
/// An `OPTIONS` request to a CORS-enabled group is answered with `204` and a
/// `null` body, without binding or invoking anything:
///
/// - `Access-Control-Allow-Methods` and `Allow`: the group's registered methods
/// - `Access-Control-Allow-Origin`: `*` for a wildcard policy, otherwise the
///   request's `Origin` when allowed
/// - `Access-Control-Allow-Headers`: the configured list, or the request's
///   `Access-Control-Request-Headers` when the list is empty or `*`
/// - `Access-Control-Allow-Credentials`, `Access-Control-Max-Age` when configured
/// - `Vary: Origin`
///
/// A disallowed origin, a requested method the group does not register, or a
/// requested header outside the configured list gets `403`.
///
/// # Actual requests
///
/// Every other response for a CORS-enabled group gets
/// `Access-Control-Allow-Origin` (plus credentials, exposed headers and
/// `Vary`). A disallowed origin simply receives no CORS headers.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    pub(crate) origin_validation: OriginValidation,
    pub(crate) allowed_headers: Vec<String>,
    pub(crate) allow_credentials: bool,
    pub(crate) expose_headers: Vec<String>,
    pub(crate) max_age: Option<u32>,
}

impl CorsPolicy {
    #[must_use]
    pub fn builder() -> CorsPolicyBuilder {
        CorsPolicyBuilder::new()
    }

    /// Allow every origin, mirror requested headers, no credentials
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            origin_validation: OriginValidation::Wildcard,
            allowed_headers: vec![],
            allow_credentials: false,
            expose_headers: vec![],
            max_age: None,
        }
    }

    #[must_use]
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.origin_validation.is_allowed(origin)
    }

    /// Value for `Access-Control-Allow-Origin`, or `None` when no header
    /// should be sent.
    fn allow_origin(&self, origin: Option<&str>) -> Option<String> {
        if self.origin_validation.is_wildcard() {
            return Some("*".to_string());
        }
        origin
            .filter(|o| self.origin_validation.is_allowed(o))
            .map(str::to_string)
    }

    fn forbidden(reason: &str) -> Response {
        debug!(reason, "CORS preflight rejected");
        Response::no_content(403)
    }

    /// Answer a preflight request for `group`.
    #[must_use]
    pub fn preflight(&self, req: &Request, group: &HandlerGroup) -> Response {
        let origin = req.get_header("origin");
        let allow_origin = self.allow_origin(origin);
        if let (Some(origin), None) = (origin, &allow_origin) {
            warn!(origin = %origin, group = %group.name(), "CORS preflight: invalid origin");
            return Self::forbidden("origin");
        }

        let allowed = group.allowed_methods();
        if let Some(requested) = req.get_header("access-control-request-method") {
            let permitted = Method::from_bytes(requested.trim().as_bytes())
                .map(|m| allowed.contains(&m))
                .unwrap_or(false);
            if !permitted {
                warn!(
                    method = %requested,
                    group = %group.name(),
                    "CORS preflight: method not registered on group"
                );
                return Self::forbidden("method");
            }
        }

        let requested_headers = req
            .get_header("access-control-request-headers")
            .map(str::trim)
            .filter(|h| !h.is_empty());
        let mirror = self.allowed_headers.is_empty() || self.allowed_headers.iter().any(|h| h == "*");
        let allow_headers = if mirror {
            requested_headers.map(str::to_string)
        } else {
            if let Some(requested) = requested_headers {
                let unknown = requested.split(',').map(str::trim).find(|h| {
                    !self
                        .allowed_headers
                        .iter()
                        .any(|a| a.eq_ignore_ascii_case(h))
                });
                if let Some(header) = unknown {
                    warn!(header = %header, "CORS preflight: header not allowed");
                    return Self::forbidden("header");
                }
            }
            Some(self.allowed_headers.join(", "))
        };

        let methods = join_methods(&allowed);
        let mut resp = Response::no_content(204);
        resp.set_header("allow", methods.clone());
        resp.set_header("access-control-allow-methods", methods);
        if let Some(origin) = allow_origin {
            resp.set_header("access-control-allow-origin", origin);
        }
        if let Some(headers) = allow_headers {
            resp.set_header("access-control-allow-headers", headers);
        }
        if self.allow_credentials {
            resp.set_header("access-control-allow-credentials", "true".to_string());
        }
        if let Some(age) = self.max_age {
            resp.set_header("access-control-max-age", age.to_string());
        }
        resp.set_header("vary", "Origin".to_string());

        debug!(group = %group.name(), "CORS preflight answered");
        resp
    }

    /// Add CORS headers to a response produced for a CORS-enabled group.
    pub fn decorate(&self, req: &Request, res: &mut Response) {
        let origin = req.get_header("origin");
        let Some(allow_origin) = self.allow_origin(origin) else {
            if let Some(origin) = origin {
                warn!(origin = %origin, "CORS: origin not allowed, no CORS headers added");
            }
            return;
        };
        res.set_header("access-control-allow-origin", allow_origin);
        if self.allow_credentials {
            res.set_header("access-control-allow-credentials", "true".to_string());
        }
        if !self.expose_headers.is_empty() {
            res.set_header("access-control-expose-headers", self.expose_headers.join(", "));
        }
        res.set_header("vary", "Origin".to_string());
    }
}

/// Wildcard policy; see [`CorsPolicy::permissive`]
impl Default for CorsPolicy {
    fn default() -> Self {
        Self::permissive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::BoundArguments;
    use crate::registry::{HandlerDescriptor, HandlerGroupBuilder, HandlerRegistry, Reply};

    fn registry() -> HandlerRegistry {
        let get = HandlerDescriptor::new(Method::GET, |_: BoundArguments| Ok(Reply::from("g")));
        let post = HandlerDescriptor::new(Method::POST, |_: BoundArguments| Ok(Reply::from("p")));
        HandlerRegistry::builder()
            .group(
                "/",
                HandlerGroupBuilder::new("things")
                    .cors(true)
                    .handler(get)
                    .handler(post),
            )
            .build()
            .unwrap()
    }

    fn options(headers: &[(&str, &str)]) -> Request {
        headers
            .iter()
            .fold(Request::builder("OPTIONS", "/things"), |b, (k, v)| b.header(k, v))
            .build()
            .unwrap()
    }

    #[test]
    fn test_permissive_preflight() {
        let reg = registry();
        let group = reg.root().group("things").unwrap();
        let resp = CorsPolicy::default().preflight(
            &options(&[
                ("Origin", "https://a.example"),
                ("Access-Control-Request-Headers", "X-Custom, Content-Type"),
            ]),
            group,
        );
        assert_eq!(resp.status, 204);
        assert!(resp.is_empty());
        assert_eq!(resp.get_header("allow"), Some("GET, POST"));
        assert_eq!(resp.get_header("access-control-allow-methods"), Some("GET, POST"));
        assert_eq!(resp.get_header("access-control-allow-origin"), Some("*"));
        assert_eq!(
            resp.get_header("access-control-allow-headers"),
            Some("X-Custom, Content-Type")
        );
        assert_eq!(resp.get_header("vary"), Some("Origin"));
    }

    #[test]
    fn test_exact_origin_echoed_and_rejected() {
        let reg = registry();
        let group = reg.root().group("things").unwrap();
        let cors = CorsPolicy::builder()
            .allowed_origins(&["https://good.example"])
            .allow_credentials(true)
            .max_age(600)
            .build()
            .unwrap();

        let resp = cors.preflight(&options(&[("Origin", "https://good.example")]), group);
        assert_eq!(resp.status, 204);
        assert_eq!(
            resp.get_header("access-control-allow-origin"),
            Some("https://good.example")
        );
        assert_eq!(resp.get_header("access-control-allow-credentials"), Some("true"));
        assert_eq!(resp.get_header("access-control-max-age"), Some("600"));

        let resp = cors.preflight(&options(&[("Origin", "https://evil.example")]), group);
        assert_eq!(resp.status, 403);
        assert!(resp.get_header("access-control-allow-origin").is_none());
    }

    #[test]
    fn test_unregistered_requested_method_forbidden() {
        let reg = registry();
        let group = reg.root().group("things").unwrap();
        let resp = CorsPolicy::default().preflight(
            &options(&[("Access-Control-Request-Method", "DELETE")]),
            group,
        );
        assert_eq!(resp.status, 403);
    }

    #[test]
    fn test_configured_headers_enforced() {
        let reg = registry();
        let group = reg.root().group("things").unwrap();
        let cors = CorsPolicy::builder()
            .allowed_origins(&["*"])
            .allowed_headers(&["Content-Type"])
            .build()
            .unwrap();
        let ok = cors.preflight(
            &options(&[("Access-Control-Request-Headers", "content-type")]),
            group,
        );
        assert_eq!(ok.get_header("access-control-allow-headers"), Some("Content-Type"));
        let denied = cors.preflight(
            &options(&[("Access-Control-Request-Headers", "X-Secret")]),
            group,
        );
        assert_eq!(denied.status, 403);
    }

    #[test]
    fn test_decorate() {
        let cors = CorsPolicy::builder()
            .origin_patterns(&[r"^https://.*\.example\.com$"])
            .expose_headers(&["X-Total-Count"])
            .build()
            .unwrap();
        let req = Request::builder("GET", "/")
            .header("Origin", "https://api.example.com")
            .build()
            .unwrap();
        let mut resp = Response::ok(serde_json::json!("x"));
        cors.decorate(&req, &mut resp);
        assert_eq!(
            resp.get_header("access-control-allow-origin"),
            Some("https://api.example.com")
        );
        assert_eq!(resp.get_header("access-control-expose-headers"), Some("X-Total-Count"));

        let req = Request::builder("GET", "/")
            .header("Origin", "https://example.org")
            .build()
            .unwrap();
        let mut resp = Response::ok(serde_json::json!("x"));
        cors.decorate(&req, &mut resp);
        assert!(resp.get_header("access-control-allow-origin").is_none());
    }

    #[test]
    fn test_builder_validation() {
        assert_eq!(
            CorsPolicy::builder()
                .allowed_origins(&["*"])
                .allow_credentials(true)
                .build()
                .unwrap_err(),
            CorsConfigError::WildcardWithCredentials
        );
        assert_eq!(
            CorsPolicy::builder().allow_credentials(true).build().unwrap_err(),
            CorsConfigError::EmptyOriginsWithCredentials
        );
        assert!(matches!(
            CorsPolicy::builder()
                .allowed_origins(&["example.com"])
                .build()
                .unwrap_err(),
            CorsConfigError::InvalidOriginFormat { .. }
        ));
        assert!(matches!(
            CorsPolicy::builder()
                .allowed_origins(&["https://example.com/path"])
                .build()
                .unwrap_err(),
            CorsConfigError::InvalidOriginFormat { .. }
        ));
        assert!(matches!(
            CorsPolicy::builder()
                .origin_patterns(&["(unclosed"])
                .build()
                .unwrap_err(),
            CorsConfigError::InvalidPattern { .. }
        ));
    }

    #[test]
    fn test_custom_validator() {
        let cors = CorsPolicy::builder()
            .origin_validator(|o: &str| o.ends_with(".internal"))
            .build()
            .unwrap();
        assert!(cors.is_origin_allowed("http://svc.internal"));
        assert!(!cors.is_origin_allowed("http://svc.external"));
    }
}
