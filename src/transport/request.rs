use http::Method;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use super::HeaderVec;
use crate::ids::RequestId;

/// String-keyed parameter map (query or body).
///
/// Ordered so that binding and error reporting are deterministic.
pub type Params = BTreeMap<String, Value>;

/// Immutable request as seen by the engine.
///
/// Built by the transport through [`Request::builder`]. Method is normalised
/// to uppercase, the path is already split into non-empty, percent-decoded
/// segments, and both parameter maps are decoded key/value maps.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Correlation id (from `x-request-id` or freshly generated)
    pub request_id: RequestId,
    /// HTTP method, uppercase
    pub method: Method,
    /// Path without the query string
    pub path: String,
    /// Non-empty path segments in order
    pub segments: Vec<String>,
    /// Query string parameters; repeated keys hold a JSON array
    pub query: Params,
    /// Decoded body parameters
    pub body: Params,
    /// Headers with lower-cased names
    pub headers: HeaderVec,
}

impl Request {
    /// Start building a request from a method and a request target
    /// (`/path?query`).
    pub fn builder(method: &str, target: &str) -> RequestBuilder {
        RequestBuilder::new(method, target)
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&Value> {
        self.query.get(name)
    }

    /// Get a body parameter by name
    #[inline]
    #[must_use]
    pub fn get_body_param(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }
}

/// Problems turning transport input into a [`Request`]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestBuildError {
    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),
    #[error("request body must be a JSON object, got {0}")]
    BodyNotObject(String),
}

/// Builder for [`Request`].
#[derive(Debug)]
pub struct RequestBuilder {
    method: String,
    target: String,
    headers: HeaderVec,
    body: Params,
    error: Option<RequestBuildError>,
}

impl RequestBuilder {
    fn new(method: &str, target: &str) -> Self {
        Self {
            method: method.to_string(),
            target: target.to_string(),
            headers: HeaderVec::new(),
            body: Params::new(),
            error: None,
        }
    }

    /// Add a header. Names are stored lower-cased.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .push((Arc::from(name.to_ascii_lowercase()), value.to_string()));
        self
    }

    /// Shorthand for the `Accept` header
    pub fn accept(self, value: &str) -> Self {
        self.header("accept", value)
    }

    /// Add one body parameter
    pub fn body_param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.body.insert(name.to_string(), value.into());
        self
    }

    /// Use the members of a decoded JSON object as body parameters
    pub fn json_body(mut self, body: Value) -> Self {
        match body {
            Value::Object(map) => self.body.extend(map),
            Value::Null => {}
            other => {
                self.error = Some(RequestBuildError::BodyNotObject(json_type_name(&other)));
            }
        }
        self
    }

    /// Decode a form-urlencoded body into body parameters
    pub fn form_body(mut self, body: &str) -> Self {
        for (k, v) in decode_pairs(body) {
            insert_repeated(&mut self.body, k, v);
        }
        self
    }

    pub fn build(self) -> Result<Request, RequestBuildError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let method = Method::from_bytes(self.method.to_ascii_uppercase().as_bytes())
            .map_err(|_| RequestBuildError::InvalidMethod(self.method.clone()))?;

        let (path, query_str) = match self.target.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (self.target.as_str(), None),
        };
        let segments = split_path(path);
        let query = query_str.map(parse_query_params).unwrap_or_default();

        let request_id = RequestId::from_header_or_new(
            self.headers
                .iter()
                .find(|(k, _)| k.as_ref() == "x-request-id")
                .map(|(_, v)| v.as_str()),
        );

        debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            segment_count = segments.len(),
            query_count = query.len(),
            body_count = self.body.len(),
            "Request built"
        );

        Ok(Request {
            request_id,
            method,
            path: path.to_string(),
            segments,
            query,
            body: self.body,
            headers: self.headers,
        })
    }
}

/// Split a path on `/`, dropping empty segments and percent-decoding the rest.
///
/// A segment that is not valid UTF-8 once decoded is kept verbatim.
#[must_use]
pub fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            urlencoding::decode(s)
                .map(|c| c.into_owned())
                .unwrap_or_else(|_| s.to_string())
        })
        .collect()
}

/// Parse a query string (without the leading `?`).
///
/// Keys that appear more than once collect their values into a JSON array in
/// order of appearance.
#[must_use]
pub fn parse_query_params(query: &str) -> Params {
    let mut params = Params::new();
    for (k, v) in decode_pairs(query) {
        insert_repeated(&mut params, k, v);
    }
    params
}

fn decode_pairs(input: &str) -> impl Iterator<Item = (String, String)> + '_ {
    url::form_urlencoded::parse(input.as_bytes()).map(|(k, v)| (k.into_owned(), v.into_owned()))
}

fn insert_repeated(params: &mut Params, key: String, value: String) {
    match params.get_mut(&key) {
        Some(Value::Array(items)) => items.push(Value::String(value)),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, Value::String(value)]);
        }
        None => {
            params.insert(key, Value::String(value));
        }
    }
}

fn json_type_name(value: &Value) -> String {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_query_params() {
        let q = parse_query_params("x=1&y=2");
        assert_eq!(q.get("x"), Some(&json!("1")));
        assert_eq!(q.get("y"), Some(&json!("2")));
    }

    #[test]
    fn test_repeated_query_keys_become_array() {
        let q = parse_query_params("tag=a&tag=b&tag=c");
        assert_eq!(q.get("tag"), Some(&json!(["a", "b", "c"])));
    }

    #[test]
    fn test_split_path_drops_empty_segments() {
        assert_eq!(split_path("//foo///bar/"), vec!["foo", "bar"]);
        assert!(split_path("/").is_empty());
        assert!(split_path("").is_empty());
    }

    #[test]
    fn test_split_path_decodes_segments() {
        assert_eq!(split_path("/a%20b/c%2Fd"), vec!["a b", "c/d"]);
    }

    #[test]
    fn test_method_is_normalised() {
        let req = Request::builder("get", "/foo").build().unwrap();
        assert_eq!(req.method, Method::GET);
        let req = Request::builder("PoSt", "/foo").build().unwrap();
        assert_eq!(req.method, Method::POST);
    }

    #[test]
    fn test_invalid_method_rejected() {
        let err = Request::builder("GE T", "/").build().unwrap_err();
        assert!(matches!(err, RequestBuildError::InvalidMethod(_)));
    }

    #[test]
    fn test_target_split_into_path_and_query() {
        let req = Request::builder("GET", "/foo/bar/che?baz=foo").build().unwrap();
        assert_eq!(req.path, "/foo/bar/che");
        assert_eq!(req.segments, vec!["foo", "bar", "che"]);
        assert_eq!(req.get_query_param("baz"), Some(&json!("foo")));
    }

    #[test]
    fn test_json_body_must_be_object() {
        let err = Request::builder("POST", "/")
            .json_body(json!([1, 2]))
            .build()
            .unwrap_err();
        assert_eq!(err, RequestBuildError::BodyNotObject("array".into()));
    }

    #[test]
    fn test_form_body() {
        let req = Request::builder("POST", "/")
            .form_body("param1=POST1&param3=val3")
            .build()
            .unwrap();
        assert_eq!(req.get_body_param("param1"), Some(&json!("POST1")));
        assert_eq!(req.get_body_param("param3"), Some(&json!("val3")));
    }

    #[test]
    fn test_headers_case_insensitive() {
        let req = Request::builder("GET", "/")
            .header("Accept", "*/*;version=v1")
            .build()
            .unwrap();
        assert_eq!(req.get_header("ACCEPT"), Some("*/*;version=v1"));
    }

    #[test]
    fn test_request_id_from_header() {
        let id = RequestId::new();
        let req = Request::builder("GET", "/")
            .header("X-Request-Id", &id.to_string())
            .build()
            .unwrap();
        assert_eq!(req.request_id, id);
    }
}
