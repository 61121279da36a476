//! CORS behaviour through the dispatcher: preflight short-circuit, response
//! decoration and the boundary with groups that are not CORS-enabled.

mod common;

use common::*;
use nsrouter::config::RouterConfig;
use nsrouter::{CorsPolicy, Dispatcher, Request};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn options(target: &str, headers: &[(&str, &str)]) -> Request {
    headers
        .iter()
        .fold(Request::builder("OPTIONS", target), |b, (k, v)| b.header(k, v))
        .build()
        .unwrap()
}

fn restricted(calls: Arc<AtomicUsize>) -> Dispatcher {
    let policy = CorsPolicy::builder()
        .allowed_origins(&["https://app.example.com"])
        .allowed_headers(&["Content-Type", "Authorization"])
        .allow_credentials(true)
        .expose_headers(&["X-Total-Count"])
        .max_age(600)
        .build()
        .unwrap();
    dispatcher(cors_registry(calls)).with_cors(policy)
}

#[test]
fn test_preflight_short_circuits() {
    let calls = Arc::new(AtomicUsize::new(0));
    let d = dispatcher(cors_registry(Arc::clone(&calls)));

    let resp = d.dispatch(&options("/api", &[("Origin", "https://a.example")]));
    assert_eq!(resp.status, 204);
    assert!(resp.body.is_null());
    assert_eq!(resp.get_header("allow"), Some("GET, POST"));
    assert_eq!(resp.get_header("access-control-allow-methods"), Some("GET, POST"));
    assert_eq!(resp.get_header("access-control-allow-origin"), Some("*"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_preflight_ignores_path_arity() {
    let calls = Arc::new(AtomicUsize::new(0));
    let d = dispatcher(cors_registry(Arc::clone(&calls)));
    let resp = d.dispatch(&options("/api/too/many/segments", &[]));
    assert_eq!(resp.status, 204);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_options_on_plain_group_is_method_not_allowed() {
    let d = dispatcher(cors_registry(Arc::new(AtomicUsize::new(0))));
    let resp = d.dispatch(&options("/plain", &[("Origin", "https://a.example")]));
    assert_eq!(resp.status, 405);
    assert_eq!(resp.get_header("allow"), Some("GET"));
    assert_eq!(resp.get_header("access-control-allow-origin"), None);
}

#[test]
fn test_plain_group_never_decorated() {
    let d = dispatcher(cors_registry(Arc::new(AtomicUsize::new(0))));
    let req = Request::builder("GET", "/plain")
        .header("Origin", "https://a.example")
        .build()
        .unwrap();
    let resp = d.dispatch(&req);
    assert_eq!(resp.status, 200);
    assert_eq!(resp.get_header("access-control-allow-origin"), None);
    assert_eq!(resp.get_header("vary"), None);
}

#[test]
fn test_restricted_preflight() {
    let calls = Arc::new(AtomicUsize::new(0));
    let d = restricted(Arc::clone(&calls));

    let resp = d.dispatch(&options(
        "/api",
        &[
            ("Origin", "https://app.example.com"),
            ("Access-Control-Request-Method", "POST"),
            ("Access-Control-Request-Headers", "content-type"),
        ],
    ));
    assert_eq!(resp.status, 204);
    assert_eq!(
        resp.get_header("access-control-allow-origin"),
        Some("https://app.example.com")
    );
    assert_eq!(
        resp.get_header("access-control-allow-headers"),
        Some("Content-Type, Authorization")
    );
    assert_eq!(resp.get_header("access-control-allow-credentials"), Some("true"));
    assert_eq!(resp.get_header("access-control-max-age"), Some("600"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_restricted_preflight_rejections() {
    let d = restricted(Arc::new(AtomicUsize::new(0)));

    let bad_origin = d.dispatch(&options("/api", &[("Origin", "https://evil.example")]));
    assert_eq!(bad_origin.status, 403);

    let bad_method = d.dispatch(&options(
        "/api",
        &[
            ("Origin", "https://app.example.com"),
            ("Access-Control-Request-Method", "DELETE"),
        ],
    ));
    assert_eq!(bad_method.status, 403);

    let bad_header = d.dispatch(&options(
        "/api",
        &[
            ("Origin", "https://app.example.com"),
            ("Access-Control-Request-Headers", "X-Secret"),
        ],
    ));
    assert_eq!(bad_header.status, 403);
}

#[test]
fn test_actual_request_decorated() {
    let calls = Arc::new(AtomicUsize::new(0));
    let d = restricted(Arc::clone(&calls));

    let req = Request::builder("POST", "/api")
        .header("Origin", "https://app.example.com")
        .build()
        .unwrap();
    let resp = d.dispatch(&req);
    assert_eq!(resp.status, 200);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        resp.get_header("access-control-allow-origin"),
        Some("https://app.example.com")
    );
    assert_eq!(resp.get_header("access-control-expose-headers"), Some("X-Total-Count"));
    assert_eq!(resp.get_header("vary"), Some("Origin"));

    let req = Request::builder("GET", "/api")
        .header("Origin", "https://evil.example")
        .build()
        .unwrap();
    let resp = d.dispatch(&req);
    assert_eq!(resp.status, 200);
    assert_eq!(resp.get_header("access-control-allow-origin"), None);
}

#[test]
fn test_errors_on_cors_group_are_decorated() {
    let d = restricted(Arc::new(AtomicUsize::new(0)));
    let req = Request::builder("DELETE", "/api")
        .header("Origin", "https://app.example.com")
        .build()
        .unwrap();
    let resp = d.dispatch(&req);
    assert_eq!(resp.status, 405);
    assert_eq!(
        resp.get_header("access-control-allow-origin"),
        Some("https://app.example.com")
    );
}

#[test]
fn test_policy_from_config() {
    let config = RouterConfig::from_yaml_str(
        r#"
trace_requests: false
cors:
  allowed_origins: []
  origin_patterns: ['^https://[a-z]+\.example\.com$']
"#,
    )
    .unwrap();
    let d = Dispatcher::from_config(
        Arc::new(cors_registry(Arc::new(AtomicUsize::new(0)))),
        &config,
    )
    .unwrap();
    let ok = d.dispatch(&options("/api", &[("Origin", "https://shop.example.com")]));
    assert_eq!(ok.status, 204);
    let denied = d.dispatch(&options("/api", &[("Origin", "https://example.org")]));
    assert_eq!(denied.status, 403);
}
