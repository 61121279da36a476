//! Path resolution against a multi-level registry
//!
//! The registry below mirrors a small API:
//!
//! ```text
//! /                 default GET()
//! /users            default GET(), group Admins GET()
//! /users/posts      default GET(id), group Drafts GET(id=null)
//! /static           default GET(*path)
//! ```

use http::Method;
use nsrouter::registry::{HandlerDescriptor, HandlerGroupBuilder, HandlerRegistry};
use nsrouter::transport::split_path;
use nsrouter::{BoundArguments, ErrorKind, PathResolver, Reply};
use serde_json::Value;

fn handler(name: &str) -> HandlerDescriptor {
    HandlerDescriptor::new(Method::GET, |_: BoundArguments| Ok(Reply::new(Value::Null))).named(name)
}

fn registry() -> HandlerRegistry {
    HandlerRegistry::builder()
        .group("/", HandlerGroupBuilder::fallback().handler(handler("index")))
        .group("/users", HandlerGroupBuilder::fallback().handler(handler("list_users")))
        .group("/users", HandlerGroupBuilder::new("Admins").handler(handler("list_admins")))
        .group(
            "/users/posts",
            HandlerGroupBuilder::fallback().handler(handler("show_post").required(["id"])),
        )
        .group(
            "/users/posts",
            HandlerGroupBuilder::new("drafts")
                .handler(handler("list_drafts").optional("id", Value::Null)),
        )
        .group(
            "/static",
            HandlerGroupBuilder::fallback().handler(handler("serve").rest("path")),
        )
        .build()
        .unwrap()
}

fn resolve(reg: &HandlerRegistry, path: &str) -> Result<(String, String, Vec<String>), ErrorKind> {
    let segments = split_path(path);
    PathResolver::for_registry(reg)
        .resolve(&Method::GET, &segments)
        .map(|t| {
            (
                t.namespace_path.to_string(),
                t.descriptor.name().unwrap_or_default().to_string(),
                t.remaining,
            )
        })
        .map_err(|e| e.kind())
}

#[test]
fn test_root_and_fallbacks() {
    let reg = registry();
    assert_eq!(resolve(&reg, "/").unwrap(), ("/".into(), "index".into(), vec![]));
    assert_eq!(resolve(&reg, "").unwrap().1, "index");
    assert_eq!(resolve(&reg, "/users").unwrap().1, "list_users");
    assert_eq!(
        resolve(&reg, "/users/posts/42").unwrap(),
        ("/users/posts".into(), "show_post".into(), vec!["42".to_string()])
    );
}

#[test]
fn test_named_groups_case_insensitive() {
    let reg = registry();
    assert_eq!(resolve(&reg, "/users/admins").unwrap().1, "list_admins");
    assert_eq!(resolve(&reg, "/Users/ADMINS").unwrap().1, "list_admins");
    assert_eq!(
        resolve(&reg, "/users/posts/drafts/7").unwrap(),
        ("/users/posts".into(), "list_drafts".into(), vec!["7".to_string()])
    );
}

#[test]
fn test_no_climb_back_after_descent() {
    let reg = registry();
    // `admins` lives at /users; once /users/posts is entered it is just an argument
    assert_eq!(
        resolve(&reg, "/users/posts/admins").unwrap(),
        ("/users/posts".into(), "show_post".into(), vec!["admins".to_string()])
    );
}

#[test]
fn test_unknown_segment_goes_to_fallback() {
    let reg = registry();
    assert_eq!(
        resolve(&reg, "/nope/deeper").unwrap(),
        ("/".into(), "index".into(), vec!["nope".to_string(), "deeper".to_string()])
    );
}

#[test]
fn test_rest_segments_preserved() {
    let reg = registry();
    let (_, name, remaining) = resolve(&reg, "/static/css/site%20main.css").unwrap();
    assert_eq!(name, "serve");
    assert_eq!(remaining, vec!["css", "site main.css"]);
}

#[test]
fn test_method_not_allowed() {
    let reg = registry();
    let err = PathResolver::for_registry(&reg)
        .resolve(&Method::POST, &split_path("/users"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MethodNotAllowed);
    assert_eq!(err.status(), 405);
}

#[test]
fn test_missing_fallback() {
    let reg = HandlerRegistry::builder()
        .group("/api", HandlerGroupBuilder::new("items").handler(handler("items")))
        .build()
        .unwrap();
    assert_eq!(resolve(&reg, "/api/items").unwrap().1, "items");
    assert_eq!(resolve(&reg, "/api").unwrap_err(), ErrorKind::NotFound);
    assert_eq!(resolve(&reg, "/").unwrap_err(), ErrorKind::NotFound);
}
