#![allow(dead_code)]

use http::Method;
use nsrouter::echo::echo_handler;
use nsrouter::registry::{HandlerDescriptor, HandlerGroupBuilder, HandlerRegistry};
use nsrouter::{BoundArguments, Dispatcher, Reply, Request, Response};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Root fallback group answering `GET /` with `"boom"`
pub fn boom_registry() -> HandlerRegistry {
    HandlerRegistry::builder()
        .group(
            "/",
            HandlerGroupBuilder::fallback().handler(HandlerDescriptor::new(
                Method::GET,
                |_: BoundArguments| Ok(Reply::from("boom")),
            )),
        )
        .build()
        .unwrap()
}

/// Group `Foo` at the root answering `GET /foo` with `"bang"`
pub fn foo_registry() -> HandlerRegistry {
    HandlerRegistry::builder()
        .group(
            "/",
            HandlerGroupBuilder::new("Foo").handler(HandlerDescriptor::new(
                Method::GET,
                |_: BoundArguments| Ok(Reply::from("bang")),
            )),
        )
        .build()
        .unwrap()
}

/// Group `Bar` under `/foo` with echoing `GET(one, two=null)` and `POST(one, **kwargs)`.
pub fn bar_registry(variadic: bool) -> HandlerRegistry {
    let mut get = HandlerDescriptor::new(Method::GET, echo_handler)
        .named("bar_get")
        .required(["one"])
        .optional("two", Value::Null);
    if variadic {
        get = get.variadic_keyword();
    }
    let post = HandlerDescriptor::new(Method::POST, echo_handler)
        .named("bar_post")
        .required(["one"])
        .variadic_keyword();
    HandlerRegistry::builder()
        .group("/foo", HandlerGroupBuilder::new("Bar").handler(get).handler(post))
        .build()
        .unwrap()
}

/// CORS-enabled group `Api` at the root with `GET` and `POST`, counting invocations.
pub fn cors_registry(calls: Arc<AtomicUsize>) -> HandlerRegistry {
    let get_calls = Arc::clone(&calls);
    let post_calls = calls;
    HandlerRegistry::builder()
        .group(
            "/",
            HandlerGroupBuilder::new("Api")
                .cors(true)
                .handler(HandlerDescriptor::new(Method::POST, move |_: BoundArguments| {
                    post_calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Reply::from("posted"))
                }))
                .handler(HandlerDescriptor::new(Method::GET, move |_: BoundArguments| {
                    get_calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Reply::from("got"))
                })),
        )
        .group(
            "/",
            HandlerGroupBuilder::new("Plain").handler(HandlerDescriptor::new(
                Method::GET,
                |_: BoundArguments| Ok(Reply::from("plain")),
            )),
        )
        .build()
        .unwrap()
}

pub fn dispatcher(registry: HandlerRegistry) -> Dispatcher {
    Dispatcher::new(Arc::new(registry))
}

pub fn get(dispatcher: &Dispatcher, target: &str) -> Response {
    dispatcher.dispatch(&Request::builder("GET", target).build().unwrap())
}

/// `kind` field of an error body
pub fn error_kind(resp: &Response) -> &str {
    resp.body["kind"].as_str().unwrap_or_default()
}

pub fn echo_body(args: Vec<Value>, kwargs: Value) -> Value {
    json!({ "args": args, "kwargs": kwargs })
}
