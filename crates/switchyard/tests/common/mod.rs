#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use switchyard::{Middleware, Next, Request, Response};

/// Shared, ordered log of which links of a chain ran.
pub type Calls = Arc<Mutex<Vec<String>>>;

pub fn calls() -> Calls {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn recorded(calls: &Calls) -> Vec<String> {
    calls.lock().unwrap().clone()
}

/// A middleware that records `name` and continues.
pub fn pass(calls: &Calls, name: &'static str) -> impl Middleware + 'static {
    let calls = Arc::clone(calls);
    move |req: Request, next: Next| {
        calls.lock().unwrap().push(name.to_string());
        next.run(req)
    }
}

/// A middleware that records `name` and stops the chain.
pub fn halt(calls: &Calls, name: &'static str) -> impl Middleware + 'static {
    let calls = Arc::clone(calls);
    move |_req: Request, _next: Next| {
        calls.lock().unwrap().push(name.to_string());
        async { Response::empty(403) }
    }
}

/// An endpoint that records `name` and answers with it as the body.
pub fn endpoint(
    calls: &Calls,
    name: &'static str,
) -> impl Fn(Request) -> std::future::Ready<Response> + Send + Sync + 'static {
    let calls = Arc::clone(calls);
    move |_req: Request| {
        calls.lock().unwrap().push(name.to_string());
        std::future::ready(Response::text(name))
    }
}

/// An endpoint answering with the bound parameters as `name=value` pairs.
pub async fn echo_params(req: Request) -> Response {
    let pairs: Vec<String> = req.params.iter().map(|(k, v)| format!("{k}={v}")).collect();
    Response::text(pairs.join("&"))
}

pub async fn empty_handler(_req: Request) -> Response {
    Response::ok()
}
