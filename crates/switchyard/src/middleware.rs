//! Middleware chains.
//!
//! A middleware receives the request together with a [`Next`] handle to the
//! rest of the chain. Running `next` proceeds to the following link; returning
//! without running it short-circuits, so neither later middlewares nor the
//! endpoint execute. Work placed before or after `next.run(..).await` runs
//! before or after the rest of the chain.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt};
use tracing::info;

use crate::request::{Method, Request};
use crate::response::Response;

/// A type-erased request handler: an endpoint, or a whole composed chain.
pub type Handler = Arc<dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync>;

/// Trait for middleware wrapping the rest of a handler chain.
///
/// Any `Fn(Request, Next) -> impl Future<Output = Response>` closure is a
/// middleware.
///
/// # Example
///
/// ```ignore
/// struct Timing;
///
/// impl Middleware for Timing {
///     fn handle<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response> {
///         Box::pin(async move {
///             let started = Instant::now();
///             let res = next.run(req).await;
///             res.header("X-Elapsed-Us", started.elapsed().as_micros().to_string())
///         })
///     }
/// }
/// ```
pub trait Middleware: Send + Sync {
    /// Processes `req`, usually by running `next` at most once.
    fn handle<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response>;
}

impl<F, Fut> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn handle<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response> {
        self(req, next).boxed()
    }
}

/// The remainder of a middleware chain.
///
/// `run` consumes the handle, so a middleware can continue at most once.
/// The handle cannot be cloned:
///
/// ```compile_fail
/// use switchyard::{Next, Request, Response};
///
/// async fn twice(req: Request, next: Next) -> Response {
///     let again = next.clone();
///     next.run(req.clone()).await;
///     again.run(req).await
/// }
/// ```
pub struct Next {
    chain: Handler,
}

impl Next {
    /// Runs the rest of the chain.
    pub fn run(self, req: Request) -> BoxFuture<'static, Response> {
        (self.chain)(req)
    }
}

/// Erases an endpoint function into a [`Handler`].
pub(crate) fn endpoint<F, Fut>(handler: F) -> Handler
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |req| handler(req).boxed())
}

/// Folds `middlewares` around `endpoint`, outermost first, into one handler.
pub(crate) fn compose(middlewares: &[Arc<dyn Middleware>], endpoint: Handler) -> Handler {
    middlewares.iter().rev().fold(endpoint, |inner, mw| {
        let mw = Arc::clone(mw);
        let link: Handler = Arc::new(move |req: Request| {
            let mw = Arc::clone(&mw);
            let next = Next {
                chain: Arc::clone(&inner),
            };
            async move { mw.handle(req, next).await }.boxed()
        });
        link
    })
}

/// Middleware that redirects unauthenticated requests to a login page.
///
/// A request counts as authenticated when it carries an `Authorization`
/// header or a `session=` cookie.
pub struct AuthMiddleware {
    /// Path prefixes that skip the check.
    pub exclude: Vec<String>,
    /// The login redirect URL.
    pub login_url: String,
}

impl AuthMiddleware {
    /// Creates new auth middleware.
    pub fn new(login_url: impl Into<String>) -> Self {
        Self {
            exclude: Vec::new(),
            login_url: login_url.into(),
        }
    }

    /// Adds path prefixes to exclude from authentication.
    #[must_use]
    pub fn exclude(mut self, prefixes: &[&str]) -> Self {
        self.exclude
            .extend(prefixes.iter().map(|s| (*s).to_string()));
        self
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.exclude.iter().any(|p| path.starts_with(p.as_str()))
    }

    fn is_authenticated(req: &Request) -> bool {
        req.header("Authorization").is_some()
            || req
                .header("Cookie")
                .is_some_and(|c| c.contains("session="))
    }
}

impl Middleware for AuthMiddleware {
    fn handle<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response> {
        async move {
            if self.is_excluded(&req.path) || Self::is_authenticated(&req) {
                next.run(req).await
            } else {
                Response::redirect(self.login_url.as_str())
            }
        }
        .boxed()
    }
}

/// Middleware that logs each request and its response through `tracing`.
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn handle<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response> {
        async move {
            let method = req.method;
            let path = req.path.clone();
            let started = Instant::now();
            info!(%method, %path, "-->");
            let res = next.run(req).await;
            info!(%method, %path, status = res.status, elapsed = ?started.elapsed(), "<--");
            res
        }
        .boxed()
    }
}

/// Middleware that answers CORS preflights and tags responses with the
/// allowed origins.
pub struct CorsMiddleware {
    /// Allowed origins.
    pub allowed_origins: Vec<String>,
    /// Allowed methods.
    pub allowed_methods: Vec<Method>,
    /// Allowed headers.
    pub allowed_headers: Vec<String>,
}

impl CorsMiddleware {
    /// Creates CORS middleware that allows all origins.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec![
                Method::Get,
                Method::Head,
                Method::Post,
                Method::Put,
                Method::Delete,
                Method::Patch,
                Method::Options,
            ],
            allowed_headers: vec!["*".to_string()],
        }
    }

    /// Creates CORS middleware with specific origins.
    #[must_use]
    pub fn new(origins: &[&str]) -> Self {
        Self {
            allowed_origins: origins.iter().map(|s| (*s).to_string()).collect(),
            allowed_methods: vec![Method::Get, Method::Post, Method::Put, Method::Delete],
            allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
        }
    }

    fn preflight(&self) -> Response {
        let methods: Vec<&str> = self.allowed_methods.iter().map(Method::as_str).collect();
        Response::empty(204)
            .header("Access-Control-Allow-Origin", self.allowed_origins.join(", "))
            .header("Access-Control-Allow-Methods", methods.join(", "))
            .header("Access-Control-Allow-Headers", self.allowed_headers.join(", "))
            .header("Access-Control-Max-Age", "86400")
    }
}

impl Middleware for CorsMiddleware {
    fn handle<'a>(&'a self, req: Request, next: Next) -> BoxFuture<'a, Response> {
        async move {
            if req.method == Method::Options {
                return self.preflight();
            }
            next.run(req)
                .await
                .header("Access-Control-Allow-Origin", self.allowed_origins.join(", "))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder(calls: &Arc<Mutex<Vec<String>>>, name: &'static str) -> Arc<dyn Middleware> {
        let calls = Arc::clone(calls);
        Arc::new(move |req: Request, next: Next| {
            calls.lock().unwrap().push(name.to_string());
            next.run(req)
        })
    }

    fn ok_endpoint() -> Handler {
        endpoint(|_req| async { Response::text("endpoint") })
    }

    #[tokio::test]
    async fn test_compose_runs_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let chain = compose(
            &[recorder(&calls, "m1"), recorder(&calls, "m2")],
            ok_endpoint(),
        );

        let res = chain(Request::get("/")).await;
        assert_eq!(res.body_str(), Some("endpoint"));
        assert_eq!(*calls.lock().unwrap(), ["m1", "m2"]);
    }

    #[tokio::test]
    async fn test_compose_short_circuit() {
        let blocker: Arc<dyn Middleware> =
            Arc::new(|_req: Request, _next: Next| async { Response::empty(403) });
        let calls = Arc::new(Mutex::new(Vec::new()));
        let chain = compose(&[blocker, recorder(&calls, "never")], ok_endpoint());

        let res = chain(Request::get("/")).await;
        assert_eq!(res.status, 403);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_work_after_next() {
        let tagger: Arc<dyn Middleware> = Arc::new(|req: Request, next: Next| async move {
            next.run(req).await.header("X-After", "1")
        });
        let chain = compose(&[tagger], ok_endpoint());

        let res = chain(Request::get("/")).await;
        assert_eq!(res.headers.get("X-After").map(String::as_str), Some("1"));
    }

    #[tokio::test]
    async fn test_auth_middleware() {
        let auth: Arc<dyn Middleware> =
            Arc::new(AuthMiddleware::new("/login").exclude(&["/public", "/api/health"]));
        let chain = compose(&[auth], ok_endpoint());

        let res = chain(Request::get("/admin")).await;
        assert_eq!(res.status, 302);
        assert_eq!(res.headers.get("Location").map(String::as_str), Some("/login"));

        let res = chain(Request::get("/public/file.txt")).await;
        assert_eq!(res.status, 200);

        let res = chain(Request::get("/admin").with_header("Cookie", "session=abc")).await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn test_cors_middleware() {
        let cors: Arc<dyn Middleware> = Arc::new(CorsMiddleware::new(&["https://example.com"]));
        let chain = compose(&[cors], ok_endpoint());

        let preflight = chain(Request::new(Method::Options, "/items")).await;
        assert_eq!(preflight.status, 204);
        assert_eq!(
            preflight
                .headers
                .get("Access-Control-Allow-Methods")
                .map(String::as_str),
            Some("GET, POST, PUT, DELETE")
        );
        assert!(preflight.body.is_empty());

        let res = chain(Request::get("/items")).await;
        assert_eq!(res.body_str(), Some("endpoint"));
        assert_eq!(
            res.headers
                .get("Access-Control-Allow-Origin")
                .map(String::as_str),
            Some("https://example.com")
        );
    }

    #[tokio::test]
    async fn test_logging_middleware_is_transparent() {
        let logging: Arc<dyn Middleware> = Arc::new(LoggingMiddleware);
        let chain = compose(&[logging], ok_endpoint());
        let res = chain(Request::get("/")).await;
        assert_eq!(res.body_str(), Some("endpoint"));
    }
}
