//! Main router implementation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, trace, warn};

use crate::config::RouterConfig;
use crate::error::Result;
use crate::middleware::{compose, endpoint, Handler, Middleware};
use crate::node::{Endpoint, Node};
use crate::path;
use crate::request::{Method, PathParams, Request};
use crate::response::Response;

/// A successful lookup: the composed chain and the captured parameters.
pub struct RouteMatch {
    /// Group middlewares, route middlewares and endpoint, composed.
    pub handler: Handler,
    /// Wildcard captures in left-to-right path order.
    pub params: PathParams,
}

/// A registered route, as reported by [`Router::routes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    /// HTTP method.
    pub method: Method,
    /// Normalized path, wildcards written as `:name`.
    pub path: String,
    /// Number of middlewares attached to this route alone.
    pub middlewares: usize,
}

/// The main router for handling HTTP requests.
///
/// Routes are registered through the [`Routable`] methods while the router
/// is exclusively owned. Once serving starts the router is only read, so it
/// can be shared across workers behind an `Arc`. To change routes at runtime,
/// build a new router and swap the `Arc`.
pub struct Router {
    /// One trie per method, created on first registration.
    roots: HashMap<Method, Node>,
    /// Router-level middlewares, outermost of every chain.
    middlewares: Vec<Arc<dyn Middleware>>,
    not_found: Handler,
    config: RouterConfig,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    /// Creates a new empty router with the given configuration.
    #[must_use]
    pub fn with_config(config: RouterConfig) -> Self {
        let status = config.not_found_status;
        Self {
            roots: HashMap::new(),
            middlewares: Vec::new(),
            not_found: endpoint(move |_req| async move { Response::empty(status) }),
            config,
        }
    }

    /// Replaces the handler invoked when no route matches.
    pub fn set_not_found<F, Fut>(&mut self, handler: F)
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.not_found = endpoint(handler);
    }

    /// Adds a middleware to every route registered afterwards, whether
    /// directly or through a group created afterwards. It runs before any
    /// group middleware.
    pub fn middleware<M: Middleware + 'static>(&mut self, mw: M) -> &mut Self {
        self.middlewares.push(Arc::new(mw));
        self
    }

    /// Returns the router configuration.
    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    fn insert(
        &mut self,
        method: Method,
        path: &str,
        inherited: &[Arc<dyn Middleware>],
        middlewares: Vec<Arc<dyn Middleware>>,
        handler: Handler,
    ) -> Result<()> {
        let mut chain: Vec<Arc<dyn Middleware>> = inherited.to_vec();
        chain.extend(middlewares.iter().cloned());
        let endpoint = Endpoint {
            chain: compose(&chain, handler),
            middlewares,
        };

        let inserted = match self.roots.get_mut(&method) {
            Some(root) => root.insert(method, path, endpoint),
            None => {
                let mut root = Node::default();
                let inserted = root.insert(method, path, endpoint);
                if inserted.is_ok() {
                    self.roots.insert(method, root);
                }
                inserted
            }
        };

        match inserted {
            Ok(()) => {
                debug!(%method, path, middlewares = chain.len(), "route registered");
                Ok(())
            }
            Err(err) => {
                warn!(%method, path, error = %err, "route rejected");
                Err(err)
            }
        }
    }

    /// Finds the route for `method` and `path` without invoking it.
    #[must_use]
    pub fn lookup(&self, method: Method, path: &str) -> Option<RouteMatch> {
        let root = self.roots.get(&method)?;

        let mut tokens = Vec::with_capacity(8);
        path::split(path, &mut tokens);
        let mut values = Vec::with_capacity(tokens.len());
        let node = root.find(&tokens, &mut values)?;
        let endpoint = node.endpoint()?;

        Some(RouteMatch {
            handler: Arc::clone(&endpoint.chain),
            params: node.names().iter().map(String::as_str).zip(values).collect(),
        })
    }

    /// Handles an incoming request.
    ///
    /// Matching and parameter binding happen before this returns; the
    /// returned future only runs the chain (or the not-found handler).
    ///
    /// Only the verbs of [`Method`] reach the router. A request with any
    /// other method (`TRACE`, `CONNECT`, ...) cannot be expressed as a
    /// [`Request`] and has to be answered by the transport.
    pub fn handle(&self, mut request: Request) -> BoxFuture<'static, Response> {
        if self.config.log_dispatch {
            debug!(method = %request.method, path = %request.path, "dispatch");
        }

        match self.lookup(request.method, &request.path) {
            Some(found) => {
                if request.params.is_empty() {
                    request.params = found.params;
                } else {
                    for (name, value) in found.params.iter() {
                        request.set_param(name, value);
                    }
                }
                (found.handler)(request)
            }
            None => {
                trace!(method = %request.method, path = %request.path, "no route matched");
                (self.not_found)(request)
            }
        }
    }

    /// Lists the registered routes, ordered by method then path.
    #[must_use]
    pub fn routes(&self) -> Vec<RouteInfo> {
        let mut routes = Vec::new();
        for (&method, root) in &self.roots {
            let mut found = Vec::new();
            root.collect_routes("", &mut found);
            routes.extend(found.into_iter().map(|(path, middlewares)| RouteInfo {
                method,
                path,
                middlewares,
            }));
        }
        routes.sort_by(|a, b| (a.method, &a.path).cmp(&(b.method, &b.path)));
        routes
    }
}

/// A registration view over a [`Router`]: an accumulated path prefix and the
/// middlewares every route registered through it will run.
///
/// A group holds the router mutably, so a parent view cannot be changed while
/// a child exists. Children take a copy of the parent's middlewares when
/// they are created.
pub struct Group<'r> {
    router: &'r mut Router,
    prefix: String,
    /// Middlewares inherited from enclosing groups plus this group's own.
    inherited: Vec<Arc<dyn Middleware>>,
    /// Middlewares added by [`Routable::with`], applied to routes only.
    pending: Vec<Arc<dyn Middleware>>,
}

impl Group<'_> {
    /// Returns the accumulated path prefix.
    #[must_use]
    pub fn prefix_path(&self) -> &str {
        &self.prefix
    }

    /// Adds a middleware for every route registered through this group and
    /// any group created from it afterwards.
    pub fn middleware<M: Middleware + 'static>(&mut self, mw: M) -> &mut Self {
        self.inherited.push(Arc::new(mw));
        self
    }
}

/// The registration surface shared by [`Router`] and [`Group`].
///
/// Every method returning a [`Group`] borrows `self` for as long as the
/// group lives.
pub trait Routable {
    /// Returns a view equivalent to `self`.
    fn scope(&mut self) -> Group<'_>;

    /// Registers a route for any method.
    fn route<F, Fut>(&mut self, method: Method, path: &str, handler: F) -> Result<()>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let group = self.scope();
        let full = path::join(&group.prefix, path);
        group
            .router
            .insert(method, &full, &group.inherited, group.pending, endpoint(handler))
    }

    /// Adds a GET route.
    fn get<F, Fut>(&mut self, path: &str, handler: F) -> Result<()>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Get, path, handler)
    }

    /// Adds a POST route.
    fn post<F, Fut>(&mut self, path: &str, handler: F) -> Result<()>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Post, path, handler)
    }

    /// Adds a PUT route.
    fn put<F, Fut>(&mut self, path: &str, handler: F) -> Result<()>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Put, path, handler)
    }

    /// Adds a DELETE route.
    fn delete<F, Fut>(&mut self, path: &str, handler: F) -> Result<()>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Delete, path, handler)
    }

    /// Adds a HEAD route.
    fn head<F, Fut>(&mut self, path: &str, handler: F) -> Result<()>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Head, path, handler)
    }

    /// Adds an OPTIONS route.
    fn options<F, Fut>(&mut self, path: &str, handler: F) -> Result<()>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Options, path, handler)
    }

    /// Adds a PATCH route.
    fn patch<F, Fut>(&mut self, path: &str, handler: F) -> Result<()>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Patch, path, handler)
    }

    /// Opens a nested group under `path`.
    ///
    /// The child starts with everything this view would run for a route,
    /// including middlewares added with [`with`](Routable::with).
    fn prefix(&mut self, path: &str) -> Group<'_> {
        let mut group = self.scope();
        group.prefix = path::join(&group.prefix, path);
        let pending = std::mem::take(&mut group.pending);
        group.inherited.extend(pending);
        group
    }

    /// Returns a view whose routes additionally run `mw`, after every group
    /// middleware.
    fn with<M: Middleware + 'static>(&mut self, mw: M) -> Group<'_> {
        let mut group = self.scope();
        group.pending.push(Arc::new(mw));
        group
    }

    /// Runs `f` against a scoped copy of this view.
    fn group<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Group<'_>) -> Result<()>,
    {
        f(&mut self.scope())
    }
}

impl Routable for Router {
    fn scope(&mut self) -> Group<'_> {
        let inherited = self.middlewares.clone();
        Group {
            router: self,
            prefix: String::new(),
            inherited,
            pending: Vec::new(),
        }
    }
}

impl Routable for Group<'_> {
    fn scope(&mut self) -> Group<'_> {
        Group {
            router: &mut *self.router,
            prefix: self.prefix.clone(),
            inherited: self.inherited.clone(),
            pending: self.pending.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn hello_handler(_req: Request) -> Response {
        Response::text("Hello, World!")
    }

    async fn user_handler(req: Request) -> Response {
        let id = req.param("id").unwrap_or("unknown");
        Response::text(format!("User: {id}"))
    }

    #[tokio::test]
    async fn test_basic_routing() {
        let mut router = Router::new();
        router.get("/", hello_handler).unwrap();
        router.get("/users/:id", user_handler).unwrap();

        let res = router.handle(Request::get("/")).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body_str(), Some("Hello, World!"));
    }

    #[tokio::test]
    async fn test_path_params() {
        let mut router = Router::new();
        router.get("/users/:id", user_handler).unwrap();

        let res = router.handle(Request::get("/users/123?page=2")).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body_str(), Some("User: 123"));
    }

    #[tokio::test]
    async fn test_default_not_found() {
        let mut router = Router::new();
        router.get("/", hello_handler).unwrap();

        let res = router.handle(Request::get("/nonexistent")).await;
        assert_eq!(res.status, 404);
        assert!(res.body.is_empty());

        let res = router.handle(Request::post("/")).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn test_configured_not_found_status() {
        let config = RouterConfig {
            not_found_status: 410,
            ..RouterConfig::default()
        };
        let router = Router::with_config(config);
        let res = router.handle(Request::get("/")).await;
        assert_eq!(res.status, 410);
    }

    #[test]
    fn test_prefix_accumulates() {
        let mut router = Router::new();
        let mut group = router.prefix("/group");
        assert_eq!(group.prefix_path(), "/group");
        let sub = group.prefix("/subgroup");
        assert_eq!(sub.prefix_path(), "/group/subgroup");
    }

    #[test]
    fn test_group_routes_land_in_trie() {
        let mut router = Router::new();
        router
            .prefix("/group")
            .post("/route", hello_handler)
            .unwrap();

        assert!(router.lookup(Method::Post, "/group/route").is_some());
        assert!(router.lookup(Method::Get, "/group/route").is_none());
        assert!(router.lookup(Method::Post, "/group").is_none());
    }

    #[test]
    fn test_failed_registration_creates_no_root() {
        let mut router = Router::new();
        assert!(router.put("/a//b", hello_handler).is_err());
        assert!(router.roots.is_empty());
    }

    #[test]
    fn test_routes_listing() {
        let mut router = Router::new();
        router.post("/users", hello_handler).unwrap();
        router.get("/users/:id", user_handler).unwrap();
        router
            .with(|req: Request, next: crate::Next| next.run(req))
            .get("/", hello_handler)
            .unwrap();

        let routes = router.routes();
        let listed: Vec<_> = routes
            .iter()
            .map(|r| (r.method, r.path.as_str(), r.middlewares))
            .collect();
        assert_eq!(
            listed,
            [
                (Method::Get, "/", 1),
                (Method::Get, "/users/:id", 0),
                (Method::Post, "/users", 0),
            ]
        );
    }

    #[test]
    fn test_router_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Router>();
    }
}
