//! # switchyard
//!
//! A segment-trie HTTP router with composable middleware chains.
//!
//! This crate provides:
//! - One routing trie per HTTP method, matched segment by segment
//! - Named wildcards (`:name`) capturing exactly one segment
//! - Literal-over-wildcard precedence with backtracking
//! - Route groups with prefixes and inherited middlewares
//! - Conflict detection when routes are registered, not when they are served
//!
//! ## Quick Start
//!
//! ```ignore
//! use switchyard::{Request, Response, Routable, Router};
//!
//! async fn hello_handler(_req: Request) -> Response {
//!     Response::text("Hello, World!")
//! }
//!
//! async fn user_handler(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::text(format!("User: {id}"))
//! }
//!
//! let mut router = Router::new();
//! router.get("/", hello_handler)?;
//! router.get("/users/:id", user_handler)?;
//!
//! let response = router.handle(Request::get("/users/123")).await;
//! ```
//!
//! ## Matching
//!
//! At every depth a literal child is tried before the wildcard. If the
//! literal branch dead-ends further down the path, matching backs up and
//! tries the wildcard instead:
//!
//! ```ignore
//! router.get("/users/me/settings", settings)?;
//! router.get("/users/:id/profile", profile)?;
//!
//! // Routed to `profile` with id = "me".
//! router.handle(Request::get("/users/me/profile")).await;
//! ```
//!
//! ## Conflicts
//!
//! Registration fails with a [`RouterError`] when a route duplicates an
//! existing one, when a wildcard position is reused under another name, when
//! one path names the same wildcard twice, or when the path holds an empty
//! segment (`//`). The route table is left
//! untouched by a failed registration.
//!
//! ## Middleware
//!
//! A middleware gets the request and a [`Next`] continuation. Not running
//! `next` short-circuits the rest of the chain:
//!
//! ```ignore
//! use switchyard::{Next, Request, Response, Routable};
//!
//! let mut api = router.prefix("/api/v1");
//! api.middleware(LoggingMiddleware);
//! api.with(|req: Request, next: Next| async move {
//!     if req.header("Authorization").is_none() {
//!         return Response::empty(401);
//!     }
//!     next.run(req).await
//! })
//! .get("/accounts/:account", account_handler)?;
//! ```
//!
//! Chains are composed once at registration time in the order: enclosing
//! group middlewares (outermost first), route middlewares, endpoint.

mod config;
mod error;
mod middleware;
mod node;
mod path;
mod request;
mod response;
mod router;

pub use config::RouterConfig;
pub use error::{Result, RouterError};
pub use middleware::{AuthMiddleware, CorsMiddleware, Handler, LoggingMiddleware, Middleware, Next};
pub use path::{split, SEPARATOR, WILDCARD_MARKER};
pub use request::{Method, PathParams, Request};
pub use response::Response;
pub use router::{Group, Routable, RouteInfo, RouteMatch, Router};
