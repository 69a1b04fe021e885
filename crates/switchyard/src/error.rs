//! Error types for routing.

use thiserror::Error;

use crate::request::Method;

/// Router-specific errors.
///
/// The first five variants are build-time conflicts: they are returned by
/// route registration and mean the route table is inconsistent. A request
/// that matches no route is not an error; it reaches the not-found handler.
#[derive(Debug, Error)]
pub enum RouterError {
    /// A handler is already registered for this method and path.
    #[error("duplicate route: {method} {path}")]
    DuplicateRoute { method: Method, path: String },

    /// A wildcard at a shared position was registered under another name.
    #[error("wildcard name mismatch in {method} {path}: `:{found}` conflicts with `:{existing}`")]
    WildcardMismatch {
        method: Method,
        path: String,
        existing: String,
        found: String,
    },

    /// The path contains two adjacent separators.
    #[error("ambiguous empty path segment in {method} {path}")]
    EmptySegment { method: Method, path: String },

    /// One path names the same wildcard twice.
    #[error("wildcard `:{name}` appears more than once in {method} {path}")]
    DuplicateWildcard {
        method: Method,
        path: String,
        name: String,
    },

    /// A wildcard marker with no parameter name.
    #[error("wildcard without a name in {method} {path}")]
    InvalidWildcard { method: Method, path: String },

    /// The method string is not one the router knows.
    #[error("unknown HTTP method: {0}")]
    UnknownMethod(String),

    /// The router configuration could not be decoded.
    #[error("invalid router configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl RouterError {
    /// Returns true for errors raised while building the route table.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::DuplicateRoute { .. }
                | Self::WildcardMismatch { .. }
                | Self::EmptySegment { .. }
                | Self::DuplicateWildcard { .. }
                | Self::InvalidWildcard { .. }
        )
    }
}

/// Result type alias for router operations.
pub type Result<T> = std::result::Result<T, RouterError>;
