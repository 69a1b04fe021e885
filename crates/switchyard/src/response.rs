//! HTTP response type.

use std::collections::HashMap;

/// An HTTP response produced by a handler or a short-circuiting middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl Response {
    /// Creates an empty response with the given status.
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Creates an empty 200 OK response.
    #[must_use]
    pub fn ok() -> Self {
        Self::empty(200)
    }

    /// Creates a response with plain text content.
    pub fn text(body: impl Into<String>) -> Self {
        let body: String = body.into();
        Self::ok()
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(body)
    }

    /// Serializes `data` into a JSON response.
    ///
    /// Serialization failures are returned to the caller untouched.
    pub fn json<T: serde::Serialize>(data: &T) -> serde_json::Result<Self> {
        let body = serde_json::to_vec(data)?;
        Ok(Self::ok().header("Content-Type", "application/json").body(body))
    }

    /// Creates a 302 redirect response.
    pub fn redirect(url: impl Into<String>) -> Self {
        Self::empty(302).header("Location", url)
    }

    /// Creates a 404 Not Found response.
    #[must_use]
    pub fn not_found() -> Self {
        Self::empty(404).body("Not Found")
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the status code.
    #[must_use]
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the body as a string, if it is valid UTF-8.
    #[must_use]
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::ok()
    }
}
