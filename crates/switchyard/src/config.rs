//! Router configuration.

use serde::Deserialize;

use crate::error::Result;

/// Tunables applied when a [`Router`](crate::Router) is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Emit a `debug` event for every dispatched request.
    pub log_dispatch: bool,
    /// Status returned by the default not-found handler.
    pub not_found_status: u16,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            log_dispatch: false,
            not_found_status: 404,
        }
    }
}

impl RouterConfig {
    /// Decodes a configuration from JSON. Missing fields keep their defaults.
    ///
    /// # Example
    ///
    /// ```
    /// use switchyard::RouterConfig;
    ///
    /// let config = RouterConfig::from_json(br#"{"log_dispatch": true}"#).unwrap();
    /// assert!(config.log_dispatch);
    /// assert_eq!(config.not_found_status, 404);
    /// ```
    pub fn from_json(buf: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(buf)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RouterError;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = RouterConfig::from_json(b"{}").unwrap();
        assert_eq!(config, RouterConfig::default());
    }

    #[test]
    fn test_full_document() {
        let config =
            RouterConfig::from_json(br#"{"log_dispatch": true, "not_found_status": 410}"#)
                .unwrap();
        assert!(config.log_dispatch);
        assert_eq!(config.not_found_status, 410);
    }

    #[test]
    fn test_invalid_document() {
        let err = RouterConfig::from_json(b"{\"not_found_status\": \"x\"}").unwrap_err();
        assert!(matches!(err, RouterError::Config(_)));
        assert!(!err.is_conflict());
    }
}
