//! Path tokenization.
//!
//! Paths are `/`-delimited. A segment starting with `:` is a named
//! wildcard that captures exactly one segment of the request path.

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Marker opening a named wildcard segment (e.g. `:id`).
pub const WILDCARD_MARKER: char = ':';

/// Splits a path into its non-empty segments, appending them to `tokens`.
///
/// Leading and trailing separators are ignored and empty segments are never
/// emitted. The buffer is not cleared, so callers reusing it across paths
/// must reset it themselves.
///
/// # Example
///
/// ```
/// let mut tokens = Vec::new();
/// switchyard::split("/accounts/42/", &mut tokens);
/// assert_eq!(tokens, ["accounts", "42"]);
///
/// tokens.clear();
/// switchyard::split("/", &mut tokens);
/// assert!(tokens.is_empty());
/// ```
pub fn split<'a>(path: &'a str, tokens: &mut Vec<&'a str>) {
    tokens.extend(path.split(SEPARATOR).filter(|s| !s.is_empty()));
}

/// Returns true if `path` holds an empty segment other than a single
/// trailing one, i.e. two adjacent separators anywhere.
pub(crate) fn has_empty_segment(path: &str) -> bool {
    path.as_bytes().windows(2).any(|w| w == b"//")
}

/// Returns the parameter name if `segment` is a wildcard.
pub(crate) fn wildcard_name(segment: &str) -> Option<&str> {
    segment.strip_prefix(WILDCARD_MARKER)
}

/// Concatenates a group prefix and a relative path with exactly one
/// separator between them.
pub(crate) fn join(prefix: &str, path: &str) -> String {
    let prefix = prefix.strip_suffix(SEPARATOR).unwrap_or(prefix);
    if path.is_empty() {
        return prefix.to_string();
    }
    let path = path.strip_prefix(SEPARATOR).unwrap_or(path);
    format!("{prefix}{SEPARATOR}{path}")
}
