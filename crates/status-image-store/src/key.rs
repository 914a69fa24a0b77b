//! Cache key derived from the request path

use std::fmt;

/// A 3-digit status code naming one cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatusKey(String);

/// The path segment was not exactly three decimal digits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidKey(pub String);

impl fmt::Display for InvalidKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid status code key: {:?}", self.0)
    }
}

impl std::error::Error for InvalidKey {}

impl StatusKey {
    /// Parse a bare segment such as `"404"`
    pub fn parse(segment: &str) -> Result<Self, InvalidKey> {
        if segment.len() == 3 && segment.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(segment.to_string()))
        } else {
            Err(InvalidKey(segment.to_string()))
        }
    }

    /// Parse the first segment of a URL path
    ///
    /// `/200`, `/200/` and `/200/anything` all yield `200`. The path must not
    /// carry a query string.
    pub fn from_path(path: &str) -> Result<Self, InvalidKey> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let segment = trimmed.split('/').next().unwrap_or_default();
        Self::parse(segment)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the file holding this entry
    pub fn file_name(&self) -> String {
        format!("{}.jpg", self.0)
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
