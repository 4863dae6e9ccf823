//! Location parsing.
//!
//! Splits a location string (`/path?query#hash`, or an absolute URL) into
//! its normalized pathname, raw query string and raw hash.

use std::fmt;

use thiserror::Error;
use url::Url;

const BASE: &str = "http://waymark.invalid/";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid location {input:?}: {source}")]
pub struct LocationError {
    pub input: String,
    #[source]
    pub source: url::ParseError,
}

/// A parsed location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Percent-encoded pathname without a trailing slash (except `/`).
    pub pathname: String,
    /// Raw query string without the leading `?`.
    pub search: String,
    /// Raw fragment without the leading `#`.
    pub hash: String,
}

impl Location {
    pub fn parse(input: &str) -> Result<Self, LocationError> {
        let error = |source| LocationError {
            input: input.to_string(),
            source,
        };
        let base = Url::parse(BASE).map_err(error)?;
        let url = base.join(input.trim()).map_err(error)?;

        let mut pathname = url.path().to_string();
        while pathname.len() > 1 && pathname.ends_with('/') {
            pathname.pop();
        }

        Ok(Self {
            pathname,
            search: url.query().unwrap_or_default().to_string(),
            hash: url.fragment().unwrap_or_default().to_string(),
        })
    }

    /// Pathname plus query and hash, as pushed to history.
    pub fn href(&self) -> String {
        let mut href = self.pathname.clone();
        if !self.search.is_empty() {
            href.push('?');
            href.push_str(&self.search);
        }
        if !self.hash.is_empty() {
            href.push('#');
            href.push_str(&self.hash);
        }
        href
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_parts() {
        let loc = Location::parse("/users/42?tab=posts#top").unwrap();
        assert_eq!(loc.pathname, "/users/42");
        assert_eq!(loc.search, "tab=posts");
        assert_eq!(loc.hash, "top");
        assert_eq!(loc.href(), "/users/42?tab=posts#top");
    }

    #[test]
    fn test_normalization() {
        assert_eq!(Location::parse("/users/").unwrap().pathname, "/users");
        assert_eq!(Location::parse("/").unwrap().pathname, "/");
        assert_eq!(Location::parse("").unwrap().pathname, "/");
        assert_eq!(Location::parse("/a/../b").unwrap().pathname, "/b");
        assert_eq!(
            Location::parse("https://example.com/x?y=1").unwrap().href(),
            "/x?y=1"
        );
    }

    #[test]
    fn test_encoding_preserved() {
        let loc = Location::parse("/docs/hello world").unwrap();
        assert_eq!(loc.pathname, "/docs/hello%20world");
    }
}
