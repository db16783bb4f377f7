//! Path pattern grammar and overlap analysis.
//!
//! A pattern is an absolute path, optionally ending in `*`:
//! `/health` matches that path exactly, `/v1/auth/*` matches every path
//! starting with `/v1/auth/`, and `/*` matches everything. `*` anywhere but
//! the end and `?` are rejected, which keeps "could both match one request"
//! decidable by prefix comparison.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Pattern text of the synthesized match-all fallback
pub const MATCH_ALL: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathPattern {
    raw: String,
    /// Literal text before the trailing `*`, or the whole exact path
    prefix: String,
    wildcard: bool,
}

impl PathPattern {
    /// Parse a route pattern
    ///
    /// # Examples
    /// ```
    /// use stacksynth::routing::PathPattern;
    ///
    /// assert!(PathPattern::parse("/v1/auth/*").is_ok());
    /// assert!(PathPattern::parse("/health").is_ok());
    /// assert!(PathPattern::parse("v1/*").is_err());
    /// assert!(PathPattern::parse("/v1/*/users").is_err());
    /// assert!(PathPattern::parse("/page?").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, String> {
        if !raw.starts_with('/') {
            return Err(format!("pattern '{}' must start with '/'", raw));
        }
        if raw.contains('?') {
            return Err(format!("pattern '{}' uses '?', which is not supported", raw));
        }
        let stars = raw.matches('*').count();
        if stars > 1 || (stars == 1 && !raw.ends_with('*')) {
            return Err(format!("pattern '{}' may only use '*' as its last character", raw));
        }
        let wildcard = stars == 1;
        let prefix = raw.trim_end_matches('*').to_string();
        Ok(Self {
            raw: raw.to_string(),
            prefix,
            wildcard,
        })
    }

    /// The fallback pattern; only built by the routing table itself
    pub(crate) fn match_all() -> Self {
        Self {
            raw: MATCH_ALL.to_string(),
            prefix: String::new(),
            wildcard: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Whether this pattern matches a concrete request path
    pub fn matches(&self, path: &str) -> bool {
        if self.wildcard {
            path.starts_with(&self.prefix)
        } else {
            path == self.prefix
        }
    }

    /// Every path `other` matches is also matched by `self`
    pub fn covers(&self, other: &PathPattern) -> bool {
        if self.wildcard {
            other.prefix.starts_with(&self.prefix)
        } else {
            !other.wildcard && other.prefix == self.prefix
        }
    }

    /// Some request path is matched by both patterns
    pub fn overlaps(&self, other: &PathPattern) -> bool {
        self.covers(other) || other.covers(self)
    }

    /// `self` matches a strict subset of what `other` matches
    pub fn is_more_specific_than(&self, other: &PathPattern) -> bool {
        other.covers(self) && !self.covers(other)
    }
}

impl FromStr for PathPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for PathPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}
