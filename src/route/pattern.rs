// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Route patterns: glob, regex, or predicate matching
//!
//! Exactly one matching strategy is active per registration; patterns are
//! immutable once registered. Globs and regexes compare against the full
//! normalized URL string, predicates receive the parsed URL.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use url::Url;

use crate::error::{Error, Result};

/// Predicate callback over a parsed URL
pub type UrlPredicate = Arc<dyn Fn(&Url) -> bool + Send + Sync>;

/// A matching rule associated with a route handler
#[derive(Clone)]
pub enum RoutePattern {
    /// Glob over the full URL string: `*` matches within a path segment,
    /// `**` matches across segments
    Glob(GlobPattern),
    /// Regular expression over the full URL string
    Regex(Regex),
    /// Predicate over the parsed URL
    Predicate(UrlPredicate),
}

impl RoutePattern {
    /// Compile a glob pattern
    pub fn glob(pattern: impl AsRef<str>) -> Result<Self> {
        Ok(RoutePattern::Glob(GlobPattern::compile(pattern.as_ref())?))
    }

    /// Compile a regex pattern
    pub fn regex(pattern: impl AsRef<str>) -> Result<Self> {
        let regex = Regex::new(pattern.as_ref())
            .map_err(|e| Error::pattern(pattern.as_ref(), e.to_string()))?;
        Ok(RoutePattern::Regex(regex))
    }

    /// Wrap a predicate function
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&Url) -> bool + Send + Sync + 'static,
    {
        RoutePattern::Predicate(Arc::new(predicate))
    }

    /// Check whether this pattern matches the given URL
    pub fn matches(&self, url: &Url) -> bool {
        match self {
            RoutePattern::Glob(glob) => glob.matches(url.as_str()),
            RoutePattern::Regex(regex) => regex.is_match(url.as_str()),
            RoutePattern::Predicate(predicate) => predicate(url),
        }
    }
}

impl fmt::Debug for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutePattern::Glob(glob) => write!(f, "Glob({})", glob.source()),
            RoutePattern::Regex(regex) => write!(f, "Regex({})", regex.as_str()),
            RoutePattern::Predicate(_) => write!(f, "Predicate(..)"),
        }
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutePattern::Glob(glob) => write!(f, "glob:{}", glob.source()),
            RoutePattern::Regex(regex) => write!(f, "regex:{}", regex.as_str()),
            RoutePattern::Predicate(_) => write!(f, "predicate"),
        }
    }
}

/// A compiled glob pattern
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
}

impl GlobPattern {
    /// Compile a glob string into an anchored regex
    pub fn compile(pattern: &str) -> Result<Self> {
        let mut regex_source = String::with_capacity(pattern.len() * 2 + 2);
        regex_source.push('^');

        let mut chars = pattern.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '*' => {
                    if chars.peek() == Some(&'*') {
                        chars.next();
                        // `**` crosses path segments
                        regex_source.push_str(".*");
                    } else {
                        // `*` stays within one segment
                        regex_source.push_str("[^/]*");
                    }
                }
                '?' => regex_source.push_str("[^/]"),
                // Regex metacharacters are matched literally
                '.' | '+' | '(' | ')' | '[' | ']' | '{' | '}' | '^' | '$' | '|' | '\\' => {
                    regex_source.push('\\');
                    regex_source.push(c);
                }
                _ => regex_source.push(c),
            }
        }

        regex_source.push('$');

        let regex =
            Regex::new(&regex_source).map_err(|e| Error::pattern(pattern, e.to_string()))?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// The original glob source string
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Check whether the glob matches a full URL string
    pub fn matches(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_double_star_crosses_segments() {
        let pattern = RoutePattern::glob("**/api/items").unwrap();
        assert!(pattern.matches(&url("https://example.com/api/items")));
        assert!(pattern.matches(&url("https://example.com/v2/nested/api/items")));
        assert!(!pattern.matches(&url("https://example.com/api/items/7")));
    }

    #[test]
    fn test_single_star_stays_in_segment() {
        let pattern = RoutePattern::glob("https://example.com/api/*/detail").unwrap();
        assert!(pattern.matches(&url("https://example.com/api/items/detail")));
        assert!(!pattern.matches(&url("https://example.com/api/items/7/detail")));
    }

    #[test]
    fn test_broad_api_glob() {
        let pattern = RoutePattern::glob("**/api/**").unwrap();
        assert!(pattern.matches(&url("https://example.com/api/items")));
        assert!(pattern.matches(&url("https://example.com/api/users/5")));
        assert!(!pattern.matches(&url("https://example.com/static/app.js")));
    }

    #[test]
    fn test_glob_escapes_regex_metacharacters() {
        let pattern = RoutePattern::glob("**/search?q=a+b").unwrap();
        assert!(!pattern.matches(&url("https://example.com/searchXq=aab")));
    }

    #[test]
    fn test_regex_pattern() {
        let pattern = RoutePattern::regex(r"/api/items/\d+$").unwrap();
        assert!(pattern.matches(&url("https://example.com/api/items/42")));
        assert!(!pattern.matches(&url("https://example.com/api/items/abc")));
    }

    #[test]
    fn test_invalid_regex_is_loud() {
        let err = RoutePattern::regex("(unclosed").unwrap_err();
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn test_predicate_pattern() {
        let pattern =
            RoutePattern::predicate(|u: &Url| u.path().ends_with(".json") && u.scheme() == "https");
        assert!(pattern.matches(&url("https://example.com/data.json")));
        assert!(!pattern.matches(&url("http://example.com/data.json")));
    }
}
