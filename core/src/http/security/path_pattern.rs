//! Request path patterns used by access rules.
//!
//! # Spring Equivalent
//! `AntPathRequestMatcher` / `RegexRequestMatcher`
//!
//! # Ant Syntax
//!
//! - `?` matches exactly one character
//! - `*` matches zero or more characters within a path segment
//! - `**` matches zero or more whole segments
//! - `{name}` matches exactly one segment
//!
//! Empty segments are ignored on both sides, so `/boards/register`,
//! `/boards/register/` and `//boards//register` are the same path.
//!
//! ```
//! use board_guard_core::http::security::PathPattern;
//!
//! let pattern = PathPattern::ant("/boards/**");
//! assert!(pattern.matches("/boards/register"));
//! assert!(pattern.matches("/boards"));
//! assert!(!pattern.matches("/members"));
//! ```

use std::fmt;

use regex::Regex;

use crate::http::error::ConfigError;

/// A compiled request path pattern.
#[derive(Clone)]
pub enum PathPattern {
    /// Ant-style pattern (the default).
    Ant(AntPattern),
    /// Regular expression, matched against the whole raw path.
    Regex(Regex),
}

impl PathPattern {
    /// Compiles an Ant-style pattern. Never fails.
    pub fn ant(pattern: &str) -> Self {
        PathPattern::Ant(AntPattern::new(pattern))
    }

    /// Compiles a regular expression pattern.
    pub fn regex(pattern: &str) -> Result<Self, ConfigError> {
        Regex::new(pattern)
            .map(PathPattern::Regex)
            .map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    /// Pattern matching every path.
    pub fn any() -> Self {
        PathPattern::ant("/**")
    }

    /// Checks whether `path` matches.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Ant(ant) => ant.matches(path),
            PathPattern::Regex(re) => re.is_match(path),
        }
    }

    /// Returns the source text of the pattern.
    pub fn as_str(&self) -> &str {
        match self {
            PathPattern::Ant(ant) => ant.as_str(),
            PathPattern::Regex(re) => re.as_str(),
        }
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathPattern::Ant(ant) => write!(f, "Ant({:?})", ant.as_str()),
            PathPattern::Regex(re) => write!(f, "Regex({:?})", re.as_str()),
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    /// `*`, `?` or `{var}` inside a single segment.
    Wildcard(Vec<char>),
    /// `**`
    Any,
}

/// Ant-style path pattern.
#[derive(Debug, Clone)]
pub struct AntPattern {
    source: String,
    segments: Vec<Segment>,
}

impl AntPattern {
    pub fn new(pattern: &str) -> Self {
        let segments = split(pattern)
            .map(|part| {
                if part == "**" {
                    Segment::Any
                } else if part.starts_with('{') && part.ends_with('}') {
                    Segment::Wildcard(vec!['*'])
                } else if part.contains(['*', '?']) {
                    Segment::Wildcard(part.chars().collect())
                } else {
                    Segment::Literal(part.to_string())
                }
            })
            .collect();

        AntPattern {
            source: pattern.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = split(path).collect();
        match_segments(&self.segments, &parts)
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::Any, rest)) => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((segment, rest)) => match path.split_first() {
            None => false,
            Some((head, tail)) => {
                let hit = match segment {
                    Segment::Literal(literal) => literal == head,
                    Segment::Wildcard(chars) => {
                        let text: Vec<char> = head.chars().collect();
                        match_wildcard(chars, &text)
                    }
                    Segment::Any => unreachable!("handled above"),
                };
                hit && match_segments(rest, tail)
            }
        },
    }
}

fn match_wildcard(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('*', rest)) => (0..=text.len()).any(|skip| match_wildcard(rest, &text[skip..])),
        Some(('?', rest)) => !text.is_empty() && match_wildcard(rest, &text[1..]),
        Some((c, rest)) => text.first() == Some(c) && match_wildcard(rest, &text[1..]),
    }
}
