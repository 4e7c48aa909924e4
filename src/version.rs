// src/version.rs

//! Version constraint matching
//!
//! Constraints from manifests (`*`, `1.2.3`, `>=1.6`, `~2.0.1`, `1.*`) are
//! normalized into glob patterns and matched against repository tag names.
//! This is prefix globbing, not semver range logic: `>=1.9.0` becomes `1.9.*`
//! and a strict `>=` comparison is never performed.

use glob::Pattern;
use tracing::{debug, warn};

/// Branch name that resolves without consulting tags
pub const DEFAULT_BRANCH: &str = "master";

/// Normalize a constraint string into a glob pattern
pub fn normalize(constraint: &str) -> String {
    // Ranges such as ">=1.9 <2.0" only keep their lower bound
    let mut tokens = constraint.split_whitespace();
    let first = tokens.next().unwrap_or("");
    let joined;
    let constraint = if matches!(first, ">=" | "~" | "^" | "=") {
        joined = format!("{}{}", first, tokens.next().unwrap_or(""));
        joined.as_str()
    } else {
        first
    };

    if constraint.is_empty() || constraint == "*" || constraint == "latest" {
        return "*".to_string();
    }

    let constraint = replace_x_segments(constraint);
    if constraint.contains('*') {
        return constraint;
    }

    if let Some(rest) = constraint
        .strip_prefix(">=")
        .or_else(|| constraint.strip_prefix('~'))
    {
        let segments = split_segments(rest);
        return match segments.len() {
            0 => "*".to_string(),
            1 => format!("{}.*", segments[0]),
            2 => format!("{}.*", segments.join(".")),
            n => format!("{}.*", segments[..n - 1].join(".")),
        };
    }

    if let Some(rest) = constraint.strip_prefix('^') {
        return match split_segments(rest).first() {
            Some(major) => format!("{}.*", major),
            None => "*".to_string(),
        };
    }

    let segments = split_segments(constraint.trim_start_matches('='));
    match segments.len() {
        0 => "*".to_string(),
        1 => format!("{}.*.*", segments[0]),
        2 => format!("{}.*", segments.join(".")),
        _ => segments.join("."),
    }
}

/// True when the constraint names a branch rather than a tag
pub fn is_branch(constraint: &str) -> bool {
    constraint.trim() == DEFAULT_BRANCH
}

fn split_segments(version: &str) -> Vec<&str> {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    version.split('.').filter(|s| !s.is_empty()).collect()
}

fn replace_x_segments(constraint: &str) -> String {
    constraint
        .split('.')
        .map(|segment| if segment == "x" || segment == "X" { "*" } else { segment })
        .collect::<Vec<_>>()
        .join(".")
}

/// Compiled matcher for one constraint
#[derive(Debug, Clone)]
pub struct VersionMatcher {
    normalized: String,
    // None when the normalized constraint is not a valid glob; falls back to equality
    pattern: Option<Pattern>,
}

impl VersionMatcher {
    /// Create a matcher from a raw constraint
    pub fn new(constraint: &str) -> Self {
        let normalized = normalize(constraint);
        let pattern = match Pattern::new(&normalized) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!(
                    "Constraint '{}' is not a valid glob ({}), matching literally",
                    constraint, e
                );
                None
            }
        };

        Self { normalized, pattern }
    }

    /// The normalized glob pattern
    pub fn pattern(&self) -> &str {
        &self.normalized
    }

    /// Check a single tag name; a leading `v` on the tag is tolerated
    pub fn matches(&self, tag: &str) -> bool {
        self.matches_exact(tag)
            || tag
                .strip_prefix('v')
                .is_some_and(|bare| self.matches_exact(bare))
    }

    fn matches_exact(&self, tag: &str) -> bool {
        match &self.pattern {
            Some(pattern) => pattern.matches(tag),
            None => tag == self.normalized,
        }
    }

    /// First tag in the given order that matches, if any
    pub fn find<'a, I>(&self, tags: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let found = tags.into_iter().find(|tag| self.matches(tag));
        debug!("Pattern '{}' matched {:?}", self.pattern(), found);
        found
    }
}
