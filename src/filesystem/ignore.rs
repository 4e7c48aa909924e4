// src/filesystem/ignore.rs

//! Bower-style ignore rules applied while extracting release archives
//!
//! Rules are evaluated in order against a path relative to the archive's
//! wrapper directory:
//!
//! - `**/<glob>` matches at any depth
//! - a bare token (`CNAME`, `_*`, `*.md`, `tests`) matches any full path
//!   segment, so a directory name excludes its whole subtree
//! - a leading `/` anchors the rule to the top of the package
//! - a rule with an inner `/` (`docs/*.md`) is anchored as well
//! - a trailing `/` restricts the rule to directories
//!
//! There is no negation: rules starting with `!` are skipped.

use glob::{MatchOptions, Pattern};
use tracing::warn;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A compiled ignore rule
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pattern: Pattern,
    anchored: bool,
    directory_only: bool,
}

impl IgnoreRule {
    /// Compile a raw rule; blank lines, comments and negations yield `None`
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') || raw.starts_with('!') {
            return None;
        }

        let mut body = raw;
        let mut directory_only = false;
        if let Some(stripped) = body.strip_suffix("/**") {
            body = stripped;
            directory_only = true;
        } else if let Some(stripped) = body.strip_suffix('/') {
            body = stripped;
            directory_only = true;
        }

        let anchored = if body.starts_with("**/") {
            while let Some(stripped) = body.strip_prefix("**/") {
                body = stripped;
            }
            false
        } else if let Some(stripped) = body.strip_prefix('/') {
            body = stripped;
            true
        } else {
            body.contains('/')
        };

        if body.is_empty() {
            return None;
        }

        match Pattern::new(body) {
            Ok(pattern) => Some(Self {
                pattern,
                anchored,
                directory_only,
            }),
            Err(e) => {
                warn!("Skipping invalid ignore pattern '{}': {}", raw, e);
                None
            }
        }
    }

    /// Check the rule against the segments of a file path
    pub fn matches(&self, segments: &[&str]) -> bool {
        let starts = if self.anchored { 0..1 } else { 0..segments.len() };

        for start in starts {
            // A directory rule must leave at least the file name below the match
            let last_end = if self.directory_only {
                segments.len().saturating_sub(1)
            } else {
                segments.len()
            };

            for end in start + 1..=last_end {
                let candidate = segments[start..end].join("/");
                if self.pattern.matches_with(&candidate, MATCH_OPTIONS) {
                    return true;
                }
            }
        }

        false
    }
}

/// Decide whether an archive entry is excluded by the ignore list
///
/// `name` is the entry name as stored in the archive and `prefix` the wrapper
/// directory (e.g. `twbs-bootstrap-x/`) that is stripped before matching.
pub fn is_ignored<S: AsRef<str>>(name: &str, patterns: &[S], prefix: &str) -> bool {
    let relative = name.strip_prefix(prefix).unwrap_or(name);
    let segments: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return false;
    }

    patterns
        .iter()
        .filter_map(|raw| IgnoreRule::parse(raw.as_ref()))
        .any(|rule| rule.matches(&segments))
}
