//! Regex rules over tool names
//!
//! `access_control.allow` and `access_control.deny` each compile into one
//! [`PatternMatcher`]. Patterns are unanchored unless written with `^`/`$`.

use crate::error::ConfigError;
use regex::{Regex, RegexSet};

/// Set of tool name patterns from one policy list
#[derive(Debug)]
pub struct PatternMatcher {
    sources: Vec<String>,
    set: RegexSet,
}

impl PatternMatcher {
    /// Compile a policy list
    ///
    /// Each pattern is checked on its own first so the error names the
    /// offending entry.
    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        let invalid = |pattern: &str, e: regex::Error| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        };

        for pattern in patterns {
            Regex::new(pattern).map_err(|e| invalid(pattern, e))?;
        }
        let set = RegexSet::new(patterns).map_err(|e| invalid(&patterns.join(", "), e))?;

        Ok(Self {
            sources: patterns.to_vec(),
            set,
        })
    }

    /// Matcher with no patterns
    pub fn empty() -> Self {
        Self {
            sources: Vec::new(),
            set: RegexSet::empty(),
        }
    }

    pub fn matches(&self, tool_name: &str) -> bool {
        self.set.is_match(tool_name)
    }

    /// First pattern in list order that matches `tool_name`
    pub fn find_match(&self, tool_name: &str) -> Option<&str> {
        self.set
            .matches(tool_name)
            .iter()
            .next()
            .map(|idx| self.sources[idx].as_str())
    }
}
