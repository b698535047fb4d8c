//! Access control resolver
//!
//! Precedence (highest to lowest):
//! 1. Action override
//! 2. Allow patterns
//! 3. Deny patterns
//! 4. Base access level

use crate::access_control::patterns::PatternMatcher;
use crate::access_control::types::OperationType;
use crate::config::{AccessControlConfig, AccessLevel, ActionPermission};
use crate::error::{AccessDeniedError, ConfigError};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Access control resolver
///
/// Evaluates whether a tool call is permitted by the configured policy.
#[derive(Debug)]
pub struct AccessResolver {
    base_level: AccessLevel,
    deny: PatternMatcher,
    allow: PatternMatcher,
    actions: HashMap<String, ActionPermission>,
}

/// Result of access check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Access is allowed
    Allowed,
    /// Access is denied with a reason
    Denied(String),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, AccessDecision::Denied(_))
    }
}

impl AccessResolver {
    /// Create a new resolver from configuration
    ///
    /// Fails with [`ConfigError::InvalidPattern`] on a malformed regex.
    pub fn new(config: &AccessControlConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            base_level: config.all,
            deny: PatternMatcher::new(&config.deny)?,
            allow: PatternMatcher::new(&config.allow)?,
            actions: config.actions.clone(),
        })
    }

    /// Check if a tool call is permitted
    pub fn check(&self, tool_name: &str, operation: OperationType) -> AccessDecision {
        debug!(tool = tool_name, operation = %operation, "Checking access");

        if let Some(permission) = self.actions.get(tool_name) {
            trace!("Matched action override");
            return match permission {
                ActionPermission::Allow => AccessDecision::Allowed,
                ActionPermission::Deny => {
                    AccessDecision::Denied("Explicitly denied by action override".to_string())
                }
            };
        }

        if let Some(pattern) = self.allow.find_match(tool_name) {
            trace!("Matched allow pattern: {}", pattern);
            return AccessDecision::Allowed;
        }
        if let Some(pattern) = self.deny.find_match(tool_name) {
            trace!("Matched deny pattern: {}", pattern);
            return AccessDecision::Denied(format!("Denied by pattern '{}'", pattern));
        }

        trace!("Using base level: {:?}", self.base_level);
        Self::check_access_level(self.base_level, operation)
    }

    fn check_access_level(level: AccessLevel, operation: OperationType) -> AccessDecision {
        match (level, operation) {
            (AccessLevel::Full, _) => AccessDecision::Allowed,
            (AccessLevel::Read, OperationType::Read) => AccessDecision::Allowed,
            (AccessLevel::Read, _) => AccessDecision::Denied(format!(
                "Operation '{}' requires write access, but only read access is granted",
                operation
            )),
            (AccessLevel::None, _) => AccessDecision::Denied("No access granted".to_string()),
        }
    }

    /// Check if a tool call is permitted, returning an error if denied
    pub fn require(
        &self,
        tool_name: &str,
        operation: OperationType,
    ) -> Result<(), AccessDeniedError> {
        match self.check(tool_name, operation) {
            AccessDecision::Allowed => Ok(()),
            AccessDecision::Denied(reason) => Err(AccessDeniedError::new(tool_name, reason)),
        }
    }

    /// Whether a tool can never be called under this policy
    ///
    /// Used to mark tools as "UNAVAILABLE" in the tool listing. With a single
    /// policy scope this is the same as a denied check.
    pub fn is_globally_denied(&self, tool_name: &str, operation: OperationType) -> bool {
        self.check(tool_name, operation).is_denied()
    }

    /// Create a permissive resolver that allows everything (for testing)
    pub fn allow_all() -> Self {
        Self {
            base_level: AccessLevel::Full,
            deny: PatternMatcher::empty(),
            allow: PatternMatcher::empty(),
            actions: HashMap::new(),
        }
    }

    /// Create a restrictive resolver that denies everything
    pub fn deny_all() -> Self {
        Self {
            base_level: AccessLevel::None,
            deny: PatternMatcher::empty(),
            allow: PatternMatcher::empty(),
            actions: HashMap::new(),
        }
    }
}
