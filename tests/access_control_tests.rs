//! Access control integration tests
//!
//! Covers access levels against the two operation types, allow/deny
//! patterns and per-tool action overrides, using the real tool names.

use rstest::rstest;
use servicenow_mcp::access_control::{AccessResolver, OperationType};
use servicenow_mcp::config::{AccessControlConfig, AccessLevel, ActionPermission};
use servicenow_mcp::tools::{ToolRegistry, definitions};

// =============================================================================
// Test Helpers
// =============================================================================

fn config_with_level(level: AccessLevel) -> AccessControlConfig {
    AccessControlConfig {
        all: level,
        ..Default::default()
    }
}

fn resolver(config: &AccessControlConfig) -> AccessResolver {
    AccessResolver::new(config).unwrap()
}

/// Every registered tool with its operation type
fn all_tools() -> Vec<(&'static str, OperationType)> {
    let mut registry = ToolRegistry::new();
    definitions::register_all_tools(&mut registry);
    registry.tools().map(|t| (t.name, t.operation)).collect()
}

// =============================================================================
// Access level x operation type
// =============================================================================

#[rstest]
#[case::none_read(AccessLevel::None, OperationType::Read, false)]
#[case::none_write(AccessLevel::None, OperationType::Write, false)]
#[case::read_read(AccessLevel::Read, OperationType::Read, true)]
#[case::read_write(AccessLevel::Read, OperationType::Write, false)]
#[case::full_read(AccessLevel::Full, OperationType::Read, true)]
#[case::full_write(AccessLevel::Full, OperationType::Write, true)]
fn test_level_operation_matrix(
    #[case] level: AccessLevel,
    #[case] operation: OperationType,
    #[case] allowed: bool,
) {
    let resolver = resolver(&config_with_level(level));
    assert_eq!(
        resolver.check("some_tool", operation).is_allowed(),
        allowed
    );
}

#[test]
fn test_read_only_covers_registered_tools() {
    let resolver = resolver(&config_with_level(AccessLevel::Read));

    for (name, operation) in all_tools() {
        let allowed = resolver.check(name, operation).is_allowed();
        assert_eq!(allowed, operation.is_read_only(), "unexpected decision for {name}");
    }
}

#[test]
fn test_default_policy_is_full_access() {
    let resolver = resolver(&AccessControlConfig::default());

    for (name, operation) in all_tools() {
        assert!(resolver.check(name, operation).is_allowed(), "{name} denied");
    }
}

// =============================================================================
// Patterns
// =============================================================================

mod pattern_tests {
    use super::*;

    #[test]
    fn test_allow_pattern_on_none_base() {
        let mut config = config_with_level(AccessLevel::None);
        config.allow = vec!["^(list|get)_".to_string()];
        let resolver = resolver(&config);

        assert!(resolver.check("list_incidents", OperationType::Read).is_allowed());
        assert!(resolver.check("get_incident_by_number", OperationType::Read).is_allowed());
        assert!(resolver.check("create_incident", OperationType::Write).is_denied());
    }

    #[test]
    fn test_deny_pattern_on_full_base() {
        let mut config = config_with_level(AccessLevel::Full);
        config.deny = vec!["^resolve_".to_string(), "comment".to_string()];
        let resolver = resolver(&config);

        assert!(resolver.check("resolve_incident", OperationType::Write).is_denied());
        assert!(resolver.check("add_comment", OperationType::Write).is_denied());
        assert!(resolver.check("update_incident", OperationType::Write).is_allowed());
    }

    #[test]
    fn test_allow_overrides_deny() {
        let mut config = config_with_level(AccessLevel::Full);
        config.deny = vec![".*".to_string()];
        config.allow = vec!["^list_incidents$".to_string()];
        let resolver = resolver(&config);

        assert!(resolver.check("list_incidents", OperationType::Read).is_allowed());
        assert!(resolver.check("get_incident_by_date", OperationType::Read).is_denied());
    }

    #[test]
    fn test_pattern_matches_substring_by_default() {
        let mut config = config_with_level(AccessLevel::Full);
        config.deny = vec!["incident".to_string()];
        let resolver = resolver(&config);

        for (name, operation) in all_tools() {
            let denied = resolver.check(name, operation).is_denied();
            assert_eq!(denied, name.contains("incident"), "unexpected decision for {name}");
        }
    }

    #[test]
    fn test_pattern_case_sensitive() {
        let mut config = config_with_level(AccessLevel::Full);
        config.deny = vec!["LIST_INCIDENTS".to_string()];
        let resolver = resolver(&config);

        assert!(resolver.check("list_incidents", OperationType::Read).is_allowed());
    }

    #[test]
    fn test_allow_pattern_grants_write_on_read_base() {
        let mut config = config_with_level(AccessLevel::Read);
        config.allow = vec!["^add_comment$".to_string()];
        let resolver = resolver(&config);

        assert!(resolver.check("add_comment", OperationType::Write).is_allowed());
        assert!(resolver.check("resolve_incident", OperationType::Write).is_denied());
    }
}

// =============================================================================
// Action overrides
// =============================================================================

mod action_tests {
    use super::*;

    #[test]
    fn test_action_deny_beats_allow_pattern() {
        let mut config = config_with_level(AccessLevel::Full);
        config.allow = vec![".*".to_string()];
        config
            .actions
            .insert("resolve_incident".to_string(), ActionPermission::Deny);
        let resolver = resolver(&config);

        let decision = resolver.check("resolve_incident", OperationType::Write);
        assert!(decision.is_denied());
        assert!(resolver.check("update_incident", OperationType::Write).is_allowed());
    }

    #[test]
    fn test_action_allow_beats_deny_pattern() {
        let mut config = config_with_level(AccessLevel::None);
        config.deny = vec![".*".to_string()];
        config
            .actions
            .insert("list_incidents".to_string(), ActionPermission::Allow);
        let resolver = resolver(&config);

        assert!(resolver.check("list_incidents", OperationType::Read).is_allowed());
        assert!(resolver.check("get_incident_by_number", OperationType::Read).is_denied());
    }

    #[test]
    fn test_require_error_names_tool() {
        let mut config = config_with_level(AccessLevel::Full);
        config
            .actions
            .insert("add_comment".to_string(), ActionPermission::Deny);
        let resolver = resolver(&config);

        let err = resolver
            .require("add_comment", OperationType::Write)
            .unwrap_err();
        assert_eq!(err.tool, "add_comment");
        assert!(err.to_string().contains("add_comment"));
    }
}
