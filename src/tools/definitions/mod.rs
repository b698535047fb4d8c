//! Tool definitions
//!
//! This module contains all ServiceNow incident tools.

pub mod incidents;
pub mod lookup;

use crate::error::ToolError;
use crate::servicenow::{IncidentRef, ServiceNowClient};
use crate::tools::{ToolContext, ToolRegistry};
use crate::util::QueryBuilder;
use serde_json::{Map, Value};

/// Table holding incidents
pub(crate) const INCIDENT_TABLE: &str = "incident";

/// Register all tools with the registry
pub fn register_all_tools(registry: &mut ToolRegistry) {
    incidents::register(registry);
    lookup::register(registry);
}

/// Whether an identifier is an incident number rather than a sys_id
pub(crate) fn is_incident_number(id: &str) -> bool {
    id.get(..3).is_some_and(|prefix| prefix.eq_ignore_ascii_case("INC"))
}

/// Escape a value for an encoded query
///
/// `^` separates clauses, so a literal caret is written `^^`.
pub(crate) fn query_value(value: &str) -> String {
    value.replace('^', "^^")
}

/// Look up an incident by number
pub(crate) async fn find_by_number(
    ctx: &ToolContext,
    number: &str,
) -> Result<Option<IncidentRef>, ToolError> {
    let query = QueryBuilder::new()
        .param("sysparm_query", format!("number={}", query_value(number)))
        .param("sysparm_limit", 1)
        .build();
    let endpoint = format!("/{}{}", INCIDENT_TABLE, query);

    let records: Vec<IncidentRef> = ctx.client.get(&endpoint).await?;
    Ok(records.into_iter().next())
}

/// Resolve a sys_id or `INC` number to a sys_id
pub(crate) async fn resolve_sys_id(ctx: &ToolContext, incident_id: &str) -> Result<String, ToolError> {
    let incident_id = incident_id.trim();
    if incident_id.is_empty() {
        return Err(ToolError::MissingArgument("incident_id".to_string()));
    }

    if !is_incident_number(incident_id) {
        return Ok(incident_id.to_string());
    }

    match find_by_number(ctx, incident_id).await? {
        Some(record) if !record.sys_id.is_empty() => Ok(record.sys_id),
        _ => Err(ToolError::IncidentNotFound(incident_id.to_string())),
    }
}

/// Endpoint for one incident record
pub(crate) fn record_endpoint(sys_id: &str) -> String {
    format!(
        "/{}/{}",
        INCIDENT_TABLE,
        ServiceNowClient::encode_segment(sys_id)
    )
}

/// Request body holding only the fields that carry a value
#[derive(Debug, Default)]
pub(crate) struct FieldMap(Map<String, Value>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.insert(key.to_string(), Value::String(value.into()));
        self
    }

    /// Set `key` unless the value is absent or blank
    pub fn optional(self, key: &str, value: Option<&String>) -> Self {
        match value.map(|v| v.trim()).filter(|v| !v.is_empty()) {
            Some(v) => self.set(key, v),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_incident_number() {
        assert!(is_incident_number("INC0010001"));
        assert!(is_incident_number("inc0010001"));
        assert!(!is_incident_number("46d44a23a9fe19810012d100cca80666"));
        assert!(!is_incident_number("IN"));
        assert!(!is_incident_number(""));
    }

    #[test]
    fn test_query_value_escapes_separator() {
        assert_eq!(query_value("INC0010001"), "INC0010001");
        assert_eq!(query_value("INC1^ORactive=true"), "INC1^^ORactive=true");
    }

    #[test]
    fn test_field_map_skips_blank_values() {
        let body = FieldMap::new()
            .set("state", "6")
            .optional("category", Some(&"network".to_string()))
            .optional("priority", Some(&"  ".to_string()))
            .optional("impact", None)
            .into_value();

        assert_eq!(body, serde_json::json!({"state": "6", "category": "network"}));
    }

    #[test]
    fn test_record_endpoint() {
        assert_eq!(record_endpoint("abc123"), "/incident/abc123");
    }
}
