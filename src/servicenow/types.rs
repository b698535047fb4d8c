//! ServiceNow API types
//!
//! Records are read with `sysparm_display_value=true`, so reference and
//! choice fields may arrive either as plain strings or as
//! `{"display_value": ..., "value": ...}` objects. [`FieldValue`]
//! accepts both.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Table API response envelope
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub result: T,
}

/// Incident as returned to MCP clients
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    #[serde(default, deserialize_with = "field_value")]
    pub sys_id: String,
    #[serde(default, deserialize_with = "field_value")]
    pub number: String,
    #[serde(default, deserialize_with = "field_value")]
    pub short_description: String,
    #[serde(default, deserialize_with = "field_value")]
    pub description: String,
    #[serde(default, deserialize_with = "field_value")]
    pub state: String,
    #[serde(default, deserialize_with = "field_value")]
    pub priority: String,
    #[serde(default, deserialize_with = "field_value")]
    pub assigned_to: String,
    #[serde(default, deserialize_with = "field_value")]
    pub category: String,
    #[serde(default, deserialize_with = "field_value")]
    pub subcategory: String,
    #[serde(
        default,
        rename(serialize = "created_on", deserialize = "sys_created_on"),
        deserialize_with = "field_value"
    )]
    pub created_on: String,
    #[serde(
        default,
        rename(serialize = "updated_on", deserialize = "sys_updated_on"),
        deserialize_with = "field_value"
    )]
    pub updated_on: String,
}

/// Minimal record returned by create/update and number lookups
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncidentRef {
    #[serde(default, deserialize_with = "field_value")]
    pub sys_id: String,
    #[serde(default, deserialize_with = "field_value")]
    pub number: String,
}

/// Result of a mutating tool
#[derive(Debug, Clone, Serialize)]
pub struct IncidentResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_number: Option<String>,
}

impl IncidentResponse {
    pub fn ok(message: impl Into<String>, record: IncidentRef) -> Self {
        Self {
            success: true,
            message: message.into(),
            incident_id: Some(record.sys_id),
            incident_number: Some(record.number).filter(|n| !n.is_empty()),
        }
    }
}

/// Result of `list_incidents` and `get_incident_by_date`
#[derive(Debug, Clone, Serialize)]
pub struct IncidentList {
    pub success: bool,
    pub message: String,
    pub incidents: Vec<Incident>,
}

/// Result of `get_incident_by_number`
#[derive(Debug, Clone, Serialize)]
pub struct IncidentLookup {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident: Option<Incident>,
}

/// Flatten a Table API field to its display string
pub fn display_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("display_value")
            .or_else(|| map.get("value"))
            .map(display_string)
            .unwrap_or_default(),
        other => other.to_string(),
    }
}

fn field_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(display_string(&value))
}
