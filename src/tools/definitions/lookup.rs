//! Lookup tools
//!
//! Read-only tools listing and fetching incidents.

use crate::error::ToolError;
use crate::servicenow::{Incident, IncidentList, IncidentLookup};
use crate::tools::definitions::{INCIDENT_TABLE, query_value};
use crate::tools::{ToolContext, ToolExecutor, ToolOutput, ToolRegistry};
use crate::util::QueryBuilder;
use async_trait::async_trait;
use servicenow_mcp_macros::incident_tool;

const MAX_LIMIT: u32 = 1000;

/// Layout of `YYYY-MM-DD HH:MM:SS`; `d` marks a digit
const DATE_TIME_LAYOUT: &[u8; 19] = b"dddd-dd-dd dd:dd:dd";

/// Register all lookup tools
pub fn register(registry: &mut ToolRegistry) {
    registry.register::<ListIncidents>();
    registry.register::<GetIncidentByNumber>();
    registry.register::<GetIncidentByDate>();
}

fn default_limit() -> u32 {
    10
}

/// Filters combined into an encoded query (`sysparm_query`)
#[derive(Debug, Default)]
pub struct IncidentQuery<'a> {
    pub state: Option<&'a str>,
    pub assigned_to: Option<&'a str>,
    pub category: Option<&'a str>,
    pub text: Option<&'a str>,
    pub created_between: Option<(&'a str, &'a str)>,
}

impl IncidentQuery<'_> {
    /// Encoded query, `None` when no filter is set
    pub fn build(&self) -> Option<String> {
        let mut parts = Vec::new();

        fn non_blank(v: Option<&str>) -> Option<String> {
            v.map(str::trim).filter(|v| !v.is_empty()).map(query_value)
        }

        if let Some(state) = non_blank(self.state) {
            parts.push(format!("state={}", state));
        }
        if let Some(assigned_to) = non_blank(self.assigned_to) {
            parts.push(format!("assigned_to={}", assigned_to));
        }
        if let Some(category) = non_blank(self.category) {
            parts.push(format!("category={}", category));
        }
        if let Some(text) = non_blank(self.text) {
            parts.push(format!(
                "short_descriptionLIKE{text}^ORdescriptionLIKE{text}"
            ));
        }
        if let Some((start, end)) = self.created_between {
            parts.push(format!(
                "sys_created_on>={}^sys_created_on<={}",
                start, end
            ));
        }

        (!parts.is_empty()).then(|| parts.join("^"))
    }
}

/// Fetch a page of incidents matching `query`
async fn fetch_incidents(
    ctx: &ToolContext,
    query: &IncidentQuery<'_>,
    limit: u32,
    offset: u32,
) -> Result<Vec<Incident>, ToolError> {
    let params = QueryBuilder::new()
        .param("sysparm_limit", limit.clamp(1, MAX_LIMIT))
        .param("sysparm_offset", offset)
        .optional("sysparm_query", query.build())
        .param("sysparm_display_value", true)
        .param("sysparm_exclude_reference_link", true)
        .build();

    let endpoint = format!("/{}{}", INCIDENT_TABLE, params);
    Ok(ctx.client.get(&endpoint).await?)
}

fn list_output(incidents: Vec<Incident>) -> Result<ToolOutput, ToolError> {
    ToolOutput::json_value(IncidentList {
        success: true,
        message: format!("Found {} incidents", incidents.len()),
        incidents,
    })
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        2 if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Check a `YYYY-MM-DD HH:MM:SS` timestamp
fn validate_date_time(field: &str, value: &str) -> Result<(), ToolError> {
    let invalid = || {
        ToolError::InvalidArguments(format!(
            "{} must be in 'YYYY-MM-DD HH:MM:SS' format, got '{}'",
            field, value
        ))
    };

    let bytes = value.as_bytes();
    let well_formed = bytes.len() == DATE_TIME_LAYOUT.len()
        && bytes
            .iter()
            .zip(DATE_TIME_LAYOUT)
            .all(|(b, l)| if *l == b'd' { b.is_ascii_digit() } else { b == l });
    if !well_formed {
        return Err(invalid());
    }

    let part = |range: std::ops::Range<usize>| -> u32 { value[range].parse().unwrap_or(u32::MAX) };

    let month = part(5..7);
    let in_range = (1..=12).contains(&month)
        && (1..=days_in_month(part(0..4), month)).contains(&part(8..10))
        && part(11..13) < 24
        && part(14..16) < 60
        && part(17..19) < 60;

    if in_range { Ok(()) } else { Err(invalid()) }
}

// ============================================================================
// list_incidents
// ============================================================================

/// List incidents with optional filters
#[incident_tool(
    name = "list_incidents",
    description = "List ServiceNow incidents with optional filters on state, assignee, category, or text in the descriptions",
    operation = "read"
)]
pub struct ListIncidents {
    /// Maximum number of incidents to return (default: 10, max: 1000)
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Number of incidents to skip
    #[serde(default)]
    pub offset: u32,
    /// Filter by state code
    #[serde(default)]
    pub state: Option<String>,
    /// Filter by assignee
    #[serde(default)]
    pub assigned_to: Option<String>,
    /// Filter by category
    #[serde(default)]
    pub category: Option<String>,
    /// Text to search for in short description or description
    #[serde(default)]
    pub query: Option<String>,
}

#[async_trait]
impl ToolExecutor for ListIncidents {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let query = IncidentQuery {
            state: self.state.as_deref(),
            assigned_to: self.assigned_to.as_deref(),
            category: self.category.as_deref(),
            text: self.query.as_deref(),
            created_between: None,
        };

        let incidents = fetch_incidents(ctx, &query, self.limit, self.offset).await?;
        list_output(incidents)
    }
}

// ============================================================================
// get_incident_by_number
// ============================================================================

/// Get an incident by its number
#[incident_tool(
    name = "get_incident_by_number",
    description = "Get details of an incident by its number (e.g., INC0010001)",
    operation = "read"
)]
pub struct GetIncidentByNumber {
    /// Incident number
    pub incident_number: String,
}

#[async_trait]
impl ToolExecutor for GetIncidentByNumber {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let number = self.incident_number.trim();
        if number.is_empty() {
            return Err(ToolError::MissingArgument("incident_number".to_string()));
        }

        let params = QueryBuilder::new()
            .param("sysparm_query", format!("number={}", query_value(number)))
            .param("sysparm_limit", 1)
            .param("sysparm_display_value", true)
            .param("sysparm_exclude_reference_link", true)
            .build();
        let endpoint = format!("/{}{}", INCIDENT_TABLE, params);

        let incidents: Vec<Incident> = ctx.client.get(&endpoint).await?;

        let lookup = match incidents.into_iter().next() {
            Some(incident) => IncidentLookup {
                success: true,
                message: format!("Incident {} found", number),
                incident: Some(incident),
            },
            None => IncidentLookup {
                success: false,
                message: format!("Incident not found: {}", number),
                incident: None,
            },
        };

        ToolOutput::json_value(lookup)
    }
}

// ============================================================================
// get_incident_by_date
// ============================================================================

/// List incidents created in a time range
#[incident_tool(
    name = "get_incident_by_date",
    description = "Retrieve ServiceNow incidents created between two dates (inclusive). Dates must be in 'YYYY-MM-DD HH:MM:SS' format (UTC).",
    operation = "read"
)]
pub struct GetIncidentByDate {
    /// Start of the range, 'YYYY-MM-DD HH:MM:SS' (UTC)
    pub start_date: String,
    /// End of the range, 'YYYY-MM-DD HH:MM:SS' (UTC)
    pub end_date: String,
    /// Maximum number of incidents to return (default: 10, max: 1000)
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Number of incidents to skip
    #[serde(default)]
    pub offset: u32,
}

#[async_trait]
impl ToolExecutor for GetIncidentByDate {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let start = self.start_date.trim();
        let end = self.end_date.trim();
        validate_date_time("start_date", start)?;
        validate_date_time("end_date", end)?;

        // Fixed-width format, so string order is time order
        if start > end {
            return Err(ToolError::InvalidArguments(format!(
                "start_date '{}' is after end_date '{}'",
                start, end
            )));
        }

        let query = IncidentQuery {
            created_between: Some((start, end)),
            ..Default::default()
        };

        let incidents = fetch_incidents(ctx, &query, self.limit, self.offset).await?;
        list_output(incidents)
    }
}
