//! Incident tools
//!
//! Tools that create or modify incidents.

use crate::error::ToolError;
use crate::servicenow::{IncidentRef, IncidentResponse};
use crate::tools::definitions::{FieldMap, INCIDENT_TABLE, record_endpoint, resolve_sys_id};
use crate::tools::{ToolContext, ToolExecutor, ToolOutput, ToolRegistry};
use async_trait::async_trait;
use servicenow_mcp_macros::incident_tool;

/// State code of a resolved incident
const STATE_RESOLVED: &str = "6";

/// Register all incident tools
pub fn register(registry: &mut ToolRegistry) {
    registry.register::<CreateIncident>();
    registry.register::<UpdateIncident>();
    registry.register::<AddComment>();
    registry.register::<ResolveIncident>();
}

// ============================================================================
// create_incident
// ============================================================================

/// Create a new incident
#[incident_tool(
    name = "create_incident",
    description = "Create a new ServiceNow incident",
    operation = "write"
)]
pub struct CreateIncident {
    /// Short description of the incident
    pub short_description: String,
    /// Detailed description
    #[serde(default)]
    pub description: Option<String>,
    /// User who reported the incident (sys_id or user name)
    #[serde(default)]
    pub caller_id: Option<String>,
    /// Category (e.g., "network", "software")
    #[serde(default)]
    pub category: Option<String>,
    /// Subcategory
    #[serde(default)]
    pub subcategory: Option<String>,
    /// Priority (1 = critical ... 5 = planning)
    #[serde(default)]
    pub priority: Option<String>,
    /// Impact (1 = high, 2 = medium, 3 = low)
    #[serde(default)]
    pub impact: Option<String>,
    /// Urgency (1 = high, 2 = medium, 3 = low)
    #[serde(default)]
    pub urgency: Option<String>,
    /// Assignee (sys_id or user name)
    #[serde(default)]
    pub assigned_to: Option<String>,
    /// Assignment group (sys_id or name)
    #[serde(default)]
    pub assignment_group: Option<String>,
}

#[async_trait]
impl ToolExecutor for CreateIncident {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        if self.short_description.trim().is_empty() {
            return Err(ToolError::MissingArgument("short_description".to_string()));
        }

        let body = FieldMap::new()
            .set("short_description", self.short_description.trim())
            .optional("description", self.description.as_ref())
            .optional("caller_id", self.caller_id.as_ref())
            .optional("category", self.category.as_ref())
            .optional("subcategory", self.subcategory.as_ref())
            .optional("priority", self.priority.as_ref())
            .optional("impact", self.impact.as_ref())
            .optional("urgency", self.urgency.as_ref())
            .optional("assigned_to", self.assigned_to.as_ref())
            .optional("assignment_group", self.assignment_group.as_ref())
            .into_value();

        let endpoint = format!("/{}", INCIDENT_TABLE);
        let record: IncidentRef = ctx.client.post(&endpoint, &body).await?;

        ToolOutput::json_value(IncidentResponse::ok(
            "Incident created successfully",
            record,
        ))
    }
}

// ============================================================================
// update_incident
// ============================================================================

/// Update an existing incident
#[incident_tool(
    name = "update_incident",
    description = "Update an existing ServiceNow incident",
    operation = "write"
)]
pub struct UpdateIncident {
    /// Incident sys_id or number (e.g., "INC0010001")
    pub incident_id: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// State code (1 = new, 2 = in progress, 3 = on hold, 6 = resolved, 7 = closed)
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub urgency: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub assignment_group: Option<String>,
    /// Internal work notes
    #[serde(default)]
    pub work_notes: Option<String>,
    #[serde(default)]
    pub close_notes: Option<String>,
    #[serde(default)]
    pub close_code: Option<String>,
}

#[async_trait]
impl ToolExecutor for UpdateIncident {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let body = FieldMap::new()
            .optional("short_description", self.short_description.as_ref())
            .optional("description", self.description.as_ref())
            .optional("state", self.state.as_ref())
            .optional("category", self.category.as_ref())
            .optional("subcategory", self.subcategory.as_ref())
            .optional("priority", self.priority.as_ref())
            .optional("impact", self.impact.as_ref())
            .optional("urgency", self.urgency.as_ref())
            .optional("assigned_to", self.assigned_to.as_ref())
            .optional("assignment_group", self.assignment_group.as_ref())
            .optional("work_notes", self.work_notes.as_ref())
            .optional("close_notes", self.close_notes.as_ref())
            .optional("close_code", self.close_code.as_ref());

        if body.is_empty() {
            return Err(ToolError::InvalidArguments(
                "no fields to update".to_string(),
            ));
        }

        let sys_id = resolve_sys_id(ctx, &self.incident_id).await?;
        let record: IncidentRef = ctx
            .client
            .put(&record_endpoint(&sys_id), &body.into_value())
            .await?;

        ToolOutput::json_value(IncidentResponse::ok(
            "Incident updated successfully",
            record,
        ))
    }
}

// ============================================================================
// add_comment
// ============================================================================

/// Add a comment or work note to an incident
#[incident_tool(
    name = "add_comment",
    description = "Add a customer-visible comment or an internal work note to an incident",
    operation = "write"
)]
pub struct AddComment {
    /// Incident sys_id or number
    pub incident_id: String,
    /// Comment text
    pub comment: String,
    /// Write an internal work note instead of a comment
    #[serde(default)]
    pub is_work_note: bool,
}

#[async_trait]
impl ToolExecutor for AddComment {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        if self.comment.trim().is_empty() {
            return Err(ToolError::MissingArgument("comment".to_string()));
        }

        let (field, message) = if self.is_work_note {
            ("work_notes", "Work note added successfully")
        } else {
            ("comments", "Comment added successfully")
        };

        let sys_id = resolve_sys_id(ctx, &self.incident_id).await?;
        let body = FieldMap::new().set(field, self.comment.as_str()).into_value();
        let record: IncidentRef = ctx.client.put(&record_endpoint(&sys_id), &body).await?;

        ToolOutput::json_value(IncidentResponse::ok(message, record))
    }
}

// ============================================================================
// resolve_incident
// ============================================================================

/// Resolve an incident
#[incident_tool(
    name = "resolve_incident",
    description = "Resolve an incident with a resolution code and notes",
    operation = "write"
)]
pub struct ResolveIncident {
    /// Incident sys_id or number
    pub incident_id: String,
    /// Close code (e.g., "Solved (Permanently)")
    pub resolution_code: String,
    /// Resolution notes
    pub resolution_notes: String,
}

#[async_trait]
impl ToolExecutor for ResolveIncident {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let sys_id = resolve_sys_id(ctx, &self.incident_id).await?;

        let body = FieldMap::new()
            .set("state", STATE_RESOLVED)
            .set("close_code", self.resolution_code.as_str())
            .set("close_notes", self.resolution_notes.as_str())
            .set("resolved_at", "now")
            .into_value();
        let record: IncidentRef = ctx.client.put(&record_endpoint(&sys_id), &body).await?;

        ToolOutput::json_value(IncidentResponse::ok(
            "Incident resolved successfully",
            record,
        ))
    }
}
