//! Workflow lookup by name.

use glxy_types::WorkflowDescription;

use crate::error::{GalaxyError, Result};
use crate::remote::GalaxyApi;

/// A workflow resolved by name together with its exported definition.
#[derive(Debug, Clone)]
pub struct ResolvedWorkflow {
    pub id: String,
    pub description: WorkflowDescription,
}

impl ResolvedWorkflow {
    /// Identifier used when invoking: the exported uuid, or the listing id for exports without one.
    pub fn invocation_id(&self) -> &str {
        self.description.uuid.as_deref().unwrap_or(&self.id)
    }
}

/// Find the workflow named exactly `name` and download its definition.
pub async fn get_workflow_description(api: &dyn GalaxyApi, name: &str) -> Result<ResolvedWorkflow> {
    let mut workflows = api.workflows_by_name(name).await?;
    workflows.retain(|workflow| workflow.name == name);
    let summary = match workflows.len() {
        0 => return Err(GalaxyError::WorkflowNotFound { name: name.to_string() }),
        1 => workflows.remove(0),
        _ => return Err(GalaxyError::AmbiguousWorkflow { name: name.to_string() }),
    };
    let description = api.export_workflow(&summary.id).await?;
    Ok(ResolvedWorkflow {
        id: summary.id,
        description,
    })
}
