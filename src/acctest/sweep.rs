//! Cleanup of resources left behind by interrupted acceptance runs.

use super::TEST_NAME_PREFIX;
use crate::api::{ApiError, KubermaticClient};
use crate::id::NodeDeploymentId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Swept {
    Deleted,
    AlreadyGone,
    /// Not created by the acceptance tests; carries the resource's name.
    Skipped(String),
}

/// Deletes a project, but only one whose name marks it as created by an
/// acceptance run.
pub async fn sweep_project(client: &KubermaticClient, project_id: &str) -> Result<Swept, ApiError> {
    let project = match client.get_project(project_id).await {
        Ok(p) => p,
        Err(e) if e.is_not_found() => return Ok(Swept::AlreadyGone),
        Err(e) => return Err(e),
    };

    if !project.name.starts_with(TEST_NAME_PREFIX) {
        tracing::warn!(project_id, name = %project.name, "not an acceptance project, skipping");
        return Ok(Swept::Skipped(project.name));
    }

    match client.delete_project(project_id).await {
        Ok(()) => Ok(Swept::Deleted),
        Err(e) if e.is_not_found() => Ok(Swept::AlreadyGone),
        Err(e) => Err(e),
    }
}

pub async fn sweep_node_deployment(
    client: &KubermaticClient,
    id: &NodeDeploymentId,
) -> Result<Swept, ApiError> {
    match client.delete_node_deployment(id).await {
        Ok(()) => Ok(Swept::Deleted),
        Err(e) if e.is_not_found() => {
            tracing::info!(%id, "node deployment already deleted");
            Ok(Swept::AlreadyGone)
        }
        Err(e) => Err(e),
    }
}
