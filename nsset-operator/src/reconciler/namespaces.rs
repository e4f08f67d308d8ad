use tracing::{debug, info};

use crate::cluster::{ClusterError, ClusterOps};
use crate::labels;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NamespaceOutcome {
    Created,
    AlreadyExists,
}

/// Ensure a managed namespace exists. An existing namespace is left exactly
/// as found: its labels are not re-synced when the owning team or suffix
/// changes upstream (known limitation). Not-found drives the create branch;
/// any other error aborts this entry only.
pub async fn ensure_namespace(
    cluster: &dyn ClusterOps,
    name: &str,
    owner_team: &str,
    ns_type: &str,
) -> Result<NamespaceOutcome, ClusterError> {
    match cluster.get_namespace(name).await {
        Ok(()) => {
            debug!(namespace = %name, "namespace exists");
            Ok(NamespaceOutcome::AlreadyExists)
        }
        Err(ClusterError::NotFound) => {
            info!(namespace = %name, team = %owner_team, "creating namespace");
            cluster
                .create_namespace(
                    name,
                    labels::ownership_labels(owner_team, ns_type),
                )
                .await?;
            Ok(NamespaceOutcome::Created)
        }
        Err(e) => Err(e),
    }
}
