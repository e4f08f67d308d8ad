use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::cluster::{ClusterError, ClusterOps};
use crate::crd::namespace_set::NamespaceSetSpec;

use super::DeletionResult;
use super::desired::namespace_name;

/// Delete every namespace the CR's last-known spec declares. Runs when the
/// NamespaceSet itself is removed. Trusts the declared team lists rather
/// than the managed-by label set; colliding declarations collapse into one
/// delete. Already-gone counts as success, any other error is recorded and
/// does not stop the rest.
pub async fn delete_declared(
    cluster: &dyn ClusterOps,
    spec: &NamespaceSetSpec,
) -> Vec<DeletionResult> {
    let mut names = BTreeSet::new();
    for team in spec.teams.as_deref().unwrap_or_default() {
        let Some(team_name) = team.name.as_deref().filter(|n| !n.is_empty())
        else {
            continue;
        };
        for suffix in team.namespaces.as_deref().unwrap_or_default() {
            names.insert(namespace_name(team_name, suffix));
        }
    }

    let mut results = Vec::new();
    for name in names {
        let result = match cluster.delete_namespace(&name).await {
            Ok(()) => {
                info!(namespace = %name, "deleted namespace for removed NamespaceSet");
                Ok(())
            }
            Err(ClusterError::NotFound) => {
                info!(namespace = %name, "namespace already gone");
                Ok(())
            }
            Err(e) => {
                warn!(namespace = %name, error = %e, "failed to delete namespace");
                Err(e)
            }
        };
        results.push(DeletionResult { name, result });
    }
    results
}
