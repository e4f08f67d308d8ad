use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::cluster::{ClusterError, ClusterOps};

use super::DesiredNamespace;

#[derive(Debug)]
pub struct DeletionResult {
    pub name: String,
    pub result: Result<(), ClusterError>,
}

/// Delete managed namespaces that are no longer declared. Only namespaces
/// carrying the managed-by marker are candidates. Each deletion is
/// fire-and-forget: one failure does not keep the rest alive. Quota objects
/// go with their namespace via the store's cascade, not explicitly.
pub async fn reconcile_deletions(
    cluster: &dyn ClusterOps,
    desired: &BTreeMap<String, DesiredNamespace>,
) -> Vec<DeletionResult> {
    let managed = match cluster.list_managed_namespaces().await {
        Ok(list) => list,
        Err(e) => {
            warn!(error = %e, "could not list managed namespaces; skipping deletion scan");
            return Vec::new();
        }
    };

    let mut results = Vec::new();
    for ns in managed {
        if desired.contains_key(&ns.name) {
            continue;
        }
        info!(
            namespace = %ns.name,
            team = %ns.owner_team,
            ns_type = %ns.ns_type,
            "deleting namespace no longer declared"
        );
        let result = cluster.delete_namespace(&ns.name).await;
        if let Err(e) = &result {
            warn!(namespace = %ns.name, error = %e, "failed to delete namespace");
        }
        results.push(DeletionResult {
            name: ns.name,
            result,
        });
    }
    results
}
