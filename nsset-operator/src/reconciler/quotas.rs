use std::collections::BTreeMap;

use tracing::info;

use crate::cluster::{ClusterError, ClusterOps};
use crate::labels;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuotaOutcome {
    Created,
    Updated,
    Skipped,
}

/// Ensure the namespace's quota matches the declared hard limits via
/// read-then-create-or-replace. A present quota is fully replaced, never
/// merged. Empty limits skip without touching the cluster.
pub async fn ensure_quota(
    cluster: &dyn ClusterOps,
    namespace: &str,
    hard: &BTreeMap<String, String>,
) -> Result<QuotaOutcome, ClusterError> {
    if hard.is_empty() {
        return Ok(QuotaOutcome::Skipped);
    }

    let name = labels::quota_name(namespace);
    match cluster.get_quota(namespace, &name).await {
        Ok(()) => {
            cluster.replace_quota(namespace, &name, hard).await?;
            info!(%namespace, quota = %name, "replaced resource quota");
            Ok(QuotaOutcome::Updated)
        }
        Err(ClusterError::NotFound) => {
            cluster.create_quota(namespace, &name, hard).await?;
            info!(%namespace, quota = %name, "created resource quota");
            Ok(QuotaOutcome::Created)
        }
        Err(e) => Err(e),
    }
}
