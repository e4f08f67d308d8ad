//! The reconciliation engine: desired-state computation plus the corrective
//! actions of one pass. Stateless across passes; everything is re-derived
//! from the CR spec and re-queried from the cluster each time, so a pass is
//! safe to repeat and repetition is the recovery mechanism.

pub mod desired;
pub mod gc;
pub mod namespaces;
pub mod quotas;
pub mod teardown;

// Unit tests for the full pass live in a sibling module file
#[cfg(test)]
mod reconcile_tests;

use std::time::Duration;

use tracing::{instrument, warn};

use crate::cluster::{ClusterError, ClusterOps};
use crate::crd::namespace_set::NamespaceSetSpec;

pub use desired::{DesiredNamespace, SpecError, build_desired, namespace_name};
pub use gc::DeletionResult;
pub use namespaces::NamespaceOutcome;
pub use quotas::QuotaOutcome;

/// What happened to one desired entry within a pass.
#[derive(Debug)]
pub struct EntryResult {
    pub name: String,
    pub namespace: Result<NamespaceOutcome, ClusterError>,
    /// `None` when the namespace step already failed for this entry.
    pub quota: Option<Result<QuotaOutcome, ClusterError>>,
}

impl EntryResult {
    pub fn failed(&self) -> bool {
        self.namespace.is_err() || matches!(self.quota, Some(Err(_)))
    }
}

#[derive(Debug, Default)]
pub struct ReconcileSummary {
    pub entries: Vec<EntryResult>,
    pub deletions: Vec<DeletionResult>,
}

impl ReconcileSummary {
    pub fn desired_count(&self) -> usize {
        self.entries.len()
    }

    pub fn created(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.namespace, Ok(NamespaceOutcome::Created)))
            .count()
    }

    pub fn deleted(&self) -> usize {
        self.deletions.iter().filter(|d| d.result.is_ok()).count()
    }
}

/// One full reconcile pass: ensure every desired namespace and its quota,
/// then garbage-collect managed namespaces that are no longer declared.
///
/// All creations and updates complete (or fail individually) before the
/// deletion scan runs, so a namespace is never deleted and recreated within
/// the same pass. Rejects the spec up front when two declarations collide on
/// a derived name.
#[instrument(skip_all)]
pub async fn reconcile_set(
    cluster: &dyn ClusterOps,
    spec: &NamespaceSetSpec,
    settle: Duration,
) -> Result<ReconcileSummary, SpecError> {
    let desired = build_desired(spec)?;

    let mut summary = ReconcileSummary::default();
    for (name, entry) in &desired {
        summary
            .entries
            .push(reconcile_entry(cluster, name, entry, settle).await);
    }

    summary.deletions = gc::reconcile_deletions(cluster, &desired).await;

    Ok(summary)
}

async fn reconcile_entry(
    cluster: &dyn ClusterOps,
    name: &str,
    entry: &DesiredNamespace,
    settle: Duration,
) -> EntryResult {
    let namespace = namespaces::ensure_namespace(
        cluster,
        name,
        &entry.owner_team,
        &entry.ns_type,
    )
    .await;

    match &namespace {
        Ok(NamespaceOutcome::Created) => {
            // The store is eventually consistent: an immediate write into
            // the new namespace may race its availability.
            if !settle.is_zero() {
                tokio::time::sleep(settle).await;
            }
        }
        Ok(NamespaceOutcome::AlreadyExists) => {}
        Err(e) => {
            warn!(namespace = %name, error = %e, "entry failed; continuing with remaining entries");
            return EntryResult {
                name: name.to_string(),
                namespace,
                quota: None,
            };
        }
    }

    // Quota is ensured even when the namespace pre-existed.
    let quota = quotas::ensure_quota(cluster, name, &entry.quota_hard).await;
    if let Err(e) = &quota {
        warn!(namespace = %name, error = %e, "quota reconciliation failed; namespace left as-is");
    }

    EntryResult {
        name: name.to_string(),
        namespace,
        quota: Some(quota),
    }
}
