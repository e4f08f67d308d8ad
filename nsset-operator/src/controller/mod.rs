use std::sync::Arc;

use chrono::Utc;
use futures_util::StreamExt;
use kube::{
    Client, Resource, ResourceExt,
    api::{Api, Patch, PatchParams},
    runtime::{Controller, controller::Action, watcher::Config},
};
use serde_json::json;
use tokio::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::cluster::{ClusterOps, KubeCluster};
use crate::config::OperatorConfig;
use crate::crd::namespace_set::{NamespaceSet, NamespaceSetStatus};
use crate::reconciler::{self, ReconcileSummary, SpecError};

#[derive(thiserror::Error, Debug)]
pub enum ReconcileErr {
    #[error("internal error: {0}")]
    Internal(String),
}

fn into_internal<E: std::fmt::Display>(e: E) -> ReconcileErr {
    ReconcileErr::Internal(e.to_string())
}

#[derive(Clone)]
pub struct ControllerContext {
    pub client: Client,
    pub cluster: Arc<dyn ClusterOps>,
    pub cfg: OperatorConfig,
}

const FINALIZER: &str = "example.com/nsset-finalizer";

pub async fn run_controller(
    client: Client,
    cfg: OperatorConfig,
) -> anyhow::Result<()> {
    let api: Api<NamespaceSet> = Api::all(client.clone());
    let ctx = Arc::new(ControllerContext {
        client: client.clone(),
        cluster: Arc::new(KubeCluster::new(client)),
        cfg,
    });

    Controller::new(api, Config::default())
        .run(reconcile, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((_obj_ref, action)) => {
                    info!("reconciled: requeue={:?}", action)
                }
                Err(e) => error!(error = ?e, "reconcile error"),
            }
        })
        .await;

    Ok(())
}

#[instrument(skip_all, fields(name = %obj.name_any()))]
async fn reconcile(
    obj: Arc<NamespaceSet>,
    ctx: Arc<ControllerContext>,
) -> Result<Action, ReconcileErr> {
    let name = obj.name_any();
    let api: Api<NamespaceSet> = Api::all(ctx.client.clone());

    // Handle delete: tear down declared namespaces (when enabled), then
    // release the finalizer.
    if obj.meta().deletion_timestamp.is_some() {
        if ctx.cfg.delete_on_cr_removal {
            let results =
                reconciler::teardown::delete_declared(ctx.cluster.as_ref(), &obj.spec)
                    .await;
            let failed =
                results.iter().filter(|r| r.result.is_err()).count();
            info!(%name, total = results.len(), failed, "NamespaceSet removed; declared namespaces torn down");
        }
        remove_finalizer(&api, &obj, &name).await?;
        return Ok(Action::await_change());
    }

    if ctx.cfg.delete_on_cr_removal {
        ensure_finalizer(&api, &obj, &name).await?;
    }

    let summary = match reconciler::reconcile_set(
        ctx.cluster.as_ref(),
        &obj.spec,
        ctx.cfg.settle_wait(),
    )
    .await
    {
        Ok(summary) => summary,
        Err(e @ SpecError::NameCollision { .. }) => {
            // Invalid spec: report it and wait for an edit instead of
            // requeueing a pass that cannot succeed.
            warn!(%name, error = %e, "rejecting NamespaceSet spec");
            let status = rejected_status(&obj, e.to_string());
            patch_status(&api, &obj, &name, status).await?;
            return Ok(Action::await_change());
        }
    };

    let failed_entries =
        summary.entries.iter().filter(|e| e.failed()).count();
    let failed_deletions =
        summary.deletions.iter().filter(|d| d.result.is_err()).count();
    info!(
        %name,
        desired = summary.desired_count(),
        created = summary.created(),
        deleted = summary.deleted(),
        failed_entries,
        failed_deletions,
        "reconcile pass complete"
    );

    let status = pass_status(&obj, &summary);
    patch_status(&api, &obj, &name, status).await?;

    Ok(Action::requeue(ctx.cfg.requeue()))
}

async fn ensure_finalizer(
    api: &Api<NamespaceSet>,
    obj: &NamespaceSet,
    name: &str,
) -> Result<(), ReconcileErr> {
    let present = obj
        .meta()
        .finalizers
        .as_ref()
        .map(|f| f.iter().any(|x| x == FINALIZER))
        .unwrap_or(false);
    if present {
        return Ok(());
    }
    let mut finals = obj.meta().finalizers.clone().unwrap_or_default();
    finals.push(FINALIZER.to_string());
    let patch = json!({"metadata": {"finalizers": finals}});
    api.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
        .await
        .map_err(into_internal)?;
    Ok(())
}

async fn remove_finalizer(
    api: &Api<NamespaceSet>,
    obj: &NamespaceSet,
    name: &str,
) -> Result<(), ReconcileErr> {
    let present = obj
        .meta()
        .finalizers
        .as_ref()
        .map(|f| f.iter().any(|x| x == FINALIZER))
        .unwrap_or(false);
    if !present {
        return Ok(());
    }
    let finals = obj
        .meta()
        .finalizers
        .clone()
        .unwrap_or_default()
        .into_iter()
        .filter(|f| f != FINALIZER)
        .collect::<Vec<_>>();
    let patch = json!({"metadata": {"finalizers": finals}});
    api.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
        .await
        .map_err(into_internal)?;
    Ok(())
}

fn pass_status(
    obj: &NamespaceSet,
    summary: &ReconcileSummary,
) -> NamespaceSetStatus {
    let failed_entries =
        summary.entries.iter().filter(|e| e.failed()).count();
    let failed_deletions =
        summary.deletions.iter().filter(|d| d.result.is_err()).count();
    let message = if failed_entries + failed_deletions > 0 {
        Some(format!(
            "{} entries and {} deletions failed; retrying on next pass",
            failed_entries, failed_deletions
        ))
    } else {
        None
    };
    NamespaceSetStatus {
        managed_namespaces: summary.desired_count() as i64,
        observed_generation: obj.meta().generation,
        last_updated: Some(Utc::now().to_rfc3339()),
        message,
    }
}

fn rejected_status(obj: &NamespaceSet, message: String) -> NamespaceSetStatus {
    NamespaceSetStatus {
        managed_namespaces: 0,
        observed_generation: obj.meta().generation,
        last_updated: Some(Utc::now().to_rfc3339()),
        message: Some(message),
    }
}

async fn patch_status(
    api: &Api<NamespaceSet>,
    obj: &NamespaceSet,
    name: &str,
    status: NamespaceSetStatus,
) -> Result<(), ReconcileErr> {
    if !should_patch_status(obj.status.as_ref(), &status) {
        return Ok(());
    }
    let patch = json!({"status": status});
    api.patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
        .await
        .map_err(into_internal)?;
    Ok(())
}

/// Ignore timestamp-only churn so an unchanged pass does not patch status
/// and re-trigger itself.
fn should_patch_status(
    current: Option<&NamespaceSetStatus>,
    desired: &NamespaceSetStatus,
) -> bool {
    match current {
        None => true,
        Some(cur) => {
            let mut cur = cur.clone();
            let mut des = desired.clone();
            cur.last_updated = None;
            des.last_updated = None;
            cur != des
        }
    }
}

fn error_policy(
    _obj: Arc<NamespaceSet>,
    _error: &ReconcileErr,
    _ctx: Arc<ControllerContext>,
) -> Action {
    Action::requeue(Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(count: i64, message: Option<&str>) -> NamespaceSetStatus {
        NamespaceSetStatus {
            managed_namespaces: count,
            observed_generation: Some(1),
            last_updated: Some("2026-01-01T00:00:00Z".to_string()),
            message: message.map(str::to_string),
        }
    }

    #[test]
    fn status_patch_skipped_when_only_timestamp_changes() {
        let mut newer = status(2, None);
        newer.last_updated = Some("2026-01-01T00:05:00Z".to_string());
        assert!(!should_patch_status(Some(&status(2, None)), &newer));
    }

    #[test]
    fn status_patch_applied_on_material_change() {
        assert!(should_patch_status(Some(&status(2, None)), &status(3, None)));
        assert!(should_patch_status(
            Some(&status(2, None)),
            &status(2, Some("1 entries and 0 deletions failed"))
        ));
        assert!(should_patch_status(None, &status(0, None)));
    }
}
