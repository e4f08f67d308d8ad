#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use crate::cluster::fake::{FakeCluster, Op};
    use crate::crd::namespace_set::{
        NamespaceSetSpec, ResourceQuotaPolicy, TeamSpec,
    };
    use crate::reconciler::{
        NamespaceOutcome, QuotaOutcome, SpecError, reconcile_set, teardown,
    };

    fn team(name: &str, namespaces: &[&str], cpu: Option<&str>) -> TeamSpec {
        TeamSpec {
            name: Some(name.to_string()),
            namespaces: Some(
                namespaces.iter().map(|s| s.to_string()).collect(),
            ),
            resource_quota: cpu.map(|q| ResourceQuotaPolicy {
                hard: BTreeMap::from([("cpu".to_string(), q.to_string())]),
            }),
        }
    }

    fn spec_of(teams: Vec<TeamSpec>) -> NamespaceSetSpec {
        NamespaceSetSpec { teams: Some(teams) }
    }

    async fn run(
        cluster: &FakeCluster,
        spec: &NamespaceSetSpec,
    ) -> crate::reconciler::ReconcileSummary {
        reconcile_set(cluster, spec, Duration::ZERO).await.unwrap()
    }

    #[tokio::test]
    async fn first_pass_creates_namespace_and_quota() {
        let cluster = FakeCluster::new();
        let spec = spec_of(vec![team("core", &["dev"], Some("4"))]);

        let summary = run(&cluster, &spec).await;

        assert_eq!(summary.entries.len(), 1);
        let entry = &summary.entries[0];
        assert_eq!(entry.name, "core-dev");
        assert!(matches!(entry.namespace, Ok(NamespaceOutcome::Created)));
        assert!(matches!(entry.quota, Some(Ok(QuotaOutcome::Created))));
        assert!(cluster.has_namespace("core-dev"));
        assert_eq!(
            cluster.quota_hard("core-dev").unwrap().get("cpu"),
            Some(&"4".to_string())
        );
    }

    #[tokio::test]
    async fn second_identical_pass_is_idempotent() {
        let cluster = FakeCluster::new();
        let spec = spec_of(vec![team("core", &["dev"], Some("4"))]);

        run(&cluster, &spec).await;
        cluster.take_ops();

        let summary = run(&cluster, &spec).await;

        // Re-applying the same spec replaces the quota in place and touches
        // nothing else: zero creates, zero deletes.
        let ops = cluster.take_ops();
        assert_eq!(ops, vec![Op::ReplaceQuota("core-dev".to_string())]);
        let entry = &summary.entries[0];
        assert!(matches!(entry.namespace, Ok(NamespaceOutcome::AlreadyExists)));
        assert!(matches!(entry.quota, Some(Ok(QuotaOutcome::Updated))));
        assert_eq!(
            cluster.quota_hard("core-dev").unwrap().get("cpu"),
            Some(&"4".to_string())
        );
    }

    #[tokio::test]
    async fn creates_missing_and_deletes_undeclared() {
        let cluster = FakeCluster::new();
        cluster.seed_managed_namespace("teama-dev", "teamA", "dev");
        cluster.seed_managed_namespace("teama-staging", "teamA", "staging");

        let spec = spec_of(vec![team("teamA", &["dev", "prod"], None)]);
        let summary = run(&cluster, &spec).await;

        let ops = cluster.take_ops();
        assert!(ops.contains(&Op::CreateNamespace("teama-prod".to_string())));
        assert!(ops.contains(&Op::DeleteNamespace("teama-staging".to_string())));
        assert!(!ops.contains(&Op::DeleteNamespace("teama-dev".to_string())));
        assert!(cluster.has_namespace("teama-dev"));
        assert!(cluster.has_namespace("teama-prod"));
        assert!(!cluster.has_namespace("teama-staging"));
        assert_eq!(summary.created(), 1);
        assert_eq!(summary.deleted(), 1);
    }

    #[tokio::test]
    async fn quota_is_ensured_on_preexisting_unmanaged_namespace() {
        let cluster = FakeCluster::new();
        cluster.seed_unmanaged_namespace("core-dev");

        let spec = spec_of(vec![team("core", &["dev"], Some("2"))]);
        let summary = run(&cluster, &spec).await;

        let entry = &summary.entries[0];
        assert!(matches!(entry.namespace, Ok(NamespaceOutcome::AlreadyExists)));
        assert!(matches!(entry.quota, Some(Ok(QuotaOutcome::Created))));
        // The unlabeled namespace is not a GC candidate either.
        assert!(summary.deletions.is_empty());
        assert!(cluster.has_namespace("core-dev"));
    }

    #[tokio::test]
    async fn quota_without_limits_is_skipped() {
        let cluster = FakeCluster::new();
        let spec = spec_of(vec![team("core", &["dev"], None)]);

        let summary = run(&cluster, &spec).await;

        let entry = &summary.entries[0];
        assert!(matches!(entry.quota, Some(Ok(QuotaOutcome::Skipped))));
        assert!(cluster.quota_hard("core-dev").is_none());
    }

    #[tokio::test]
    async fn quota_failure_does_not_block_other_entries() {
        let cluster = FakeCluster::new();
        cluster.fail_quota_writes_in("alpha-dev");

        let spec = spec_of(vec![
            team("alpha", &["dev"], Some("1")),
            team("beta", &["dev"], Some("2")),
        ]);
        let summary = run(&cluster, &spec).await;

        let alpha = summary
            .entries
            .iter()
            .find(|e| e.name == "alpha-dev")
            .unwrap();
        let beta = summary
            .entries
            .iter()
            .find(|e| e.name == "beta-dev")
            .unwrap();

        // Quota failure is non-fatal: both namespaces exist, exactly one
        // entry is reported as failed.
        assert!(alpha.failed());
        assert!(matches!(alpha.namespace, Ok(NamespaceOutcome::Created)));
        assert!(matches!(alpha.quota, Some(Err(_))));
        assert!(!beta.failed());
        assert!(matches!(beta.quota, Some(Ok(QuotaOutcome::Created))));
        assert!(cluster.has_namespace("alpha-dev"));
        assert!(cluster.has_namespace("beta-dev"));
    }

    #[tokio::test]
    async fn namespace_failure_aborts_entry_but_not_the_pass() {
        let cluster = FakeCluster::new();
        cluster.fail_namespace_create("alpha-dev");

        let spec = spec_of(vec![
            team("alpha", &["dev"], Some("1")),
            team("beta", &["dev"], Some("2")),
        ]);
        let summary = run(&cluster, &spec).await;

        let alpha = summary
            .entries
            .iter()
            .find(|e| e.name == "alpha-dev")
            .unwrap();
        let beta = summary
            .entries
            .iter()
            .find(|e| e.name == "beta-dev")
            .unwrap();

        assert!(alpha.namespace.is_err());
        // Fatal-to-entry: no quota attempt after a namespace failure.
        assert!(alpha.quota.is_none());
        assert!(!beta.failed());
        assert!(cluster.has_namespace("beta-dev"));
    }

    #[tokio::test]
    async fn removing_a_team_deletes_all_its_namespaces() {
        let cluster = FakeCluster::new();
        let full = spec_of(vec![
            team("alpha", &["dev", "prod"], None),
            team("beta", &["dev"], None),
        ]);
        run(&cluster, &full).await;

        let without_alpha = spec_of(vec![team("beta", &["dev"], None)]);
        let summary = run(&cluster, &without_alpha).await;

        assert_eq!(summary.deleted(), 2);
        assert!(!cluster.has_namespace("alpha-dev"));
        assert!(!cluster.has_namespace("alpha-prod"));
        assert!(cluster.has_namespace("beta-dev"));
    }

    #[tokio::test]
    async fn deletion_failure_does_not_abort_other_deletions() {
        let cluster = FakeCluster::new();
        cluster.seed_managed_namespace("alpha-dev", "alpha", "dev");
        cluster.seed_managed_namespace("beta-dev", "beta", "dev");
        cluster.fail_namespace_delete("alpha-dev");

        let summary = run(&cluster, &spec_of(vec![])).await;

        assert_eq!(summary.deletions.len(), 2);
        let alpha = summary
            .deletions
            .iter()
            .find(|d| d.name == "alpha-dev")
            .unwrap();
        let beta = summary
            .deletions
            .iter()
            .find(|d| d.name == "beta-dev")
            .unwrap();
        assert!(alpha.result.is_err());
        assert!(beta.result.is_ok());
        assert!(!cluster.has_namespace("beta-dev"));
    }

    #[tokio::test]
    async fn unmanaged_namespaces_are_never_garbage_collected() {
        let cluster = FakeCluster::new();
        cluster.seed_unmanaged_namespace("stray");

        let summary = run(&cluster, &spec_of(vec![])).await;

        assert!(summary.deletions.is_empty());
        assert!(cluster.has_namespace("stray"));
    }

    #[tokio::test]
    async fn colliding_spec_is_rejected_before_any_side_effect() {
        let cluster = FakeCluster::new();
        let spec = spec_of(vec![
            team("Team", &["dev"], None),
            team("team", &["dev"], None),
        ]);

        let err = reconcile_set(&cluster, &spec, Duration::ZERO)
            .await
            .unwrap_err();

        assert!(matches!(err, SpecError::NameCollision { .. }));
        assert!(cluster.take_ops().is_empty());
    }

    #[tokio::test]
    async fn teardown_deletes_declared_and_tolerates_missing() {
        let cluster = FakeCluster::new();
        cluster.seed_managed_namespace("alpha-dev", "alpha", "dev");
        // alpha-prod is declared but already gone.

        let spec = spec_of(vec![team("alpha", &["dev", "prod"], Some("1"))]);
        let results = teardown::delete_declared(&cluster, &spec).await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.result.is_ok()));
        assert!(!cluster.has_namespace("alpha-dev"));
    }

    #[tokio::test]
    async fn teardown_records_failures_and_continues() {
        let cluster = FakeCluster::new();
        cluster.seed_managed_namespace("alpha-dev", "alpha", "dev");
        cluster.seed_managed_namespace("alpha-prod", "alpha", "prod");
        cluster.fail_namespace_delete("alpha-dev");

        let spec = spec_of(vec![team("alpha", &["dev", "prod"], None)]);
        let results = teardown::delete_declared(&cluster, &spec).await;

        let dev = results.iter().find(|r| r.name == "alpha-dev").unwrap();
        let prod = results.iter().find(|r| r.name == "alpha-prod").unwrap();
        assert!(dev.result.is_err());
        assert!(prod.result.is_ok());
        assert!(!cluster.has_namespace("alpha-prod"));
    }
}
