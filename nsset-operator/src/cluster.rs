//! Cluster access capability.
//!
//! All reads and writes against the API server go through the [`ClusterOps`]
//! trait so the reconciliation core takes a single injected dependency and
//! can run against an in-memory fake in tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, ResourceQuota, ResourceQuotaSpec};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::{Api, DeleteParams, ListParams, ObjectMeta, PostParams};
use kube::{Client, ResourceExt};

use crate::labels;

#[derive(thiserror::Error, Debug)]
pub enum ClusterError {
    /// The store's "object does not exist" response class. Never treated as
    /// a failure by the reconcilers; it drives the create branch.
    #[error("not found")]
    NotFound,
    #[error("cluster api error: {0}")]
    Api(String),
}

impl From<kube::Error> for ClusterError {
    fn from(e: kube::Error) -> Self {
        match &e {
            kube::Error::Api(ae) if ae.code == 404 => ClusterError::NotFound,
            _ => ClusterError::Api(e.to_string()),
        }
    }
}

/// Identifying labels read back from a managed namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagedNamespace {
    pub name: String,
    pub owner_team: String,
    pub ns_type: String,
}

#[async_trait]
pub trait ClusterOps: Send + Sync {
    async fn get_namespace(&self, name: &str) -> Result<(), ClusterError>;
    async fn create_namespace(
        &self,
        name: &str,
        labels: BTreeMap<String, String>,
    ) -> Result<(), ClusterError>;
    async fn delete_namespace(&self, name: &str) -> Result<(), ClusterError>;
    /// List every namespace carrying the managed-by marker (exact match).
    async fn list_managed_namespaces(
        &self,
    ) -> Result<Vec<ManagedNamespace>, ClusterError>;
    async fn get_quota(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<(), ClusterError>;
    async fn create_quota(
        &self,
        namespace: &str,
        name: &str,
        hard: &BTreeMap<String, String>,
    ) -> Result<(), ClusterError>;
    /// Full replace of the quota's hard limits, never a merge.
    async fn replace_quota(
        &self,
        namespace: &str,
        name: &str,
        hard: &BTreeMap<String, String>,
    ) -> Result<(), ClusterError>;
}

/// Real implementation backed by a kube [`Client`].
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn namespaces(&self) -> Api<Namespace> {
        Api::all(self.client.clone())
    }

    fn quotas(&self, namespace: &str) -> Api<ResourceQuota> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ClusterOps for KubeCluster {
    async fn get_namespace(&self, name: &str) -> Result<(), ClusterError> {
        self.namespaces().get(name).await?;
        Ok(())
    }

    async fn create_namespace(
        &self,
        name: &str,
        labels: BTreeMap<String, String>,
    ) -> Result<(), ClusterError> {
        let ns = Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels: Some(labels),
                ..Default::default()
            },
            ..Default::default()
        };
        self.namespaces().create(&PostParams::default(), &ns).await?;
        Ok(())
    }

    async fn delete_namespace(&self, name: &str) -> Result<(), ClusterError> {
        self.namespaces()
            .delete(name, &DeleteParams::default())
            .await?;
        Ok(())
    }

    async fn list_managed_namespaces(
        &self,
    ) -> Result<Vec<ManagedNamespace>, ClusterError> {
        let lp = ListParams::default().labels(&labels::managed_selector());
        let list = self.namespaces().list(&lp).await?;
        Ok(list
            .items
            .into_iter()
            .map(|ns| {
                let lbls = ns.metadata.labels.clone().unwrap_or_default();
                ManagedNamespace {
                    name: ns.name_any(),
                    owner_team: lbls
                        .get(labels::OWNER_TEAM_LABEL)
                        .cloned()
                        .unwrap_or_else(|| "unknown".to_string()),
                    ns_type: lbls
                        .get(labels::NS_TYPE_LABEL)
                        .cloned()
                        .unwrap_or_else(|| "unknown".to_string()),
                }
            })
            .collect())
    }

    async fn get_quota(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<(), ClusterError> {
        self.quotas(namespace).get(name).await?;
        Ok(())
    }

    async fn create_quota(
        &self,
        namespace: &str,
        name: &str,
        hard: &BTreeMap<String, String>,
    ) -> Result<(), ClusterError> {
        let rq = quota_body(namespace, name, hard, None);
        self.quotas(namespace)
            .create(&PostParams::default(), &rq)
            .await?;
        Ok(())
    }

    async fn replace_quota(
        &self,
        namespace: &str,
        name: &str,
        hard: &BTreeMap<String, String>,
    ) -> Result<(), ClusterError> {
        let api = self.quotas(namespace);
        // A PUT needs the live resourceVersion.
        let existing = api.get(name).await?;
        let rq =
            quota_body(namespace, name, hard, existing.metadata.resource_version);
        api.replace(name, &PostParams::default(), &rq).await?;
        Ok(())
    }
}

fn quota_body(
    namespace: &str,
    name: &str,
    hard: &BTreeMap<String, String>,
    resource_version: Option<String>,
) -> ResourceQuota {
    let hard = hard
        .iter()
        .map(|(k, v)| (k.clone(), Quantity(v.clone())))
        .collect();
    ResourceQuota {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            resource_version,
            ..Default::default()
        },
        spec: Some(ResourceQuotaSpec {
            hard: Some(hard),
            ..Default::default()
        }),
        ..Default::default()
    }
}
