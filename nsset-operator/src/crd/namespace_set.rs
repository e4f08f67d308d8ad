use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cluster-scoped declaration of the namespaces each team should have.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema, Default)]
#[kube(
    group = "example.com",
    version = "v1",
    kind = "NamespaceSet",
    plural = "namespacesets",
    status = "NamespaceSetStatus"
)]
pub struct NamespaceSetSpec {
    /// Teams whose namespaces this operator provisions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teams: Option<Vec<TeamSpec>>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct TeamSpec {
    /// Team name; teams without one are skipped, not rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Logical namespace suffixes (e.g. "dev", "prod"). The actual
    /// namespace name is derived as `<team>-<suffix>`, lower-cased.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<Vec<String>>,
    /// Quota applied to every namespace of this team; absent means no
    /// quota enforcement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_quota: Option<ResourceQuotaPolicy>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default)]
pub struct ResourceQuotaPolicy {
    /// Hard limits, e.g. {"cpu": "4", "memory": "8Gi"}.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hard: BTreeMap<String, String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceSetStatus {
    /// Number of namespaces the current spec declares.
    pub managed_namespaces: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
