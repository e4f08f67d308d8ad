//! Identifying labels for namespaces owned by this operator.

use std::collections::BTreeMap;

pub const MANAGED_BY_LABEL: &str = "managed-by";
pub const MANAGED_BY_VALUE: &str = "namespace-operator";
pub const OWNER_TEAM_LABEL: &str = "owner-team";
pub const NS_TYPE_LABEL: &str = "ns-type";

const QUOTA_NAME_PREFIX: &str = "rq-";

/// Exact-match selector for every namespace this operator owns. Any
/// namespace carrying this label is a deletion candidate once it drops out
/// of the desired set.
pub fn managed_selector() -> String {
    format!("{}={}", MANAGED_BY_LABEL, MANAGED_BY_VALUE)
}

/// Full label set stamped onto a namespace at creation time.
pub fn ownership_labels(
    owner_team: &str,
    ns_type: &str,
) -> BTreeMap<String, String> {
    BTreeMap::from([
        (MANAGED_BY_LABEL.to_string(), MANAGED_BY_VALUE.to_string()),
        (OWNER_TEAM_LABEL.to_string(), owner_team.to_string()),
        (NS_TYPE_LABEL.to_string(), ns_type.to_string()),
    ])
}

/// Deterministic name of the quota object inside a managed namespace.
pub fn quota_name(namespace: &str) -> String {
    format!("{}{}", QUOTA_NAME_PREFIX, namespace)
}
