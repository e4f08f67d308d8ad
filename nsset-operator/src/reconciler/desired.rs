use std::collections::BTreeMap;

use crate::crd::namespace_set::NamespaceSetSpec;

/// Derived view of one namespace the operator should own. Rebuilt from the
/// CR spec on every pass and keyed by the derived namespace name; never
/// persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DesiredNamespace {
    pub owner_team: String,
    pub ns_type: String,
    /// Hard quota limits; empty means no quota enforcement.
    pub quota_hard: BTreeMap<String, String>,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SpecError {
    /// Two declared (team, suffix) pairs case-fold to the same namespace
    /// name. Accepting the spec would silently drop one of them, so it is
    /// rejected instead.
    #[error(
        "namespace name collision: `{name}` is declared by team `{first_team}` and team `{second_team}`"
    )]
    NameCollision {
        name: String,
        first_team: String,
        second_team: String,
    },
}

/// Derive the namespace name for a team and suffix: both parts lower-cased,
/// joined with `-`. Pure and deterministic, so the same declaration maps to
/// the same namespace on every pass regardless of ordering.
pub fn namespace_name(team: &str, suffix: &str) -> String {
    format!("{}-{}", team.to_lowercase(), suffix.to_lowercase())
}

/// Build the desired mapping from the CR spec. Teams without a name are
/// skipped, a missing quota means no enforcement. Never touches the cluster.
pub fn build_desired(
    spec: &NamespaceSetSpec,
) -> Result<BTreeMap<String, DesiredNamespace>, SpecError> {
    let mut desired = BTreeMap::new();
    for team in spec.teams.as_deref().unwrap_or_default() {
        let Some(team_name) = team.name.as_deref().filter(|n| !n.is_empty())
        else {
            continue;
        };
        let hard = team
            .resource_quota
            .as_ref()
            .map(|q| q.hard.clone())
            .unwrap_or_default();
        for suffix in team.namespaces.as_deref().unwrap_or_default() {
            let name = namespace_name(team_name, suffix);
            let entry = DesiredNamespace {
                owner_team: team_name.to_string(),
                ns_type: suffix.clone(),
                quota_hard: hard.clone(),
            };
            if let Some(previous) = desired.insert(name.clone(), entry) {
                return Err(SpecError::NameCollision {
                    name,
                    first_team: previous.owner_team,
                    second_team: team_name.to_string(),
                });
            }
        }
    }
    Ok(desired)
}
