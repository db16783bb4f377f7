//! Secret read-access policy compilation.
//!
//! Turns the store's per-service grants into the read policy attached to a
//! service's runtime identity. In `minimal` mode the policy lists exactly the
//! granted and shared secrets. `namespace-wildcard` additionally grants the
//! whole `<stack>/*` namespace; the policy is then flagged as widened and
//! still carries the minimal set for audit.

use super::store::SecretStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How service read policies are materialized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecretAccessMode {
    /// Only the secrets each service declared, plus shared ones
    #[default]
    Minimal,
    /// Every secret under the stack namespace (audited convenience mode)
    NamespaceWildcard,
}

/// Read policy attached to one service's runtime identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretReadPolicy {
    pub service: String,
    /// Identifiers explicitly granted to this service
    pub granted: BTreeSet<String>,
    /// Identifiers of secrets marked `shared`
    pub shared: BTreeSet<String>,
    /// Resource patterns the policy actually allows
    pub resources: Vec<String>,
    /// True when `resources` is broader than `granted` + `shared`
    pub widened: bool,
}

impl SecretReadPolicy {
    /// The intended minimal set of identifiers, regardless of widening
    pub fn minimal_set(&self) -> BTreeSet<String> {
        self.granted.union(&self.shared).cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Compile the read policy for `service` from the grants recorded in `store`
pub fn compile_read_policy(store: &SecretStore, service: &str, mode: SecretAccessMode) -> SecretReadPolicy {
    let granted: BTreeSet<String> = store
        .secrets()
        .iter()
        .filter(|s| s.subscribers.contains(service))
        .map(|s| s.id.clone())
        .collect();
    let shared: BTreeSet<String> = store.shared_secrets().map(|s| s.id.clone()).collect();

    let mut resources: Vec<String> = granted.union(&shared).cloned().collect();
    let widened = mode == SecretAccessMode::NamespaceWildcard;
    if widened {
        let wildcard = format!("{}/*", store.namespace());
        log::warn!(
            "Read policy for {} widened to {} (intended minimal set: {} secret(s))",
            service,
            wildcard,
            resources.len()
        );
        resources.push(wildcard);
    }

    SecretReadPolicy {
        service: service.to_string(),
        granted,
        shared,
        resources,
        widened,
    }
}
