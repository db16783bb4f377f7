//! Service-to-service address resolution.
//!
//! Plain environment values may name other services by logical name:
//! `${service:graphql}` becomes that service's backend URL and
//! `${entry_point}` the public application endpoint. Resolution runs after
//! every service is registered, so declaration order does not matter.

use super::types::{Backend, ServiceResource};
use crate::error::{SynthError, SynthResult};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

fn token_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{(?:service:([a-z][a-z0-9-]*)|(entry_point))\}").expect("valid regex")
    })
}

/// Logical name to backend address, filled as services compile
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    backends: BTreeMap<String, Backend>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a compiled service's backend under its stable identifier
    pub fn register(&mut self, resource: &ServiceResource) -> SynthResult<()> {
        let name = resource.name();
        if self.backends.contains_key(name) {
            return Err(SynthError::Conflict {
                name: name.to_string(),
                detail: "a backend is already registered under this service name".to_string(),
            });
        }
        self.backends.insert(name.to_string(), resource.backend.clone());
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Backend> {
        self.backends.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.backends.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

/// Expand `${service:<name>}` and `${entry_point}` in one value.
///
/// Returns the expanded value and the services it referenced. Any other
/// `${...}` text is left untouched.
pub fn interpolate(
    value: &str,
    registry: &BackendRegistry,
    entry_point_url: &str,
    referenced_by: &str,
) -> SynthResult<(String, Vec<String>)> {
    let mut out = String::with_capacity(value.len());
    let mut referenced = Vec::new();
    let mut last = 0;

    for caps in token_pattern().captures_iter(value) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&value[last..whole.start()]);
        if let Some(service) = caps.get(1) {
            let backend = registry.lookup(service.as_str()).ok_or_else(|| SynthError::UnknownService {
                service: service.as_str().to_string(),
                referenced_by: referenced_by.to_string(),
            })?;
            out.push_str(&backend.url());
            referenced.push(service.as_str().to_string());
        } else {
            out.push_str(entry_point_url);
        }
        last = whole.end();
    }
    out.push_str(&value[last..]);

    Ok((out, referenced))
}

/// Resolve every environment value of `resource` in place
pub fn resolve_environment(
    resource: &mut ServiceResource,
    registry: &BackendRegistry,
    entry_point_url: &str,
) -> SynthResult<()> {
    let name = resource.name().to_string();
    for (key, value) in resource.task.environment.iter_mut() {
        let (resolved, referenced) = interpolate(value, registry, entry_point_url, &name)?;
        for service in referenced {
            if !resource.depends_on.contains(&service) {
                log::warn!(
                    "{}: {} references service {} which is not a declared dependency (no allow-edge)",
                    name,
                    key,
                    service
                );
            }
        }
        *value = resolved;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::build_network;
    use crate::secrets::SecretStore;
    use crate::security::SecurityGraph;
    use crate::service::compiler::compile;
    use crate::service::types::ServiceSpec;

    fn registry() -> BackendRegistry {
        let network = build_network("10.0.0.0/16", 2).unwrap();
        let mut security = SecurityGraph::new();
        let mut secrets = SecretStore::new("atomic");
        let mut registry = BackendRegistry::new();
        for (name, port) in [("graphql", 8080), ("handshake", 80)] {
            let resource = compile(
                &ServiceSpec::new(name, "img:1", port),
                &network,
                &mut security,
                &mut secrets,
            )
            .unwrap();
            registry.register(&resource).unwrap();
        }
        registry
    }

    #[test]
    fn test_interpolates_services_and_entry_point() {
        let (value, referenced) = interpolate(
            "${service:graphql}/v1/graphql?cb=${entry_point}/done",
            &registry(),
            "https://app.example.com",
            "functions",
        )
        .unwrap();
        assert_eq!(
            value,
            "http://graphql.atomic.internal:8080/v1/graphql?cb=https://app.example.com/done"
        );
        assert_eq!(referenced, vec!["graphql"]);
    }

    #[test]
    fn test_leaves_other_tokens_alone() {
        let (value, referenced) =
            interpolate("${HOME}/bin:${PATH}", &registry(), "http://lb", "web").unwrap();
        assert_eq!(value, "${HOME}/bin:${PATH}");
        assert!(referenced.is_empty());
    }

    #[test]
    fn test_unknown_service_reference() {
        let err = interpolate("${service:ghost}", &registry(), "http://lb", "oauth").unwrap_err();
        assert!(matches!(err, SynthError::UnknownService { service, referenced_by }
            if service == "ghost" && referenced_by == "oauth"));
    }

    #[test]
    fn test_duplicate_registration_conflicts() {
        let network = build_network("10.0.0.0/16", 2).unwrap();
        let mut security = SecurityGraph::new();
        let mut secrets = SecretStore::new("atomic");
        let resource = compile(
            &ServiceSpec::new("web", "img:1", 80),
            &network,
            &mut security,
            &mut secrets,
        )
        .unwrap();
        let mut registry = BackendRegistry::new();
        registry.register(&resource).unwrap();
        assert!(matches!(registry.register(&resource), Err(SynthError::Conflict { .. })));
    }
}
