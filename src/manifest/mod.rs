//! Manifest and outputs emission.
//!
//! Renders a finished `TopologyGraph` as `manifest.json` for the
//! provisioning backend and `outputs.yaml` for humans.

pub mod types;

pub use types::{Manifest, ManifestMetadata, Resource, ResourceType};

use crate::entry_point::ListenerAction;
use crate::graph::{Output, TopologyGraph};
use crate::network::SubnetKind;
use crate::routing::RouteTarget;
use crate::security::EdgeSource;
use crate::service::ServiceResource;
use chrono::Utc;
use color_eyre::eyre::WrapErr;
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const OUTPUTS_FILE: &str = "outputs.yaml";

fn subnet_id(name: &str) -> String {
    format!("subnet-{}", name)
}

fn boundary_id(name: &str) -> String {
    format!("sg-{}", name)
}

fn secret_id(name: &str) -> String {
    format!("secret-{}", name)
}

/// Build the resource manifest, resources in dependency order
pub fn build_manifest(graph: &TopologyGraph) -> serde_json::Result<Manifest> {
    let mut resources = Vec::new();
    let subnets_of = |kind: SubnetKind| -> Vec<String> {
        graph
            .network
            .as_ref()
            .and_then(|n| n.group(kind))
            .map(|g| g.subnets.iter().map(|s| subnet_id(&s.name)).collect())
            .unwrap_or_default()
    };

    if let Some(network) = &graph.network {
        resources.push(Resource::new(
            network.id(),
            ResourceType::Network,
            json!({
                "cidr": network.cidr(),
                "zones": network.zones(),
                "nat_gateways": network.nat_gateways(),
            }),
        ));
        for group in network.groups() {
            for subnet in &group.subnets {
                resources.push(
                    Resource::new(
                        subnet_id(&subnet.name),
                        ResourceType::Subnet,
                        json!({ "kind": group.kind, "zone": subnet.zone, "cidr": subnet.cidr }),
                    )
                    .depending_on([network.id()]),
                );
            }
        }
    }
    let network_id: Vec<String> = graph.network.iter().map(|n| n.id().to_string()).collect();

    for boundary in graph.security.boundaries() {
        resources.push(
            Resource::new(
                boundary_id(boundary.id.as_str()),
                ResourceType::SecurityBoundary,
                json!({ "owner": boundary.owner }),
            )
            .depending_on(network_id.iter().cloned()),
        );
    }

    // Ingress rules are separate resources so mutual edges do not form a cycle
    for edge in graph.security.edges() {
        let (source, logical_id) = match &edge.from {
            EdgeSource::Boundary(from) => (
                Some(boundary_id(from.as_str())),
                format!("ingress-{}-from-{}-{}-{}", edge.to, from, edge.protocol, edge.port),
            ),
            EdgeSource::AnyIpv4 => (
                None,
                format!("ingress-{}-from-anywhere-{}-{}", edge.to, edge.protocol, edge.port),
            ),
        };
        resources.push(
            Resource::new(logical_id, ResourceType::IngressRule, serde_json::to_value(edge)?)
                .depending_on([boundary_id(edge.to.as_str())])
                .depending_on(source),
        );
    }

    for secret in graph.secrets.secrets() {
        resources.push(Resource::new(
            secret_id(&secret.name),
            ResourceType::Secret,
            serde_json::to_value(secret)?,
        ));
    }

    if let Some(entry_point) = &graph.entry_point {
        resources.push(
            Resource::new(
                entry_point.id.as_str(),
                ResourceType::EntryPoint,
                json!({ "placement": entry_point.placement, "domain_name": entry_point.domain_name }),
            )
            .depending_on([boundary_id(entry_point.boundary.as_str())])
            .depending_on(subnets_of(SubnetKind::Public)),
        );

        let fallback = graph.routes.as_ref().and_then(|r| r.default_route());
        for listener in &entry_point.listeners {
            let mut properties = serde_json::to_value(listener)?;
            if listener.action == ListenerAction::ServeRules {
                if let Some(route) = fallback {
                    properties["default_action"] = serde_json::to_value(&route.target)?;
                }
            }
            resources.push(
                Resource::new(listener.id.as_str(), ResourceType::Listener, properties)
                    .depending_on([entry_point.id.as_str()]),
            );
        }
    }

    for store in &graph.data_stores {
        resources.push(
            Resource::new(format!("datastore-{}", store.name), ResourceType::DataStore, serde_json::to_value(store)?)
                .depending_on([boundary_id(store.boundary.as_str())])
                .depending_on(subnets_of(SubnetKind::PrivateWithEgress)),
        );
    }

    for service in &graph.services {
        let name = service.name();
        let secrets: Vec<String> = service.task.secrets.iter().map(|b| secret_id(&b.secret)).collect();
        let logs = format!("{}-logs", name);
        let task = format!("{}-task", name);

        resources.push(Resource::new(
            logs.as_str(),
            ResourceType::LogGroup,
            serde_json::to_value(&service.task.log_group)?,
        ));
        resources.push(
            Resource::new(task.as_str(), ResourceType::TaskDefinition, serde_json::to_value(&service.task)?)
                .depending_on([logs.as_str()])
                .depending_on(secrets.iter().cloned()),
        );
        resources.push(
            Resource::new(
                format!("{}-target-group", name),
                ResourceType::TargetGroup,
                serde_json::to_value(&service.target_group)?,
            )
            .depending_on(network_id.iter().cloned()),
        );
        resources.push(
            Resource::new(
                format!("{}-read-policy", name),
                ResourceType::SecretReadPolicy,
                serde_json::to_value(&service.read_policy)?,
            )
            .depending_on(secrets.iter().cloned()),
        );
    }

    for service in service_order(graph) {
        let name = service.name();
        resources.push(
            Resource::new(
                format!("{}-service", name),
                ResourceType::Service,
                json!({
                    "replicas": service.replicas,
                    "placement": service.placement,
                    "backend": service.backend,
                }),
            )
            .depending_on([
                format!("{}-task", name),
                format!("{}-target-group", name),
                format!("{}-read-policy", name),
                boundary_id(service.boundary.as_str()),
            ])
            .depending_on(subnets_of(SubnetKind::PrivateWithEgress))
            .depending_on(service.depends_on.iter().map(|d| format!("{}-service", d))),
        );
    }

    if let (Some(routes), Some(listener)) = (
        &graph.routes,
        graph.entry_point.as_ref().and_then(|e| e.rules_listener()),
    ) {
        for route in routes.routes().iter().filter(|r| !r.is_default()) {
            let mut resource = Resource::new(
                format!("rule-{}", route.priority),
                ResourceType::ListenerRule,
                serde_json::to_value(route)?,
            )
            .depending_on([listener.id.as_str()]);
            if let RouteTarget::Service { service } = &route.target {
                resource = resource.depending_on([format!("{}-target-group", service)]);
            }
            resources.push(resource);
        }
    }

    Ok(Manifest {
        metadata: ManifestMetadata {
            stack_name: graph.stack_name.clone(),
            generator: format!("stacksynth {}", env!("CARGO_PKG_VERSION")),
            generated_at: Utc::now(),
        },
        resources,
    })
}

/// Services ordered so that each follows the services it depends on.
/// Members of a dependency cycle keep declaration order.
fn service_order(graph: &TopologyGraph) -> Vec<&ServiceResource> {
    let mut pending: Vec<&ServiceResource> = graph.services.iter().collect();
    let mut ordered: Vec<&ServiceResource> = Vec::with_capacity(pending.len());

    while !pending.is_empty() {
        let ready = pending.iter().position(|service| {
            service.depends_on.iter().all(|dependency| {
                ordered.iter().any(|done| done.name() == dependency.as_str())
                    || !pending.iter().any(|p| p.name() == dependency.as_str())
            })
        });
        match ready {
            Some(index) => ordered.push(pending.remove(index)),
            None => {
                log::warn!(
                    "Dependency cycle among services: {}",
                    pending.iter().map(|s| s.name()).collect::<Vec<_>>().join(", ")
                );
                ordered.append(&mut pending);
            }
        }
    }
    ordered
}

#[derive(Serialize)]
struct OutputsDocument<'a> {
    stack_name: &'a str,
    outputs: &'a [Output],
}

/// Render the human-readable outputs list
pub fn render_outputs(graph: &TopologyGraph) -> serde_yaml::Result<String> {
    serde_yaml::to_string(&OutputsDocument {
        stack_name: &graph.stack_name,
        outputs: &graph.outputs,
    })
}

/// Write `manifest.json` and `outputs.yaml` into `output_dir`
pub fn write_artifacts(graph: &TopologyGraph, output_dir: &Path) -> color_eyre::Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(output_dir)
        .wrap_err_with(|| format!("Failed to create output directory '{}'", output_dir.display()))?;

    let manifest = build_manifest(graph).wrap_err("Failed to build resource manifest")?;
    let manifest_path = output_dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(&manifest)?;
    fs::write(&manifest_path, json)
        .wrap_err_with(|| format!("Failed to write '{}'", manifest_path.display()))?;

    let outputs_path = output_dir.join(OUTPUTS_FILE);
    let yaml = render_outputs(graph).wrap_err("Failed to render outputs")?;
    fs::write(&outputs_path, yaml)
        .wrap_err_with(|| format!("Failed to write '{}'", outputs_path.display()))?;

    log::info!(
        "Wrote {} resource(s) to {:?} and {} output(s) to {:?}",
        manifest.resources.len(),
        manifest_path,
        graph.outputs.len(),
        outputs_path
    );
    Ok((manifest_path, outputs_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::{SynthesisOptions, TopologySynthesizer};
    use crate::routing::RouteDeclaration;
    use crate::secrets::{ProvisioningMode, SecretDeclaration};
    use crate::service::ServiceSpec;
    use tempfile::TempDir;

    fn graph() -> TopologyGraph {
        let services = vec![
            ServiceSpec::new("auth", "supertokens:9.0", 3567).with_secret("API_KEY", "ApiKey"),
            ServiceSpec::new("web", "web:latest", 3000).depending_on("auth"),
        ];
        let secrets = vec![SecretDeclaration::new("ApiKey", ProvisioningMode::ManualPlaceholder)];
        let routes = vec![
            RouteDeclaration {
                path: "/v1/auth/*".to_string(),
                service: "auth".to_string(),
                priority: None,
            },
            RouteDeclaration {
                path: "/*".to_string(),
                service: "web".to_string(),
                priority: None,
            },
        ];
        TopologySynthesizer::new(SynthesisOptions::new("atomic"))
            .synthesize(&services, &secrets, &routes)
            .unwrap()
    }

    #[test]
    fn test_dependencies_precede_dependents() {
        let manifest = build_manifest(&graph()).unwrap();
        for (index, resource) in manifest.resources.iter().enumerate() {
            for dependency in &resource.depends_on {
                let position = manifest
                    .resources
                    .iter()
                    .position(|r| &r.logical_id == dependency)
                    .unwrap_or_else(|| panic!("{} depends on missing {}", resource.logical_id, dependency));
                assert!(position < index, "{} listed before {}", resource.logical_id, dependency);
            }
        }
    }

    #[test]
    fn test_rules_and_services_present() {
        let manifest = build_manifest(&graph()).unwrap();
        assert_eq!(manifest.of_type(ResourceType::ListenerRule).count(), 2);
        assert_eq!(manifest.of_type(ResourceType::Service).count(), 2);

        let web = manifest.resource("web-service").unwrap();
        assert!(web.depends_on.contains(&"auth-service".to_string()));
        assert!(web.depends_on.contains(&"sg-web".to_string()));

        let ingress = manifest.resource("ingress-auth-from-web-tcp-3567").unwrap();
        assert_eq!(ingress.depends_on, vec!["sg-auth".to_string(), "sg-web".to_string()]);
        assert!(manifest.resource("ingress-entry-point-from-anywhere-tcp-80").is_some());

        let listener = manifest.resource("entry-point-listener-80").unwrap();
        assert_eq!(listener.properties["default_action"]["type"], "default");
    }

    #[test]
    fn test_manifest_has_no_secret_values() {
        let manifest = build_manifest(&graph()).unwrap();
        let json = serde_json::to_string(&manifest).unwrap();
        assert!(json.contains("atomic/ApiKey"));
        assert!(json.contains("manual-placeholder"));
    }

    #[test]
    fn test_write_artifacts() {
        let dir = TempDir::new().unwrap();
        let (manifest_path, outputs_path) = write_artifacts(&graph(), dir.path()).unwrap();

        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(manifest_path).unwrap()).unwrap();
        assert_eq!(manifest["metadata"]["stack_name"], "atomic");

        let outputs: serde_yaml::Value = serde_yaml::from_str(&fs::read_to_string(outputs_path).unwrap()).unwrap();
        let names: Vec<&str> = outputs["outputs"]
            .as_sequence()
            .unwrap()
            .iter()
            .filter_map(|o| o["name"].as_str())
            .collect();
        assert!(names.contains(&"ApplicationEndpoint"));
        assert!(names.contains(&"ApiKeySecretId"));
    }
}
