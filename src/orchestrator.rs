//! Topology orchestrator.
//!
//! This module wires the components together in dependency order. A run
//! walks a one-way state machine:
//!
//! ```text
//! Init -> NetworkReady -> BoundariesDeclared -> EdgesApplied
//!      -> ServicesCompiled -> RoutesFinalized -> Emitted
//! ```
//!
//! Every run starts from `Init` with a fresh graph; adding a service means
//! synthesizing again with the larger input. The first failure aborts the
//! run and is returned together with the graph built so far.

use crate::config::{NetworkSettings, StackConfig};
use crate::datastore::{connect_clients, declare_data_store, DataStoreSpec};
use crate::entry_point::{declare_entry_point, open_public_ingress, ENTRY_POINT};
use crate::error::{SynthError, SynthResult};
use crate::graph::{pascal_case, Output, OutputValue, TopologyGraph};
use crate::network::build_network_with;
use crate::routing::{DefaultAction, RouteDeclaration, RoutingTable};
use crate::secrets::{SecretAccessMode, SecretDeclaration};
use crate::security::{BoundaryOwner, EdgeSource, Protocol};
use crate::service::{
    compile_all, compile_with, container_port, resolve_environment, BackendRegistry, CompileContext,
    ServiceId, ServiceSpec,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Phase reached by a synthesis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SynthesisState {
    Init,
    NetworkReady,
    BoundariesDeclared,
    EdgesApplied,
    ServicesCompiled,
    RoutesFinalized,
    Emitted,
}

impl SynthesisState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SynthesisState::Init => "Init",
            SynthesisState::NetworkReady => "NetworkReady",
            SynthesisState::BoundariesDeclared => "BoundariesDeclared",
            SynthesisState::EdgesApplied => "EdgesApplied",
            SynthesisState::ServicesCompiled => "ServicesCompiled",
            SynthesisState::RoutesFinalized => "RoutesFinalized",
            SynthesisState::Emitted => "Emitted",
        }
    }

    /// The only state this one may advance to
    pub fn next(&self) -> Option<SynthesisState> {
        match self {
            SynthesisState::Init => Some(SynthesisState::NetworkReady),
            SynthesisState::NetworkReady => Some(SynthesisState::BoundariesDeclared),
            SynthesisState::BoundariesDeclared => Some(SynthesisState::EdgesApplied),
            SynthesisState::EdgesApplied => Some(SynthesisState::ServicesCompiled),
            SynthesisState::ServicesCompiled => Some(SynthesisState::RoutesFinalized),
            SynthesisState::RoutesFinalized => Some(SynthesisState::Emitted),
            SynthesisState::Emitted => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for SynthesisState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed run: where it stopped, what it had built, and why
#[derive(Debug, thiserror::Error)]
#[error("Synthesis aborted in state {state}: {error}")]
pub struct SynthesisFailure {
    pub state: SynthesisState,
    /// For diagnosis only; never provision from a partial graph
    pub partial: Box<TopologyGraph>,
    #[source]
    pub error: SynthError,
}

/// Stack-wide inputs that are not services, secrets or routes
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    pub stack_name: String,
    pub network: NetworkSettings,
    pub domain_name: Option<String>,
    pub secret_access: SecretAccessMode,
    pub parallel_compile: bool,
    pub data_stores: Vec<DataStoreSpec>,
    pub default_action: DefaultAction,
}

impl SynthesisOptions {
    pub fn new(stack_name: &str) -> Self {
        Self {
            stack_name: stack_name.to_string(),
            network: NetworkSettings::default(),
            domain_name: None,
            secret_access: SecretAccessMode::default(),
            parallel_compile: false,
            data_stores: Vec::new(),
            default_action: DefaultAction::default(),
        }
    }

    pub fn from_config(config: &StackConfig) -> Self {
        Self {
            stack_name: config.general.stack_name.clone(),
            network: config.network.clone(),
            domain_name: config.general.domain_name.clone(),
            secret_access: config.general.secret_access,
            parallel_compile: config.general.parallel_compile,
            data_stores: config.data_stores.clone(),
            default_action: config.default_action.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TopologySynthesizer {
    options: SynthesisOptions,
}

impl TopologySynthesizer {
    pub fn new(options: SynthesisOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SynthesisOptions {
        &self.options
    }

    /// Build the complete topology graph from the declarative inputs
    pub fn synthesize(
        &self,
        services: &[ServiceSpec],
        secrets: &[SecretDeclaration],
        routes: &[RouteDeclaration],
    ) -> Result<TopologyGraph, SynthesisFailure> {
        let mut run = Run::new(&self.options);
        match run.execute(services, secrets, routes) {
            Ok(()) => {
                log::info!(
                    "Synthesized stack {}: {} service(s), {} boundary(ies), {} edge(s), {} output(s)",
                    run.graph.stack_name,
                    run.graph.services.len(),
                    run.graph.security.boundaries().len(),
                    run.graph.security.edges().len(),
                    run.graph.outputs.len()
                );
                Ok(run.graph)
            }
            Err(error) => {
                log::error!("Synthesis aborted in state {}: {}", run.state, error);
                Err(SynthesisFailure {
                    state: run.state,
                    partial: Box::new(run.graph),
                    error,
                })
            }
        }
    }
}

/// Synthesize everything a stack file describes
pub fn synthesize_stack(config: &StackConfig) -> Result<TopologyGraph, SynthesisFailure> {
    TopologySynthesizer::new(SynthesisOptions::from_config(config)).synthesize(
        &config.services,
        &config.secrets,
        &config.routes,
    )
}

/// State of one synthesis run
struct Run<'a> {
    options: &'a SynthesisOptions,
    state: SynthesisState,
    graph: TopologyGraph,
    /// Validated container port per service, filled before any edge is added
    ports: BTreeMap<String, u16>,
}

impl<'a> Run<'a> {
    fn new(options: &'a SynthesisOptions) -> Self {
        Self {
            options,
            state: SynthesisState::Init,
            graph: TopologyGraph::new(&options.stack_name),
            ports: BTreeMap::new(),
        }
    }

    fn execute(
        &mut self,
        services: &[ServiceSpec],
        secrets: &[SecretDeclaration],
        routes: &[RouteDeclaration],
    ) -> SynthResult<()> {
        self.build_network()?;
        self.advance(SynthesisState::NetworkReady);

        self.declare_boundaries(services, secrets)?;
        self.advance(SynthesisState::BoundariesDeclared);

        self.apply_edges(services, routes)?;
        self.advance(SynthesisState::EdgesApplied);

        self.compile_services(services)?;
        self.advance(SynthesisState::ServicesCompiled);

        self.finalize_routes(routes)?;
        self.advance(SynthesisState::RoutesFinalized);

        self.emit_outputs()?;
        self.advance(SynthesisState::Emitted);
        Ok(())
    }

    fn advance(&mut self, next: SynthesisState) {
        debug_assert_eq!(self.state.next(), Some(next), "synthesis states are one-way");
        log::info!("{} -> {}", self.state, next);
        self.state = next;
    }

    fn build_network(&mut self) -> SynthResult<()> {
        let network = build_network_with("network", &self.options.network)?;
        self.graph.network = Some(network);
        Ok(())
    }

    /// Create every boundary before any edge can reference one, and declare
    /// secrets so grants made during compilation always find them.
    fn declare_boundaries(&mut self, services: &[ServiceSpec], secrets: &[SecretDeclaration]) -> SynthResult<()> {
        let network = self.graph.network.as_ref().ok_or_else(missing_network)?;

        let entry_point =
            declare_entry_point(network, self.options.domain_name.as_deref(), &mut self.graph.security)?;
        self.graph.entry_point = Some(entry_point);

        let mut seen = HashSet::new();
        for spec in services {
            if !seen.insert(spec.name.as_str()) {
                return Err(SynthError::Conflict {
                    name: spec.name.clone(),
                    detail: "service declared more than once".to_string(),
                });
            }
            self.graph
                .security
                .declare_boundary(&spec.name, BoundaryOwner::Service(spec.name.clone()))?;
        }

        for store in &self.options.data_stores {
            let resource = declare_data_store(store, network, &self.options.stack_name, &mut self.graph.security)?;
            self.graph.data_stores.push(resource);
        }

        for declaration in secrets {
            self.graph.secrets.declare(declaration)?;
        }
        Ok(())
    }

    fn apply_edges(&mut self, services: &[ServiceSpec], routes: &[RouteDeclaration]) -> SynthResult<()> {
        for spec in services {
            self.ports.insert(spec.name.clone(), container_port(spec)?);
        }

        let entry_point = self.graph.entry_point.as_ref().ok_or_else(|| {
            SynthError::Configuration("entry point was not declared".to_string())
        })?;
        open_public_ingress(entry_point, &mut self.graph.security)?;

        // The entry point reaches exactly the services it forwards to.
        let mut forwarded: Vec<(&str, &str)> = routes
            .iter()
            .map(|r| (r.service.as_str(), r.path.as_str()))
            .collect();
        if let DefaultAction::Forward { service } = &self.options.default_action {
            forwarded.push((service.as_str(), "default action"));
        }
        for (service, referenced_by) in forwarded {
            let port = self.port_of(service, referenced_by)?;
            self.graph.security.allow(
                EdgeSource::boundary(ENTRY_POINT),
                service,
                Protocol::Tcp,
                port,
                &format!("entry point forwards to {}", service),
            )?;
        }

        for spec in services {
            for dependency in &spec.depends_on {
                let port = self.port_of(dependency, &spec.name)?;
                self.graph.security.allow(
                    EdgeSource::boundary(spec.name.as_str()),
                    dependency,
                    Protocol::Tcp,
                    port,
                    &format!("{} calls {}", spec.name, dependency),
                )?;
            }
        }

        for store in &self.graph.data_stores {
            connect_clients(store, &mut self.graph.security)?;
        }
        Ok(())
    }

    fn port_of(&self, service: &str, referenced_by: &str) -> SynthResult<u16> {
        self.ports.get(service).copied().ok_or_else(|| SynthError::UnknownService {
            service: service.to_string(),
            referenced_by: referenced_by.to_string(),
        })
    }

    fn compile_services(&mut self, services: &[ServiceSpec]) -> SynthResult<()> {
        let network = self.graph.network.as_ref().ok_or_else(missing_network)?;
        let ctx = CompileContext {
            network,
            namespace: &self.options.stack_name,
            access_mode: self.options.secret_access,
        };

        if self.options.parallel_compile {
            self.graph.services = compile_all(
                services,
                &ctx,
                &mut self.graph.security,
                &mut self.graph.secrets,
                true,
            )?;
        } else {
            for spec in services {
                let resource = compile_with(spec, &ctx, &mut self.graph.security, &mut self.graph.secrets)?;
                self.graph.services.push(resource);
            }
        }

        let mut backends = BackendRegistry::new();
        for resource in &self.graph.services {
            backends.register(resource)?;
        }

        let endpoint = self
            .graph
            .entry_point
            .as_ref()
            .map(|e| e.application_endpoint())
            .unwrap_or_default();
        for resource in self.graph.services.iter_mut() {
            resolve_environment(resource, &backends, &endpoint)?;
        }
        Ok(())
    }

    fn finalize_routes(&mut self, routes: &[RouteDeclaration]) -> SynthResult<()> {
        let mut table = RoutingTable::new();
        for route in routes {
            table.add_route(&route.path, &ServiceId::new(route.service.as_str()), route.priority.into())?;
        }
        self.graph.routes = Some(table.finalize(self.options.default_action.clone())?);
        Ok(())
    }

    fn emit_outputs(&mut self) -> SynthResult<()> {
        let graph = &self.graph;
        let mut outputs = OutputSet::default();

        if let Some(network) = &graph.network {
            outputs.add(
                Output::new("NetworkId", OutputValue::reference(network.id(), "Id"))
                    .described(format!("Network {}", network.cidr())),
                "network",
            )?;
        }

        if let Some(entry_point) = &graph.entry_point {
            outputs.add(Output::new("EntryPointDnsName", entry_point.dns_name()), "entry point")?;
            outputs.add(
                Output::new("ApplicationEndpoint", OutputValue::literal(entry_point.application_endpoint()))
                    .described("Public URL of the application"),
                "entry point",
            )?;
            for listener in &entry_point.listeners {
                outputs.add(
                    Output::new(
                        format!("{}ListenerId", listener.protocol.output_prefix()),
                        OutputValue::reference(&listener.id, "Id"),
                    ),
                    format!("listener {}", listener.id),
                )?;
            }
        }

        for store in &graph.data_stores {
            outputs.add(
                Output::new(format!("{}Endpoint", pascal_case(&store.name)), OutputValue::literal(&store.endpoint))
                    .described(format!("{} data store", store.kind.as_str())),
                format!("data store {}", store.name),
            )?;
        }

        for service in &graph.services {
            outputs.add(
                Output::new(
                    format!("{}Backend", pascal_case(service.name())),
                    OutputValue::literal(service.backend.url()),
                ),
                format!("service {}", service.name()),
            )?;
        }

        for secret in graph.secrets.secrets() {
            let output = Output::new(format!("{}SecretId", pascal_case(&secret.name)), OutputValue::literal(&secret.id));
            let output = if secret.requires_manual_population() {
                output
                    .described(format!("Populate {} manually before first use", secret.id))
                    .manual()
            } else {
                match &secret.description {
                    Some(description) => output.described(description.clone()),
                    None => output,
                }
            };
            outputs.add(output, format!("secret {}", secret.name))?;
        }

        let widened: Vec<&str> = graph
            .services
            .iter()
            .filter(|s| s.read_policy.widened)
            .map(|s| s.name())
            .collect();
        if !widened.is_empty() {
            outputs.add(
                Output::new(
                    "SecretAccessWidened",
                    OutputValue::literal(format!("{}/*", graph.secrets.namespace())),
                )
                .described(format!(
                    "Secret read access widened to the stack namespace for: {}",
                    widened.join(", ")
                )),
                "secret access policy",
            )?;
        }

        let manual = outputs.outputs.iter().filter(|o| o.requires_manual_population).count();
        if manual > 0 {
            log::warn!("{} secret(s) require manual population before first use", manual);
        }
        self.graph.outputs = outputs.outputs;
        Ok(())
    }
}

/// Outputs keyed by name, remembering what produced each one
#[derive(Default)]
struct OutputSet {
    outputs: Vec<Output>,
    sources: HashMap<String, String>,
}

impl OutputSet {
    /// Names derived from different resources must not collide
    fn add(&mut self, output: Output, source: impl Into<String>) -> SynthResult<()> {
        let source = source.into();
        if let Some(first) = self.sources.get(&output.name) {
            return Err(SynthError::Conflict {
                name: output.name.clone(),
                detail: format!("output name produced by both {} and {}", first, source),
            });
        }
        self.sources.insert(output.name.clone(), source);
        self.outputs.push(output);
        Ok(())
    }
}

fn missing_network() -> SynthError {
    SynthError::Configuration("network was not built".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastore::DataStoreKind;
    use crate::secrets::ProvisioningMode;

    fn route(path: &str, service: &str) -> RouteDeclaration {
        RouteDeclaration {
            path: path.to_string(),
            service: service.to_string(),
            priority: None,
        }
    }

    #[test]
    fn test_state_machine_is_linear() {
        let mut state = SynthesisState::Init;
        let mut visited = vec![state];
        while let Some(next) = state.next() {
            assert!(next > state);
            state = next;
            visited.push(state);
        }
        assert_eq!(visited.len(), 7);
        assert!(state.is_terminal());
        assert_eq!(state, SynthesisState::Emitted);
    }

    #[test]
    fn test_minimal_stack() {
        let synthesizer = TopologySynthesizer::new(SynthesisOptions::new("demo"));
        let graph = synthesizer
            .synthesize(&[ServiceSpec::new("web", "nginx:1.27", 80)], &[], &[route("/*", "web")])
            .unwrap();

        assert!(graph.network.is_some());
        assert_eq!(graph.services.len(), 1);
        assert_eq!(graph.routes.as_ref().unwrap().len(), 2);
        let inbound: Vec<String> = graph.security.edges_into("web").iter().map(|e| e.to_string()).collect();
        assert_eq!(inbound, vec!["entry-point -> web tcp/80"]);
        assert_eq!(
            graph.output("WebBackend").unwrap().value,
            OutputValue::literal("http://web.demo.internal:80")
        );
    }

    #[test]
    fn test_failure_keeps_partial_graph() {
        let synthesizer = TopologySynthesizer::new(SynthesisOptions::new("demo"));
        let failure = synthesizer
            .synthesize(&[ServiceSpec::new("web", "nginx:1.27", 80)], &[], &[route("/*", "ghost")])
            .unwrap_err();

        assert_eq!(failure.state, SynthesisState::BoundariesDeclared);
        assert!(matches!(&failure.error, SynthError::UnknownService { service, .. } if service == "ghost"));
        assert!(failure.partial.network.is_some());
        assert!(failure.partial.security.contains("web"));
        assert!(failure.partial.services.is_empty());
        assert!(failure.partial.routes.is_none());
    }

    #[test]
    fn test_bad_port_is_invalid_spec() {
        let synthesizer = TopologySynthesizer::new(SynthesisOptions::new("demo"));
        let failure = synthesizer
            .synthesize(&[ServiceSpec::new("web", "nginx:1.27", 0)], &[], &[])
            .unwrap_err();
        assert!(matches!(failure.error, SynthError::InvalidSpec { .. }));
    }

    #[test]
    fn test_network_failure_stops_at_init() {
        let mut options = SynthesisOptions::new("demo");
        options.network.az_count = 1;
        let failure = TopologySynthesizer::new(options)
            .synthesize(&[ServiceSpec::new("web", "nginx:1.27", 80)], &[], &[])
            .unwrap_err();
        assert_eq!(failure.state, SynthesisState::Init);
        assert!(matches!(failure.error, SynthError::Configuration(_)));
        assert!(failure.partial.network.is_none());
    }

    #[test]
    fn test_duplicate_service_conflicts() {
        let synthesizer = TopologySynthesizer::new(SynthesisOptions::new("demo"));
        let spec = ServiceSpec::new("web", "nginx:1.27", 80);
        let failure = synthesizer.synthesize(&[spec.clone(), spec], &[], &[]).unwrap_err();
        assert!(matches!(failure.error, SynthError::Conflict { name, .. } if name == "web"));
    }

    #[test]
    fn test_dependencies_and_data_stores_become_edges() {
        let mut options = SynthesisOptions::new("atomic");
        options.data_stores.push(DataStoreSpec {
            name: "db".to_string(),
            kind: DataStoreKind::Postgres,
            port: None,
            clients: vec!["graphql".to_string()],
        });
        let services = vec![
            ServiceSpec::new("graphql", "hasura/graphql-engine:v2.38.0", 8080),
            ServiceSpec::new("functions", "functions:latest", 3000)
                .depending_on("graphql")
                .with_env("HASURA_ENDPOINT", "${service:graphql}/v1/graphql"),
        ];
        let graph = TopologySynthesizer::new(options)
            .synthesize(&services, &[], &[route("/v1/graphql/*", "graphql")])
            .unwrap();

        let into_graphql: Vec<String> =
            graph.security.edges_into("graphql").iter().map(|e| e.to_string()).collect();
        assert_eq!(
            into_graphql,
            vec!["entry-point -> graphql tcp/8080", "functions -> graphql tcp/8080"]
        );
        assert_eq!(graph.security.edges_into("db").len(), 1);
        assert!(graph.security.edges_into("functions").is_empty());

        let functions = graph.service("functions").unwrap();
        assert_eq!(
            functions.task.environment["HASURA_ENDPOINT"],
            "http://graphql.atomic.internal:8080/v1/graphql"
        );
        assert!(graph.output("DbEndpoint").is_some());
    }

    #[test]
    fn test_unknown_dependency() {
        let services = vec![ServiceSpec::new("web", "nginx:1.27", 80).depending_on("api")];
        let failure = TopologySynthesizer::new(SynthesisOptions::new("demo"))
            .synthesize(&services, &[], &[])
            .unwrap_err();
        assert!(matches!(failure.error, SynthError::UnknownService { service, referenced_by }
            if service == "api" && referenced_by == "web"));
    }

    #[test]
    fn test_wildcard_mode_is_audited() {
        let mut options = SynthesisOptions::new("atomic");
        options.secret_access = SecretAccessMode::NamespaceWildcard;
        let secrets = vec![SecretDeclaration::new("Token", ProvisioningMode::GeneratedRandom)];
        let services = vec![ServiceSpec::new("web", "nginx:1.27", 80).with_secret("TOKEN", "Token")];
        let graph = TopologySynthesizer::new(options)
            .synthesize(&services, &secrets, &[])
            .unwrap();

        let policy = &graph.service("web").unwrap().read_policy;
        assert!(policy.widened);
        assert_eq!(policy.granted.iter().collect::<Vec<_>>(), vec!["atomic/Token"]);
        let widened = graph.output("SecretAccessWidened").unwrap();
        assert_eq!(widened.value, OutputValue::literal("atomic/*"));
    }

    #[test]
    fn test_forward_default_needs_known_service() {
        let mut options = SynthesisOptions::new("demo");
        options.default_action = DefaultAction::Forward {
            service: "missing".to_string(),
        };
        let failure = TopologySynthesizer::new(options)
            .synthesize(&[ServiceSpec::new("web", "nginx:1.27", 80)], &[], &[])
            .unwrap_err();
        assert!(matches!(failure.error, SynthError::UnknownService { .. }));
    }

    #[test]
    fn test_parallel_compile_matches_sequential() {
        let services: Vec<ServiceSpec> = ["auth", "graphql", "functions", "web"]
            .iter()
            .enumerate()
            .map(|(i, name)| ServiceSpec::new(*name, "img:1", 8000 + i as i64).with_secret("TOKEN", "Token"))
            .collect();
        let secrets = vec![SecretDeclaration::new("Token", ProvisioningMode::GeneratedRandom)];

        let sequential = TopologySynthesizer::new(SynthesisOptions::new("atomic"))
            .synthesize(&services, &secrets, &[])
            .unwrap();
        let mut options = SynthesisOptions::new("atomic");
        options.parallel_compile = true;
        let parallel = TopologySynthesizer::new(options)
            .synthesize(&services, &secrets, &[])
            .unwrap();

        assert_eq!(sequential.services, parallel.services);
        assert_eq!(sequential.outputs, parallel.outputs);
        assert_eq!(
            sequential.secrets.subscribers("Token"),
            parallel.secrets.subscribers("Token")
        );
    }

    #[test]
    fn test_colliding_output_names_conflict() {
        let secrets = vec![
            SecretDeclaration::new("api-key", ProvisioningMode::GeneratedRandom),
            SecretDeclaration::new("ApiKey", ProvisioningMode::ManualPlaceholder),
        ];
        let failure = TopologySynthesizer::new(SynthesisOptions::new("demo"))
            .synthesize(&[ServiceSpec::new("web", "nginx:1.27", 80)], &secrets, &[])
            .unwrap_err();

        assert_eq!(failure.state, SynthesisState::RoutesFinalized);
        match &failure.error {
            SynthError::Conflict { name, detail } => {
                assert_eq!(name, "ApiKeySecretId");
                assert!(detail.contains("secret api-key"));
                assert!(detail.contains("secret ApiKey"));
            }
            other => panic!("expected Conflict, got {:?}", other),
        }
        assert!(failure.partial.outputs.is_empty());
    }

    #[test]
    fn test_data_store_cannot_shadow_fixed_output() {
        let mut options = SynthesisOptions::new("demo");
        options.data_stores.push(DataStoreSpec {
            name: "application".to_string(),
            kind: DataStoreKind::Postgres,
            port: None,
            clients: vec![],
        });
        let failure = TopologySynthesizer::new(options)
            .synthesize(&[ServiceSpec::new("web", "nginx:1.27", 80)], &[], &[])
            .unwrap_err();
        assert!(matches!(&failure.error, SynthError::Conflict { name, .. } if name == "ApplicationEndpoint"));
    }

    #[test]
    fn test_listener_outputs_named_by_protocol() {
        let mut options = SynthesisOptions::new("demo");
        options.domain_name = Some("app.example.com".to_string());
        let graph = TopologySynthesizer::new(options)
            .synthesize(&[ServiceSpec::new("web", "nginx:1.27", 80)], &[], &[])
            .unwrap();
        assert!(graph.output("HttpListenerId").is_some());
        assert!(graph.output("HttpsListenerId").is_some());
    }
}
