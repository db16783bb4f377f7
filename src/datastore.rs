//! Data stores reachable only from their declared clients.

use crate::error::{SynthError, SynthResult};
use crate::network::{NetworkModel, Placement, SubnetKind};
use crate::security::{BoundaryId, BoundaryOwner, EdgeSource, Protocol, SecurityGraph};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataStoreKind {
    /// Managed relational database
    Postgres,
    /// Shared network file system
    FileSystem,
}

impl DataStoreKind {
    pub fn default_port(&self) -> u16 {
        match self {
            DataStoreKind::Postgres => 5432,
            DataStoreKind::FileSystem => 2049,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataStoreKind::Postgres => "postgres",
            DataStoreKind::FileSystem => "file-system",
        }
    }
}

/// A data store as written in the stack file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataStoreSpec {
    pub name: String,
    pub kind: DataStoreKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Services allowed to connect
    #[serde(default)]
    pub clients: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataStoreResource {
    pub name: String,
    pub kind: DataStoreKind,
    pub boundary: BoundaryId,
    pub placement: Placement,
    pub port: u16,
    /// Logical address, `<name>.<stack>.internal:<port>`
    pub endpoint: String,
    pub clients: Vec<String>,
}

/// Declare the store's boundary and bind it to the private subnet group
pub fn declare_data_store(
    spec: &DataStoreSpec,
    network: &NetworkModel,
    namespace: &str,
    security: &mut SecurityGraph,
) -> SynthResult<DataStoreResource> {
    let port = spec.port.unwrap_or_else(|| spec.kind.default_port());
    if port == 0 {
        return Err(SynthError::Configuration(format!(
            "Data store '{}' port must be positive",
            spec.name
        )));
    }
    let placement = network.placement(SubnetKind::PrivateWithEgress).ok_or_else(|| {
        SynthError::Configuration("network has no private-with-egress subnet group".to_string())
    })?;
    let boundary = security.declare_boundary(&spec.name, BoundaryOwner::DataStore(spec.name.clone()))?;

    log::debug!("Declared {} data store {} on port {}", spec.kind.as_str(), spec.name, port);
    Ok(DataStoreResource {
        name: spec.name.clone(),
        kind: spec.kind,
        boundary,
        placement,
        port,
        endpoint: format!("{}.{}.internal:{}", spec.name, namespace.to_lowercase(), port),
        clients: spec.clients.clone(),
    })
}

/// Allow each client into the store on its port; returns the number of new edges
pub fn connect_clients(store: &DataStoreResource, security: &mut SecurityGraph) -> SynthResult<usize> {
    let mut added = 0;
    for client in &store.clients {
        let reason = format!("{} connects to {} ({})", client, store.name, store.kind.as_str());
        if security.allow(
            EdgeSource::boundary(client.as_str()),
            store.boundary.as_str(),
            Protocol::Tcp,
            store.port,
            &reason,
        )? {
            added += 1;
        }
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::build_network;

    fn postgres(clients: &[&str]) -> DataStoreSpec {
        DataStoreSpec {
            name: "db".to_string(),
            kind: DataStoreKind::Postgres,
            port: None,
            clients: clients.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_store_is_private_with_default_port() {
        let network = build_network("10.0.0.0/16", 2).unwrap();
        let mut security = SecurityGraph::new();
        let store = declare_data_store(&postgres(&[]), &network, "Atomic", &mut security).unwrap();
        assert_eq!(store.port, 5432);
        assert_eq!(store.placement.kind, SubnetKind::PrivateWithEgress);
        assert_eq!(store.endpoint, "db.atomic.internal:5432");
        assert_eq!(
            security.boundary("db").unwrap().owner,
            BoundaryOwner::DataStore("db".to_string())
        );
    }

    #[test]
    fn test_clients_get_one_edge_each() {
        let network = build_network("10.0.0.0/16", 2).unwrap();
        let mut security = SecurityGraph::new();
        for name in ["auth", "graphql"] {
            security
                .declare_boundary(name, BoundaryOwner::Service(name.to_string()))
                .unwrap();
        }
        let store =
            declare_data_store(&postgres(&["auth", "graphql"]), &network, "atomic", &mut security).unwrap();
        assert_eq!(connect_clients(&store, &mut security).unwrap(), 2);
        assert_eq!(connect_clients(&store, &mut security).unwrap(), 0);

        let inbound: Vec<String> = security
            .edges_into("db")
            .iter()
            .map(|e| e.to_string())
            .collect();
        assert_eq!(inbound, vec!["auth -> db tcp/5432", "graphql -> db tcp/5432"]);
    }

    #[test]
    fn test_unknown_client_boundary() {
        let network = build_network("10.0.0.0/16", 2).unwrap();
        let mut security = SecurityGraph::new();
        let store = declare_data_store(&postgres(&["ghost"]), &network, "atomic", &mut security).unwrap();
        assert!(matches!(
            connect_clients(&store, &mut security),
            Err(SynthError::UnknownBoundary { name, .. }) if name == "ghost"
        ));
    }
}
