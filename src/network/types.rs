//! Network model type definitions.
//!
//! The network is immutable once built: callers that need a different subnet
//! layout rebuild it from scratch instead of mutating the model.

use crate::utils::Ipv4Cidr;
use serde::{Deserialize, Serialize};

/// Role of a subnet group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubnetKind {
    /// Routable from the internet; only the shared entry point lives here
    Public,
    /// No inbound internet route, outbound through NAT
    PrivateWithEgress,
}

impl SubnetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubnetKind::Public => "public",
            SubnetKind::PrivateWithEgress => "private-with-egress",
        }
    }
}

/// One subnet in one availability zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subnet {
    pub name: String,
    pub zone: String,
    pub cidr: Ipv4Cidr,
}

/// A set of subnets of the same kind, one per availability zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubnetGroup {
    pub name: String,
    pub kind: SubnetKind,
    pub subnets: Vec<Subnet>,
}

/// Where a piece of compute is attached: exactly one subnet group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub group: String,
    pub kind: SubnetKind,
}

/// Isolated network with public and private address ranges across zones
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkModel {
    id: String,
    cidr: Ipv4Cidr,
    zones: Vec<String>,
    groups: Vec<SubnetGroup>,
    nat_gateways: u32,
}

impl NetworkModel {
    pub(crate) fn new(
        id: String,
        cidr: Ipv4Cidr,
        zones: Vec<String>,
        groups: Vec<SubnetGroup>,
        nat_gateways: u32,
    ) -> Self {
        Self {
            id,
            cidr,
            zones,
            groups,
            nat_gateways,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn cidr(&self) -> Ipv4Cidr {
        self.cidr
    }

    pub fn zones(&self) -> &[String] {
        &self.zones
    }

    pub fn groups(&self) -> &[SubnetGroup] {
        &self.groups
    }

    pub fn nat_gateways(&self) -> u32 {
        self.nat_gateways
    }

    /// Look up the subnet group of the given kind
    pub fn group(&self, kind: SubnetKind) -> Option<&SubnetGroup> {
        self.groups.iter().find(|g| g.kind == kind)
    }

    /// Bind compute to the subnet group of the given kind
    pub fn placement(&self, kind: SubnetKind) -> Option<Placement> {
        self.group(kind).map(|g| Placement {
            group: g.name.clone(),
            kind: g.kind,
        })
    }
}
