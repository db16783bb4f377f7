//! Security graph type definitions.

use serde::{Serialize, Serializer};
use std::fmt;

/// Stable, name-keyed handle to a security boundary.
///
/// Components hold these instead of references to the boundary itself, so
/// two declarations of the same boundary compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoundaryId(String);

impl BoundaryId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BoundaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for BoundaryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// What a boundary protects
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "kebab-case")]
pub enum BoundaryOwner {
    /// Compute of one logical service
    Service(String),
    /// The single internet-facing entry point
    SharedEntryPoint,
    /// A database or file system reached by services
    DataStore(String),
}

impl fmt::Display for BoundaryOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryOwner::Service(name) => write!(f, "service:{}", name),
            BoundaryOwner::SharedEntryPoint => f.write_str("shared-entry-point"),
            BoundaryOwner::DataStore(name) => write!(f, "data-store:{}", name),
        }
    }
}

/// Group of compute sharing one ingress rule set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityBoundary {
    pub id: BoundaryId,
    pub owner: BoundaryOwner,
}

/// Transport protocol of an allow-edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => f.write_str("tcp"),
            Protocol::Udp => f.write_str("udp"),
        }
    }
}

/// Origin of an allow-edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeSource {
    /// Traffic from compute inside another boundary
    Boundary(BoundaryId),
    /// Any IPv4 address; only valid into the shared entry point
    AnyIpv4,
}

impl EdgeSource {
    pub fn boundary(name: impl Into<String>) -> Self {
        EdgeSource::Boundary(BoundaryId::new(name))
    }
}

impl fmt::Display for EdgeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeSource::Boundary(id) => write!(f, "{}", id),
            EdgeSource::AnyIpv4 => f.write_str("0.0.0.0/0"),
        }
    }
}

/// Directed, additive authorization from one boundary into another
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllowEdge {
    pub from: EdgeSource,
    pub to: BoundaryId,
    pub protocol: Protocol,
    pub port: u16,
    pub reason: String,
}

impl AllowEdge {
    /// Two edges are the same logical edge when everything but the reason matches
    pub fn same_rule(&self, other: &AllowEdge) -> bool {
        self.from == other.from
            && self.to == other.to
            && self.protocol == other.protocol
            && self.port == other.port
    }
}

impl fmt::Display for AllowEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} {}/{}", self.from, self.to, self.protocol, self.port)
    }
}
