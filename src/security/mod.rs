//! Least-privilege security graph.
//!
//! Models security groups as named boundaries and ingress rules as directed
//! allow-edges between them. Only the shared entry point may accept traffic
//! from arbitrary internet sources.

pub mod graph;
pub mod types;

pub use graph::SecurityGraph;
pub use types::{AllowEdge, BoundaryId, BoundaryOwner, EdgeSource, Protocol, SecurityBoundary};
