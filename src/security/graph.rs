//! Directed allow-graph of security boundaries.
//!
//! Boundaries are keyed by name and declared once; edges are append-only.
//! There is no removal primitive, so the graph only ever expresses an
//! additive allow-list.

use super::types::{AllowEdge, BoundaryId, BoundaryOwner, EdgeSource, Protocol, SecurityBoundary};
use crate::error::{SynthError, SynthResult};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize)]
pub struct SecurityGraph {
    boundaries: Vec<SecurityBoundary>,
    edges: Vec<AllowEdge>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl SecurityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a boundary, or return the existing one if the owner matches.
    ///
    /// Redeclaring a name with a different owner is a `Conflict`.
    pub fn declare_boundary(&mut self, name: &str, owner: BoundaryOwner) -> SynthResult<BoundaryId> {
        if let Some(&idx) = self.index.get(name) {
            let existing = &self.boundaries[idx];
            if existing.owner == owner {
                return Ok(existing.id.clone());
            }
            return Err(SynthError::Conflict {
                name: name.to_string(),
                detail: format!(
                    "boundary already owned by {}, cannot redeclare for {}",
                    existing.owner, owner
                ),
            });
        }

        let id = BoundaryId::new(name);
        log::debug!("Declared security boundary {} ({})", id, owner);
        self.index.insert(name.to_string(), self.boundaries.len());
        self.boundaries.push(SecurityBoundary {
            id: id.clone(),
            owner,
        });
        Ok(id)
    }

    /// Append an allow-edge from `from` into `to`.
    ///
    /// Both endpoints must already be declared. Re-applying an identical rule
    /// keeps the single existing edge; the return value tells whether a new
    /// edge was recorded.
    pub fn allow(
        &mut self,
        from: EdgeSource,
        to: &str,
        protocol: Protocol,
        port: u16,
        reason: &str,
    ) -> SynthResult<bool> {
        let edge = AllowEdge {
            from,
            to: BoundaryId::new(to),
            protocol,
            port,
            reason: reason.to_string(),
        };

        let destination = self.boundary(to).ok_or_else(|| SynthError::UnknownBoundary {
            name: to.to_string(),
            edge: edge.to_string(),
        })?;

        match &edge.from {
            EdgeSource::Boundary(source) => {
                if !self.index.contains_key(source.as_str()) {
                    return Err(SynthError::UnknownBoundary {
                        name: source.to_string(),
                        edge: edge.to_string(),
                    });
                }
            }
            EdgeSource::AnyIpv4 => {
                if destination.owner != BoundaryOwner::SharedEntryPoint {
                    return Err(SynthError::WildcardSource { to: to.to_string() });
                }
            }
        }

        if port == 0 {
            return Err(SynthError::Configuration(format!(
                "Allow-edge {} must name a port between 1 and 65535",
                edge
            )));
        }

        if self.edges.iter().any(|existing| existing.same_rule(&edge)) {
            log::debug!("Allow-edge {} already present", edge);
            return Ok(false);
        }

        log::debug!("Allow-edge {} ({})", edge, edge.reason);
        self.edges.push(edge);
        Ok(true)
    }

    /// All edges terminating at `boundary`, in insertion order
    pub fn edges_into(&self, boundary: &str) -> Vec<&AllowEdge> {
        self.edges.iter().filter(|e| e.to.as_str() == boundary).collect()
    }

    /// All edges leaving `boundary`, in insertion order
    pub fn edges_from(&self, boundary: &str) -> Vec<&AllowEdge> {
        self.edges
            .iter()
            .filter(|e| matches!(&e.from, EdgeSource::Boundary(id) if id.as_str() == boundary))
            .collect()
    }

    pub fn boundary(&self, name: &str) -> Option<&SecurityBoundary> {
        self.index.get(name).map(|&idx| &self.boundaries[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn boundaries(&self) -> &[SecurityBoundary] {
        &self.boundaries
    }

    pub fn edges(&self) -> &[AllowEdge] {
        &self.edges
    }
}
