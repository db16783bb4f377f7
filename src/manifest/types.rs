//! Manifest type definitions.
//!
//! The manifest is what a provisioning backend consumes: a flat list of
//! resources in dependency order, each naming the logical ids it needs.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Kind of a manifest resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResourceType {
    Network,
    Subnet,
    SecurityBoundary,
    IngressRule,
    Secret,
    EntryPoint,
    Listener,
    ListenerRule,
    DataStore,
    LogGroup,
    TaskDefinition,
    TargetGroup,
    SecretReadPolicy,
    Service,
}

#[derive(Debug, Clone, Serialize)]
pub struct Resource {
    pub logical_id: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    pub properties: serde_json::Value,
}

impl Resource {
    pub fn new(logical_id: impl Into<String>, resource_type: ResourceType, properties: serde_json::Value) -> Self {
        Self {
            logical_id: logical_id.into(),
            resource_type,
            depends_on: Vec::new(),
            properties,
        }
    }

    /// Add dependencies, skipping self references and repeats
    pub fn depending_on<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            let id = id.into();
            if id != self.logical_id && !self.depends_on.contains(&id) {
                self.depends_on.push(id);
            }
        }
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestMetadata {
    pub stack_name: String,
    pub generator: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub metadata: ManifestMetadata,
    pub resources: Vec<Resource>,
}

impl Manifest {
    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.logical_id == logical_id)
    }

    pub fn of_type(&self, resource_type: ResourceType) -> impl Iterator<Item = &Resource> {
        self.resources
            .iter()
            .filter(move |r| r.resource_type == resource_type)
    }
}
