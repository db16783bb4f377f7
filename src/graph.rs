//! The synthesized topology graph and its stack outputs.
//!
//! A `TopologyGraph` is a plain value: once synthesis returns it, nothing
//! mutates it, and it can be shared across threads by downstream emitters.
//! The same type carries the partial graph of a failed run, in which case
//! the components after the failing phase are simply absent.

use crate::datastore::DataStoreResource;
use crate::entry_point::EntryPoint;
use crate::network::NetworkModel;
use crate::routing::FinalizedRoutes;
use crate::secrets::SecretStore;
use crate::security::SecurityGraph;
use crate::service::ServiceResource;
use serde::{Serialize, Serializer};
use std::fmt;

/// Value of a stack output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputValue {
    /// Attribute only known once the resource is provisioned
    Reference { resource: String, attribute: String },
    Literal(String),
}

impl OutputValue {
    pub fn reference(resource: &str, attribute: &str) -> Self {
        OutputValue::Reference {
            resource: resource.to_string(),
            attribute: attribute.to_string(),
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        OutputValue::Literal(value.into())
    }
}

impl fmt::Display for OutputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputValue::Reference { resource, attribute } => write!(f, "${{{}.{}}}", resource, attribute),
            OutputValue::Literal(value) => f.write_str(value),
        }
    }
}

impl Serialize for OutputValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One human-readable stack output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Output {
    pub name: String,
    pub value: OutputValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub requires_manual_population: bool,
}

impl Output {
    pub fn new(name: impl Into<String>, value: OutputValue) -> Self {
        Self {
            name: name.into(),
            value,
            description: None,
            requires_manual_population: false,
        }
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn manual(mut self) -> Self {
        self.requires_manual_population = true;
        self
    }
}

/// Closure of every resource produced by one synthesis run
#[derive(Debug, Clone, Default, Serialize)]
pub struct TopologyGraph {
    pub stack_name: String,
    pub network: Option<NetworkModel>,
    pub security: SecurityGraph,
    pub secrets: SecretStore,
    pub entry_point: Option<EntryPoint>,
    pub data_stores: Vec<DataStoreResource>,
    pub services: Vec<ServiceResource>,
    pub routes: Option<FinalizedRoutes>,
    pub outputs: Vec<Output>,
}

impl TopologyGraph {
    pub fn new(stack_name: &str) -> Self {
        Self {
            stack_name: stack_name.to_string(),
            secrets: SecretStore::new(stack_name),
            ..Self::default()
        }
    }

    pub fn service(&self, name: &str) -> Option<&ServiceResource> {
        self.services.iter().find(|s| s.name() == name)
    }

    pub fn output(&self, name: &str) -> Option<&Output> {
        self.outputs.iter().find(|o| o.name == name)
    }

    /// Outputs an operator has to act on before first use
    pub fn manual_outputs(&self) -> impl Iterator<Item = &Output> {
        self.outputs.iter().filter(|o| o.requires_manual_population)
    }
}

/// `file-system` -> `FileSystem`, used for output names
pub fn pascal_case(name: &str) -> String {
    name.split(|c: char| c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
