//! Service type definitions.
//!
//! `ServiceSpec` is the declarative input record for one logical service;
//! `ServiceResource` is what the compiler produces from it.

use crate::network::Placement;
use crate::secrets::SecretReadPolicy;
use crate::security::BoundaryId;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// CPU units (1024 = one vCPU) and memory in MiB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComputeShape {
    pub cpu: u32,
    pub memory: u32,
}

impl ComputeShape {
    /// Memory sizes the platform accepts for a given CPU size
    fn allowed_memory(cpu: u32) -> Option<Vec<u32>> {
        let sizes = match cpu {
            256 => vec![512, 1024, 2048],
            512 => (1..=4).map(|gb| gb * 1024).collect(),
            1024 => (2..=8).map(|gb| gb * 1024).collect(),
            2048 => (4..=16).map(|gb| gb * 1024).collect(),
            4096 => (8..=30).map(|gb| gb * 1024).collect(),
            _ => return None,
        };
        Some(sizes)
    }

    /// Check the shape against the platform's allowed CPU/memory matrix
    ///
    /// # Examples
    /// ```
    /// use stacksynth::service::ComputeShape;
    ///
    /// assert!(ComputeShape { cpu: 256, memory: 512 }.validate().is_ok());
    /// assert!(ComputeShape { cpu: 1024, memory: 4096 }.validate().is_ok());
    /// assert!(ComputeShape { cpu: 256, memory: 4096 }.validate().is_err());
    /// assert!(ComputeShape { cpu: 300, memory: 512 }.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), String> {
        let allowed = Self::allowed_memory(self.cpu).ok_or_else(|| {
            format!(
                "cpu {} is not an allowed size (256, 512, 1024, 2048, 4096)",
                self.cpu
            )
        })?;
        if allowed.contains(&self.memory) {
            Ok(())
        } else {
            Err(format!(
                "memory {} MiB is not allowed with cpu {} (allowed: {:?})",
                self.memory, self.cpu, allowed
            ))
        }
    }
}

/// Reference from an environment variable to a declared secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SecretRef {
    /// Whole secret value
    Name(String),
    /// One JSON key inside a structured secret
    Keyed {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },
}

impl SecretRef {
    pub fn name(&self) -> &str {
        match self {
            SecretRef::Name(name) => name,
            SecretRef::Keyed { name, .. } => name,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            SecretRef::Name(_) => None,
            SecretRef::Keyed { key, .. } => key.as_deref(),
        }
    }
}

impl From<&str> for SecretRef {
    fn from(name: &str) -> Self {
        SecretRef::Name(name.to_string())
    }
}

fn default_health_path() -> String {
    "/".to_string()
}

fn default_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_threshold() -> u32 {
    2
}

/// Target health check probed by the entry point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    #[serde(default = "default_health_path")]
    pub path: String,
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    #[serde(default = "default_threshold")]
    pub healthy_threshold: u32,
    #[serde(default = "default_threshold")]
    pub unhealthy_threshold: u32,
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self {
            path: default_health_path(),
            interval: default_interval(),
            timeout: default_timeout(),
            healthy_threshold: default_threshold(),
            unhealthy_threshold: default_threshold(),
        }
    }
}

fn default_replicas() -> u32 {
    1
}

fn default_log_retention_days() -> u32 {
    30
}

/// Declarative description of one logical service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    /// Container image reference
    pub image: String,
    pub cpu: u32,
    pub memory: u32,
    /// Container port; kept signed so non-positive values reach validation
    pub port: i64,
    /// Plain environment; values may contain `${service:<name>}` and `${entry_point}`
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    /// Environment variable name to secret reference
    #[serde(default)]
    pub secrets: BTreeMap<String, SecretRef>,
    #[serde(default = "default_replicas")]
    pub replicas: u32,
    #[serde(default)]
    pub health_check: HealthCheck,
    /// Services this one calls directly
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default = "default_log_retention_days")]
    pub log_retention_days: u32,
}

impl ServiceSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>, port: i64) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            cpu: 256,
            memory: 512,
            port,
            environment: BTreeMap::new(),
            secrets: BTreeMap::new(),
            replicas: default_replicas(),
            health_check: HealthCheck::default(),
            depends_on: Vec::new(),
            log_retention_days: default_log_retention_days(),
        }
    }

    pub fn shape(&self) -> ComputeShape {
        ComputeShape {
            cpu: self.cpu,
            memory: self.memory,
        }
    }

    pub fn with_secret(mut self, env: &str, secret: impl Into<SecretRef>) -> Self {
        self.secrets.insert(env.to_string(), secret.into());
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.environment.insert(key.to_string(), value.to_string());
        self
    }

    pub fn depending_on(mut self, service: &str) -> Self {
        self.depends_on.push(service.to_string());
        self
    }
}

/// Stable identifier of a compiled service
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceId(String);

impl ServiceId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ServiceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Logical, DNS-based address of a service (never an ephemeral IP)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Backend {
    pub host: String,
    pub port: u16,
}

impl Backend {
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Secret injected into the container environment at process start
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretBinding {
    pub env: String,
    pub secret: String,
    pub secret_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogGroup {
    pub name: String,
    pub retention_days: u32,
}

/// Container task definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDefinition {
    pub family: String,
    pub image: String,
    pub cpu: u32,
    pub memory: u32,
    pub port: u16,
    pub environment: BTreeMap<String, String>,
    pub secrets: Vec<SecretBinding>,
    pub log_group: LogGroup,
}

/// Backend pool the entry point forwards to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetGroup {
    pub name: String,
    pub port: u16,
    pub protocol: String,
    pub target_type: String,
    pub health_check: HealthCheck,
}

/// Compiled service: compute, identity, backend and access policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceResource {
    pub id: ServiceId,
    pub boundary: BoundaryId,
    pub placement: Placement,
    pub backend: Backend,
    pub replicas: u32,
    pub task: TaskDefinition,
    pub target_group: TargetGroup,
    pub read_policy: SecretReadPolicy,
    pub depends_on: Vec<String>,
}

impl ServiceResource {
    pub fn name(&self) -> &str {
        self.id.as_str()
    }

    /// Names of the secrets this service reads
    pub fn secret_names(&self) -> Vec<&str> {
        self.task.secrets.iter().map(|b| b.secret.as_str()).collect()
    }
}
