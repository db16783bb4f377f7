use crate::datastore::DataStoreSpec;
use crate::routing::{DefaultAction, RouteDeclaration};
use crate::secrets::{SecretAccessMode, SecretDeclaration};
use crate::service::ServiceSpec;
use crate::utils::{validate_resource_name, validate_secret_name, validate_stack_name, Ipv4Cidr};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Stack file: everything needed to synthesize one topology
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackConfig {
    pub general: GeneralConfig,
    #[serde(default)]
    pub network: NetworkSettings,
    #[serde(default)]
    pub data_stores: Vec<DataStoreSpec>,
    #[serde(default)]
    pub secrets: Vec<SecretDeclaration>,
    pub services: Vec<ServiceSpec>,
    #[serde(default)]
    pub routes: Vec<RouteDeclaration>,
    #[serde(default)]
    pub default_action: DefaultAction,
}

impl StackConfig {
    /// Validate the configuration
    ///
    /// Only checks each section on its own; cross references (routes to
    /// services, grants to secrets) are resolved during synthesis.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.general.validate()?;
        self.network.validate()?;

        if self.services.is_empty() {
            return Err(ValidationError::InvalidService(
                "at least one service must be declared".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for service in &self.services {
            validate_resource_name(&service.name).map_err(ValidationError::InvalidService)?;
            if !names.insert(service.name.as_str()) {
                return Err(ValidationError::InvalidService(format!(
                    "service '{}' is declared more than once",
                    service.name
                )));
            }
        }

        for store in &self.data_stores {
            validate_resource_name(&store.name).map_err(ValidationError::InvalidDataStore)?;
            if !names.insert(store.name.as_str()) {
                return Err(ValidationError::InvalidDataStore(format!(
                    "'{}' is already used by another service or data store",
                    store.name
                )));
            }
        }

        for secret in &self.secrets {
            validate_secret_name(&secret.name).map_err(ValidationError::InvalidSecret)?;
        }

        for route in &self.routes {
            if !route.path.starts_with('/') {
                return Err(ValidationError::InvalidRoute(format!(
                    "path '{}' for service '{}' must start with '/'",
                    route.path, route.service
                )));
            }
            if route.service.is_empty() {
                return Err(ValidationError::InvalidRoute(format!(
                    "route '{}' has no target service",
                    route.path
                )));
            }
        }

        Ok(())
    }

    pub fn general(&self) -> &GeneralConfig {
        &self.general
    }
}

/// Stack-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Namespace for secrets, hostnames and log groups
    pub stack_name: String,
    /// Serve HTTPS on this domain and redirect HTTP to it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// Compile services in parallel
    #[serde(default)]
    pub parallel_compile: bool,
    #[serde(default)]
    pub secret_access: SecretAccessMode,
}

impl GeneralConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_stack_name(&self.stack_name).map_err(ValidationError::InvalidGeneral)?;

        if let Some(domain) = &self.domain_name {
            if domain.is_empty() || domain.contains("://") || domain.contains('/') {
                return Err(ValidationError::InvalidGeneral(format!(
                    "domain_name '{}' must be a bare host name",
                    domain
                )));
            }
        }

        if let Some(level) = &self.log_level {
            if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
                return Err(ValidationError::InvalidGeneral(format!(
                    "log_level '{}' must be one of {:?}",
                    level, LOG_LEVELS
                )));
            }
        }

        Ok(())
    }
}

fn default_cidr() -> String {
    "10.0.0.0/16".to_string()
}

fn default_az_count() -> usize {
    2
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_nat_gateways() -> u32 {
    1
}

/// Network section of the stack file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSettings {
    #[serde(default = "default_cidr")]
    pub cidr: String,
    #[serde(default = "default_az_count")]
    pub az_count: usize,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_nat_gateways")]
    pub nat_gateways: u32,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            cidr: default_cidr(),
            az_count: default_az_count(),
            region: default_region(),
            nat_gateways: default_nat_gateways(),
        }
    }
}

impl NetworkSettings {
    fn validate(&self) -> Result<(), ValidationError> {
        self.cidr
            .parse::<Ipv4Cidr>()
            .map_err(|e| ValidationError::InvalidNetwork(format!("cidr: {}", e)))?;
        if self.az_count < 2 {
            return Err(ValidationError::InvalidNetwork(format!(
                "az_count must be at least 2 (got {})",
                self.az_count
            )));
        }
        if self.region.is_empty() {
            return Err(ValidationError::InvalidNetwork(
                "region cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid network configuration: {0}")]
    InvalidNetwork(String),
    #[error("Invalid data store configuration: {0}")]
    InvalidDataStore(String),
    #[error("Invalid secret configuration: {0}")]
    InvalidSecret(String),
    #[error("Invalid service configuration: {0}")]
    InvalidService(String),
    #[error("Invalid route configuration: {0}")]
    InvalidRoute(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastore::DataStoreKind;
    use crate::secrets::ProvisioningMode;

    const STACK: &str = r#"
general:
  stack_name: atomic
  domain_name: app.example.com
  secret_access: namespace-wildcard
network:
  cidr: 10.20.0.0/16
  az_count: 3
data_stores:
  - name: db
    kind: postgres
    clients: [graphql]
secrets:
  - name: HasuraAdminSecret
    mode: generated-random
  - name: OpenAiApiKey
    mode: manual-placeholder
services:
  - name: graphql
    image: hasura/graphql-engine:v2.38.0
    cpu: 256
    memory: 512
    port: 8080
    secrets:
      HASURA_GRAPHQL_ADMIN_SECRET: HasuraAdminSecret
routes:
  - path: /v1/graphql/*
    service: graphql
    priority: 20
"#;

    #[test]
    fn test_parse_full_stack() {
        let config: StackConfig = serde_yaml::from_str(STACK).unwrap();
        config.validate().unwrap();

        assert_eq!(config.general.stack_name, "atomic");
        assert_eq!(config.general.secret_access, SecretAccessMode::NamespaceWildcard);
        assert!(!config.general.parallel_compile);
        assert_eq!(config.network.az_count, 3);
        assert_eq!(config.network.region, "us-east-1");
        assert_eq!(config.data_stores[0].kind, DataStoreKind::Postgres);
        assert_eq!(config.secrets[1].mode, ProvisioningMode::ManualPlaceholder);
        assert_eq!(config.routes[0].priority, Some(20));
        assert!(matches!(
            config.default_action,
            DefaultAction::FixedResponse { status: 404, .. }
        ));
    }

    #[test]
    fn test_network_defaults() {
        let yaml = r#"
general:
  stack_name: demo
services:
  - name: web
    image: nginx:1.27
    cpu: 256
    memory: 512
    port: 80
"#;
        let config: StackConfig = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.network, NetworkSettings::default());
        assert_eq!(config.general.secret_access, SecretAccessMode::Minimal);
    }

    #[test]
    fn test_rejects_duplicate_service() {
        let mut config: StackConfig = serde_yaml::from_str(STACK).unwrap();
        let copy = config.services[0].clone();
        config.services.push(copy);
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidService(msg)) if msg.contains("more than once")
        ));
    }

    #[test]
    fn test_rejects_data_store_name_clash() {
        let mut config: StackConfig = serde_yaml::from_str(STACK).unwrap();
        config.data_stores[0].name = "graphql".to_string();
        assert!(matches!(config.validate(), Err(ValidationError::InvalidDataStore(_))));
    }

    #[test]
    fn test_rejects_bad_network() {
        let mut config: StackConfig = serde_yaml::from_str(STACK).unwrap();
        config.network.az_count = 1;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidNetwork(_))));

        let mut config: StackConfig = serde_yaml::from_str(STACK).unwrap();
        config.network.cidr = "10.20.0.0".to_string();
        assert!(matches!(config.validate(), Err(ValidationError::InvalidNetwork(_))));
    }

    #[test]
    fn test_rejects_bad_general() {
        let mut config: StackConfig = serde_yaml::from_str(STACK).unwrap();
        config.general.domain_name = Some("https://app.example.com".to_string());
        assert!(matches!(config.validate(), Err(ValidationError::InvalidGeneral(_))));

        let mut config: StackConfig = serde_yaml::from_str(STACK).unwrap();
        config.general.log_level = Some("loud".to_string());
        assert!(matches!(config.validate(), Err(ValidationError::InvalidGeneral(_))));
    }

    #[test]
    fn test_rejects_relative_route() {
        let mut config: StackConfig = serde_yaml::from_str(STACK).unwrap();
        config.routes[0].path = "v1/graphql/*".to_string();
        assert!(matches!(config.validate(), Err(ValidationError::InvalidRoute(_))));
    }

    #[test]
    fn test_requires_services() {
        let yaml = r#"
general:
  stack_name: demo
services: []
"#;
        let config: StackConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }
}
