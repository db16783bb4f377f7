//! Secret store.
//!
//! Tracks declared secrets and, per secret, the exact set of services whose
//! runtime identity may read it. Grants are always per secret per service;
//! any coarser policy is derived later and audited against this set.

use super::types::{
    SecretDeclaration, SecretDescriptor, SecretMaterial, ProvisioningMode, DEFAULT_GENERATE_KEY,
    DEFAULT_SECRET_LENGTH, MAX_SECRET_LENGTH,
};
use crate::error::{SynthError, SynthResult};
use crate::utils::validate_secret_name;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default, Serialize)]
pub struct SecretStore {
    namespace: String,
    secrets: Vec<SecretDescriptor>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl SecretStore {
    /// Create an empty store whose identifiers live under `namespace/`
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            ..Self::default()
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Declare a secret and return its namespaced identifier.
    ///
    /// Declaring the same secret twice with an identical definition is a
    /// no-op; a differing definition under the same name is a `Conflict`.
    pub fn declare(&mut self, declaration: &SecretDeclaration) -> SynthResult<String> {
        validate_secret_name(&declaration.name).map_err(SynthError::Configuration)?;
        let material = resolve_material(declaration)?;

        if let Some(&idx) = self.index.get(&declaration.name) {
            let existing = &self.secrets[idx];
            if existing.material == material
                && existing.shared == declaration.shared
                && existing.description == declaration.description
            {
                return Ok(existing.id.clone());
            }
            return Err(SynthError::Conflict {
                name: declaration.name.clone(),
                detail: "secret already declared with a different definition".to_string(),
            });
        }

        let id = format!("{}/{}", self.namespace, declaration.name);
        if material.mode() == ProvisioningMode::ManualPlaceholder {
            log::warn!(
                "Secret {} is a manual placeholder and must be populated before first use",
                id
            );
        } else {
            log::debug!("Declared secret {} ({})", id, material.mode().as_str());
        }

        self.index.insert(declaration.name.clone(), self.secrets.len());
        self.secrets.push(SecretDescriptor {
            name: declaration.name.clone(),
            id: id.clone(),
            material,
            description: declaration.description.clone(),
            shared: declaration.shared,
            subscribers: BTreeSet::new(),
        });
        Ok(id)
    }

    /// Record that `service` may read `secret`
    pub fn grant_read(&mut self, secret: &str, service: &str) -> SynthResult<()> {
        let idx = *self.index.get(secret).ok_or_else(|| SynthError::UnknownSecret {
            secret: secret.to_string(),
            referenced_by: service.to_string(),
        })?;
        if self.secrets[idx].subscribers.insert(service.to_string()) {
            log::debug!("Granted {} read access to {}", service, self.secrets[idx].id);
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&SecretDescriptor> {
        self.index.get(name).map(|&idx| &self.secrets[idx])
    }

    /// Names of the secrets explicitly granted to `service`
    pub fn secrets_for(&self, service: &str) -> BTreeSet<String> {
        self.secrets
            .iter()
            .filter(|s| s.subscribers.contains(service))
            .map(|s| s.name.clone())
            .collect()
    }

    /// Services explicitly granted read access to `secret`
    pub fn subscribers(&self, secret: &str) -> Option<&BTreeSet<String>> {
        self.get(secret).map(|s| &s.subscribers)
    }

    pub fn shared_secrets(&self) -> impl Iterator<Item = &SecretDescriptor> {
        self.secrets.iter().filter(|s| s.shared)
    }

    pub fn manual_placeholders(&self) -> impl Iterator<Item = &SecretDescriptor> {
        self.secrets.iter().filter(|s| s.requires_manual_population())
    }

    pub fn secrets(&self) -> &[SecretDescriptor] {
        &self.secrets
    }
}

fn resolve_material(declaration: &SecretDeclaration) -> SynthResult<SecretMaterial> {
    let name = &declaration.name;
    let invalid = |reason: &str| SynthError::Configuration(format!("Secret '{}': {}", name, reason));

    let generated = declaration.mode != ProvisioningMode::ManualPlaceholder;
    if !generated && (declaration.length.is_some() || declaration.exclude_punctuation.is_some()) {
        return Err(invalid("length and exclude_punctuation only apply to generated secrets"));
    }
    if generated && declaration.placeholder.is_some() {
        return Err(invalid("placeholder only applies to manual-placeholder secrets"));
    }
    if declaration.mode != ProvisioningMode::GeneratedStructuredTemplate
        && (declaration.template.is_some() || declaration.generate_key.is_some())
    {
        return Err(invalid(
            "template and generate_key only apply to generated-structured-template secrets",
        ));
    }

    let length = declaration.length.unwrap_or(DEFAULT_SECRET_LENGTH);
    if !(1..=MAX_SECRET_LENGTH).contains(&length) {
        return Err(invalid(&format!(
            "length must be between 1 and {} (got {})",
            MAX_SECRET_LENGTH, length
        )));
    }
    let exclude_punctuation = declaration.exclude_punctuation.unwrap_or(true);

    let material = match declaration.mode {
        ProvisioningMode::GeneratedRandom => SecretMaterial::GeneratedRandom {
            length,
            exclude_punctuation,
        },
        ProvisioningMode::GeneratedStructuredTemplate => {
            let template = match &declaration.template {
                Some(template) if !template.is_empty() => template.clone(),
                _ => return Err(invalid("generated-structured-template requires a non-empty template")),
            };
            let generate_key = declaration
                .generate_key
                .clone()
                .unwrap_or_else(|| DEFAULT_GENERATE_KEY.to_string());
            if template.contains_key(&generate_key) {
                return Err(invalid(&format!(
                    "generate_key '{}' would overwrite a template entry",
                    generate_key
                )));
            }
            SecretMaterial::GeneratedStructuredTemplate {
                template,
                generate_key,
                length,
                exclude_punctuation,
            }
        }
        ProvisioningMode::ManualPlaceholder => SecretMaterial::ManualPlaceholder {
            placeholder: declaration.placeholder.clone(),
        },
    };
    Ok(material)
}
