//! Secret type definitions.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Default length of generated secret strings
pub const DEFAULT_SECRET_LENGTH: u32 = 32;
/// Upper bound the secret backend accepts for generated strings
pub const MAX_SECRET_LENGTH: u32 = 4096;
/// Key receiving the generated value in a structured template when none is given
pub const DEFAULT_GENERATE_KEY: &str = "password";

/// How a secret's value comes into existence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProvisioningMode {
    /// A random string generated by the secret backend
    GeneratedRandom,
    /// A JSON document of fixed keys plus one generated key
    GeneratedStructuredTemplate,
    /// Created empty; an operator fills it in before first use
    ManualPlaceholder,
}

impl ProvisioningMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisioningMode::GeneratedRandom => "generated-random",
            ProvisioningMode::GeneratedStructuredTemplate => "generated-structured-template",
            ProvisioningMode::ManualPlaceholder => "manual-placeholder",
        }
    }
}

/// A secret as written in the stack file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretDeclaration {
    pub name: String,
    pub mode: ProvisioningMode,
    /// Key to placeholder map for `generated-structured-template`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<BTreeMap<String, String>>,
    /// Template key that receives the generated value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_punctuation: Option<bool>,
    /// Initial value stored in a manual placeholder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Readable by every service rather than only by grantees
    #[serde(default)]
    pub shared: bool,
}

impl SecretDeclaration {
    pub fn new(name: impl Into<String>, mode: ProvisioningMode) -> Self {
        Self {
            name: name.into(),
            mode,
            template: None,
            generate_key: None,
            length: None,
            exclude_punctuation: None,
            placeholder: None,
            description: None,
            shared: false,
        }
    }

    pub fn with_template(mut self, template: BTreeMap<String, String>) -> Self {
        self.template = Some(template);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn shared(mut self) -> Self {
        self.shared = true;
        self
    }
}

/// The resolved provisioning recipe of a declared secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum SecretMaterial {
    GeneratedRandom {
        length: u32,
        exclude_punctuation: bool,
    },
    GeneratedStructuredTemplate {
        template: BTreeMap<String, String>,
        generate_key: String,
        length: u32,
        exclude_punctuation: bool,
    },
    ManualPlaceholder {
        #[serde(skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
}

impl SecretMaterial {
    pub fn mode(&self) -> ProvisioningMode {
        match self {
            SecretMaterial::GeneratedRandom { .. } => ProvisioningMode::GeneratedRandom,
            SecretMaterial::GeneratedStructuredTemplate { .. } => {
                ProvisioningMode::GeneratedStructuredTemplate
            }
            SecretMaterial::ManualPlaceholder { .. } => ProvisioningMode::ManualPlaceholder,
        }
    }
}

/// A declared secret together with the services allowed to read it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretDescriptor {
    pub name: String,
    /// Namespaced identifier, `<stack>/<name>`
    pub id: String,
    pub material: SecretMaterial,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub shared: bool,
    pub subscribers: BTreeSet<String>,
}

impl SecretDescriptor {
    pub fn mode(&self) -> ProvisioningMode {
        self.material.mode()
    }

    /// The value cannot be known at build time and must be filled in by hand
    pub fn requires_manual_population(&self) -> bool {
        self.mode() == ProvisioningMode::ManualPlaceholder
    }
}
