//! Scoped secret distribution.
//!
//! Secrets are declared once per stack, granted to individual services, and
//! injected into containers at process start. Values are never baked into
//! images or into the emitted manifest.

pub mod policy;
pub mod store;
pub mod types;

pub use policy::{compile_read_policy, SecretAccessMode, SecretReadPolicy};
pub use store::SecretStore;
pub use types::{ProvisioningMode, SecretDeclaration, SecretDescriptor, SecretMaterial};
