//! Shared utilities: CIDR arithmetic and identifier validation.

pub mod ip_utils;
pub mod validation;

pub use ip_utils::Ipv4Cidr;
pub use validation::{validate_env_var_name, validate_resource_name, validate_secret_name, validate_stack_name};
