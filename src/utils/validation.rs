//! Identifier validation utilities.
//!
//! Names flow into resource identifiers, DNS names and environment variable
//! keys, so each kind is checked against the grammar its target accepts.

use regex::Regex;
use std::sync::OnceLock;

fn dns_label() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z]([a-z0-9-]{0,61}[a-z0-9])?$").expect("valid regex"))
}

fn stack_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9-]{0,127}$").expect("valid regex"))
}

fn secret_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]{0,255}$").expect("valid regex"))
}

fn env_var_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"))
}

/// Validate a service or data store name
///
/// Service names become DNS labels in backend addresses
/// (`<name>.<stack>.internal`), so they must be lowercase RFC 1123 labels.
///
/// # Examples
/// ```
/// use stacksynth::utils::validation::validate_resource_name;
///
/// assert!(validate_resource_name("graphql").is_ok());
/// assert!(validate_resource_name("oauth-callback").is_ok());
/// assert!(validate_resource_name("GraphQL").is_err());
/// assert!(validate_resource_name("-web").is_err());
/// ```
pub fn validate_resource_name(name: &str) -> Result<(), String> {
    if dns_label().is_match(name) {
        Ok(())
    } else {
        Err(format!(
            "'{}' is not a valid name (lowercase letters, digits and '-', starting with a letter, at most 63 characters)",
            name
        ))
    }
}

/// Validate the stack name used as the secret namespace and resource prefix
pub fn validate_stack_name(name: &str) -> Result<(), String> {
    if stack_name().is_match(name) {
        Ok(())
    } else {
        Err(format!(
            "'{}' is not a valid stack name (letters, digits and '-', starting with a letter)",
            name
        ))
    }
}

/// Validate a secret name
///
/// # Examples
/// ```
/// use stacksynth::utils::validation::validate_secret_name;
///
/// assert!(validate_secret_name("HasuraAdminSecret").is_ok());
/// assert!(validate_secret_name("openai_api_key").is_ok());
/// assert!(validate_secret_name("2fa").is_err());
/// assert!(validate_secret_name("a/b").is_err());
/// ```
pub fn validate_secret_name(name: &str) -> Result<(), String> {
    if secret_name().is_match(name) {
        Ok(())
    } else {
        Err(format!(
            "'{}' is not a valid secret name (letters, digits, '_' and '-', starting with a letter)",
            name
        ))
    }
}

/// Validate an environment variable key
pub fn validate_env_var_name(name: &str) -> Result<(), String> {
    if env_var_name().is_match(name) {
        Ok(())
    } else {
        Err(format!("'{}' is not a valid environment variable name", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_names() {
        assert!(validate_resource_name("web").is_ok());
        assert!(validate_resource_name("a").is_ok());
        assert!(validate_resource_name("planner2").is_ok());
        assert!(validate_resource_name("").is_err());
        assert!(validate_resource_name("web-").is_err());
        assert!(validate_resource_name("we_b").is_err());
        assert!(validate_resource_name(&"a".repeat(64)).is_err());
        assert!(validate_resource_name(&"a".repeat(63)).is_ok());
    }

    #[test]
    fn test_stack_names() {
        assert!(validate_stack_name("Atomic").is_ok());
        assert!(validate_stack_name("atomic-prod").is_ok());
        assert!(validate_stack_name("atomic/prod").is_err());
        assert!(validate_stack_name("").is_err());
    }

    #[test]
    fn test_env_var_names() {
        assert!(validate_env_var_name("HASURA_GRAPHQL_ADMIN_SECRET").is_ok());
        assert!(validate_env_var_name("_PRIVATE").is_ok());
        assert!(validate_env_var_name("1VAR").is_err());
        assert!(validate_env_var_name("MY-VAR").is_err());
    }
}
