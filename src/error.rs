//! Error taxonomy for topology synthesis.
//!
//! Every failure is a structural or validation error discovered while the
//! graph is being built. Synthesis is deterministic, so the same invalid
//! input always fails with the same error; nothing here is retried.

use crate::config::ValidationError;

/// Errors raised by the synthesizer components.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthError {
    /// Malformed static input (bad CIDR, too few availability zones, bad pattern)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A boundary or secret name was declared twice with different definitions
    #[error("Conflict on '{name}': {detail}")]
    Conflict { name: String, detail: String },

    /// An allow-edge referenced a boundary that was never declared
    #[error("Unknown security boundary '{name}' (referenced by edge: {edge})")]
    UnknownBoundary { name: String, edge: String },

    /// A wildcard source was used for a destination other than the entry point
    #[error("Wildcard source is only allowed into the shared entry point, not into '{to}'")]
    WildcardSource { to: String },

    /// A service spec violates platform constraints
    #[error("Invalid service spec '{service}': {reason}")]
    InvalidSpec { service: String, reason: String },

    /// A grant or reference named a secret that was never declared
    #[error("Unknown secret '{secret}' referenced by '{referenced_by}'")]
    UnknownSecret { secret: String, referenced_by: String },

    /// A route, dependency or environment value named an undeclared service
    #[error("Unknown service '{service}' referenced by '{referenced_by}'")]
    UnknownService { service: String, referenced_by: String },

    /// Two route entries were given the same explicit priority
    #[error("Duplicate route priority {priority}: '{first}' and '{second}'")]
    DuplicatePriority {
        priority: u32,
        first: String,
        second: String,
    },

    /// A more general pattern would be evaluated before a more specific one
    #[error(
        "Ambiguous routes: '{general}' (priority {general_priority}) shadows '{specific}' (priority {specific_priority})"
    )]
    AmbiguousRoute {
        general: String,
        general_priority: u32,
        specific: String,
        specific_priority: u32,
    },
}

impl From<ValidationError> for SynthError {
    fn from(err: ValidationError) -> Self {
        SynthError::Configuration(err.to_string())
    }
}

/// Convenience alias used across the synthesizer components
pub type SynthResult<T> = Result<T, SynthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_offenders() {
        let err = SynthError::UnknownBoundary {
            name: "ghost".to_string(),
            edge: "web -> ghost tcp/80".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("ghost"));
        assert!(message.contains("web -> ghost"));

        let err = SynthError::AmbiguousRoute {
            general: "/v1/*".to_string(),
            general_priority: 1,
            specific: "/v1/v2/*".to_string(),
            specific_priority: 2,
        };
        assert!(err.to_string().contains("/v1/v2/*"));
    }

    #[test]
    fn test_validation_error_becomes_configuration() {
        let err: SynthError = ValidationError::InvalidNetwork("cidr cannot be empty".to_string()).into();
        assert!(matches!(err, SynthError::Configuration(msg) if msg.contains("cidr")));
    }
}
