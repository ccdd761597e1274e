//! Standardized error types following the `error-fdxdcr-<domain>-<number>` format
//! for internal errors; registration validation failures instead carry the DCR
//! `invalid_client_metadata` marker expected by the host pipeline.

use thiserror::Error;

/// Machine-parseable marker appended to every validation failure description.
pub const INVALID_CLIENT_METADATA: &str = "invalid_client_metadata";

/// Configuration errors that occur while assembling the DCR configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error when a required environment variable is not set
    #[error("error-fdxdcr-config-1 {0} must be set")]
    EnvVarRequired(String),

    /// Error when boolean string cannot be parsed
    #[error(
        "error-fdxdcr-config-2 Failed to parse boolean '{0}': expected true/false/1/0/yes/no/on/off"
    )]
    BoolParsingFailed(String),
}

/// Registration request validation and response rendering errors.
///
/// The `Display` form of every validation variant is the human-readable
/// violated-rule text followed by the `invalid_client_metadata` marker,
/// which the host pipeline maps to an HTTP 400.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    /// Required field null, blank, or empty
    #[error("{0}:invalid_client_metadata")]
    MandatoryFieldMissing(String),

    /// Value present but outside the allowed set
    #[error("{0}:invalid_client_metadata")]
    PolicyViolation(String),

    /// Numeric field zero, negative, or above a configured maximum
    #[error("{0}:invalid_client_metadata")]
    BoundViolation(String),

    /// Field required only under another field's value and missing
    #[error("{0}:invalid_client_metadata")]
    ConditionalRequirement(String),

    /// Externally configured bound present but not parseable
    #[error("{0}:invalid_client_metadata")]
    ConfigurationError(String),

    /// Credential issuance collaborator failed
    #[error("error-fdxdcr-response-1 Credential issuance failed: {0}")]
    CredentialIssuance(String),

    /// Stored metadata could not be rendered into the response schema
    #[error("error-fdxdcr-response-2 Response serialization failed: {0}")]
    ResponseSerialization(String),
}

impl RegistrationError {
    /// Fixed DCR error code for validation failures.
    pub fn error_code(&self) -> &'static str {
        INVALID_CLIENT_METADATA
    }

    /// The violated-rule text without the marker suffix.
    pub fn description(&self) -> &str {
        match self {
            RegistrationError::MandatoryFieldMissing(d)
            | RegistrationError::PolicyViolation(d)
            | RegistrationError::BoundViolation(d)
            | RegistrationError::ConditionalRequirement(d)
            | RegistrationError::ConfigurationError(d)
            | RegistrationError::CredentialIssuance(d)
            | RegistrationError::ResponseSerialization(d) => d,
        }
    }
}
