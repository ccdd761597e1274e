//! Configuration types for the DCR validator.
//!
//! The host accelerator exposes these values through its process-wide config
//! store; here they are an explicitly constructed, immutably-shared object
//! handed to [`crate::dcr::RegistrationValidator`] at construction time.

use anyhow::Result;

use crate::errors::ConfigError;

/// A configured maximum for a consent period, kept as the raw configured
/// string. Parsing happens during request validation so that a malformed
/// value surfaces as a validation failure rather than a startup crash.
#[derive(Clone, Default)]
pub struct MaximumPeriodDays(Option<String>);

/// Default token endpoint authentication method configuration
#[derive(Clone, Default)]
pub struct DefaultTokenEndpointAuthMethod(Option<String>);

/// Whether issued credentials are injected into the registration response
#[derive(Clone, Default)]
pub struct ModifyResponse(bool);

/// Read-only DCR validation configuration.
///
/// Shared by reference across request-handling threads; nothing here is
/// mutated after construction.
#[derive(Clone, Default)]
pub struct DcrConfig {
    pub maximum_duration_period: MaximumPeriodDays,
    pub maximum_lookback_period: MaximumPeriodDays,
    pub default_token_endpoint_auth_method: DefaultTokenEndpointAuthMethod,
    pub modify_response: ModifyResponse,
}

impl DcrConfig {
    /// Create a new configuration from environment variables
    pub fn new() -> Result<Self> {
        let maximum_duration_period: MaximumPeriodDays =
            optional_env("FDX_DCR_MAXIMUM_DURATION_PERIOD").into();
        let maximum_lookback_period: MaximumPeriodDays =
            optional_env("FDX_DCR_MAXIMUM_LOOKBACK_PERIOD").into();
        let default_token_endpoint_auth_method: DefaultTokenEndpointAuthMethod =
            optional_env("FDX_DCR_DEFAULT_TOKEN_ENDPOINT_AUTH_METHOD").into();
        let modify_response: ModifyResponse =
            default_env("FDX_DCR_MODIFY_RESPONSE", "false").try_into()?;

        Ok(Self {
            maximum_duration_period,
            maximum_lookback_period,
            default_token_endpoint_auth_method,
            modify_response,
        })
    }
}

pub(crate) fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn default_env(name: &str, default_value: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default_value.to_string())
}

impl From<Option<String>> for MaximumPeriodDays {
    fn from(value: Option<String>) -> Self {
        Self(value.filter(|v| !v.is_empty()))
    }
}

impl From<&str> for MaximumPeriodDays {
    fn from(value: &str) -> Self {
        Self::from(Some(value.to_string()))
    }
}

impl MaximumPeriodDays {
    /// The raw configured value, if any.
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl From<Option<String>> for DefaultTokenEndpointAuthMethod {
    fn from(value: Option<String>) -> Self {
        Self(value.filter(|v| !v.is_empty()))
    }
}

impl From<&str> for DefaultTokenEndpointAuthMethod {
    fn from(value: &str) -> Self {
        Self::from(Some(value.to_string()))
    }
}

impl DefaultTokenEndpointAuthMethod {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl TryFrom<String> for ModifyResponse {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "" | "false" | "0" | "no" | "off" => Ok(Self(false)),
            "true" | "1" | "yes" | "on" => Ok(Self(true)),
            _ => Err(ConfigError::BoolParsingFailed(value).into()),
        }
    }
}

impl From<bool> for ModifyResponse {
    fn from(value: bool) -> Self {
        Self(value)
    }
}

impl ModifyResponse {
    pub fn enabled(&self) -> bool {
        self.0
    }
}
