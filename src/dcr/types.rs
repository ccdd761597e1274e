//! FDX DCR core types and data structures.
//!
//! Defines the registration request/response model, the FDX metadata
//! extension, and the static allowed-value sets.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Raw request-parameter keys rewritten during normalization.
pub const GRANT_TYPES: &str = "grant_types";
pub const TOKEN_ENDPOINT_AUTH_METHOD: &str = "token_endpoint_auth_method";
pub const DURATION_PERIOD: &str = "duration_period";
pub const LOOKBACK_PERIOD: &str = "lookback_period";

/// Stored-metadata keys consumed while rendering the registration response.
pub const CLIENT_ID: &str = "client_id";
pub const TLS_CERT: &str = "tls_cert";
pub const REGISTRATION_ACCESS_TOKEN: &str = "registration_access_token";
pub const REGISTRATION_CLIENT_URI: &str = "registration_client_uri";

/// Grant types a data recipient may register with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowedGrantType {
    AuthorizationCode,
    RefreshToken,
    ClientCredentials,
}

impl AllowedGrantType {
    /// Allowed set in default order
    pub const ALL: [AllowedGrantType; 3] = [
        AllowedGrantType::AuthorizationCode,
        AllowedGrantType::RefreshToken,
        AllowedGrantType::ClientCredentials,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AllowedGrantType::AuthorizationCode => "authorization_code",
            AllowedGrantType::RefreshToken => "refresh_token",
            AllowedGrantType::ClientCredentials => "client_credentials",
        }
    }

    pub fn is_allowed(value: &str) -> bool {
        Self::ALL.iter().any(|g| g.as_str() == value)
    }
}

/// Token endpoint authentication methods FDX permits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenEndpointAuthMethod {
    PrivateKeyJwt,
    TlsClientAuth,
}

impl TokenEndpointAuthMethod {
    pub const ALL: [TokenEndpointAuthMethod; 2] = [
        TokenEndpointAuthMethod::PrivateKeyJwt,
        TokenEndpointAuthMethod::TlsClientAuth,
    ];

    /// Fallback when the configured default is itself outside the allowed set
    pub const FALLBACK: TokenEndpointAuthMethod = TokenEndpointAuthMethod::PrivateKeyJwt;

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenEndpointAuthMethod::PrivateKeyJwt => "private_key_jwt",
            TokenEndpointAuthMethod::TlsClientAuth => "tls_client_auth",
        }
    }

    pub fn is_allowed(value: &str) -> bool {
        Self::ALL.iter().any(|m| m.as_str() == value)
    }
}

/// FDX consent duration types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentDurationType {
    OneTime,
    TimeBound,
    Persistent,
}

impl ConsentDurationType {
    pub const ALL: [ConsentDurationType; 3] = [
        ConsentDurationType::OneTime,
        ConsentDurationType::TimeBound,
        ConsentDurationType::Persistent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentDurationType::OneTime => "one_time",
            ConsentDurationType::TimeBound => "time_bound",
            ConsentDurationType::Persistent => "persistent",
        }
    }

    pub fn is_recognized(value: &str) -> bool {
        Self::ALL.iter().any(|d| d.as_str() == value)
    }
}

/// FDX data cluster scopes a data recipient may request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdxScope {
    AccountBasic,
    AccountDetailed,
    AccountPayments,
    CustomerContact,
    CustomerDetailed,
    Images,
    Investments,
    Statements,
    Transactions,
}

impl FdxScope {
    pub const ALL: [FdxScope; 9] = [
        FdxScope::AccountBasic,
        FdxScope::AccountDetailed,
        FdxScope::AccountPayments,
        FdxScope::CustomerContact,
        FdxScope::CustomerDetailed,
        FdxScope::Images,
        FdxScope::Investments,
        FdxScope::Statements,
        FdxScope::Transactions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FdxScope::AccountBasic => "ACCOUNT_BASIC",
            FdxScope::AccountDetailed => "ACCOUNT_DETAILED",
            FdxScope::AccountPayments => "ACCOUNT_PAYMENTS",
            FdxScope::CustomerContact => "CUSTOMER_CONTACT",
            FdxScope::CustomerDetailed => "CUSTOMER_DETAILED",
            FdxScope::Images => "IMAGES",
            FdxScope::Investments => "INVESTMENTS",
            FdxScope::Statements => "STATEMENTS",
            FdxScope::Transactions => "TRANSACTIONS",
        }
    }
}

/// OpenID Connect scope tokens accepted alongside the FDX data clusters.
pub const OPENID_SCOPE: &str = "openid";
pub const OFFLINE_ACCESS_SCOPE: &str = "offline_access";

/// Whether a single scope token is acceptable in a registration request.
/// Matching is case-insensitive, as the FDX data cluster names circulate in
/// both upper and lower case.
pub fn is_acceptable_scope_token(token: &str) -> bool {
    FdxScope::ALL
        .iter()
        .any(|s| s.as_str().eq_ignore_ascii_case(token))
        || OPENID_SCOPE.eq_ignore_ascii_case(token)
        || OFFLINE_ACCESS_SCOPE.eq_ignore_ascii_case(token)
}

/// Generic RFC 7591 client metadata owned by the host accelerator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreClientMetadata {
    /// Redirect/callback URIs
    pub redirect_uris: Option<Vec<String>>,
    /// Requested grant types
    pub grant_types: Option<Vec<String>>,
    /// Token endpoint authentication method
    pub token_endpoint_auth_method: Option<String>,
    /// Space-separated scope tokens
    pub scope: Option<String>,
}

/// FDX extension metadata carried next to the generic client metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FdxClientMetadata {
    /// Client display name
    pub client_name: Option<String>,
    /// Recipient application description
    pub description: Option<String>,
    /// Logo URI
    pub logo_uri: Option<String>,
    /// Client homepage URI
    pub client_uri: Option<String>,
    /// Contact addresses
    pub contacts: Option<Vec<String>>,
    /// Requested consent duration types
    pub duration_type: Option<Vec<String>>,
    /// Consent duration in days, required for time_bound consent
    #[serde(default, deserialize_with = "lenient_integer")]
    pub duration_period: Option<i64>,
    /// Historical data window in days
    #[serde(default, deserialize_with = "lenient_integer")]
    pub lookback_period: Option<i64>,
    /// External industry registry memberships claimed by the client
    pub registry_references: Option<Vec<RegistryReference>>,
}

/// A claim that the registering client is listed in an external industry
/// registry (for example a GLEIF legal-entity identifier). Equality is
/// value-based over the three fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryReference {
    pub registered_entity_name: Option<String>,
    pub registered_entity_id: Option<String>,
    pub registry: Option<String>,
}

/// An incoming client registration submission.
///
/// The typed view is deserialized from the raw request-parameter map (the
/// already-decoded DCR JWT claims); the map itself is carried alongside so
/// fields the typed model does not capture round-trip untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationRequest {
    #[serde(flatten)]
    pub core: CoreClientMetadata,
    #[serde(flatten)]
    pub fdx: FdxClientMetadata,
    /// Raw request parameters the typed view was built from
    #[serde(skip)]
    pub request_parameters: Map<String, Value>,
}

impl RegistrationRequest {
    /// Build a registration request from the decoded request-parameter map.
    pub fn from_request_parameters(
        request_parameters: Map<String, Value>,
    ) -> Result<Self, serde_json::Error> {
        let mut request: RegistrationRequest =
            serde_json::from_value(Value::Object(request_parameters.clone()))?;
        request.request_parameters = request_parameters;
        Ok(request)
    }
}

/// Client-facing registration response: the generic RFC 7591 response fields
/// plus the FDX extension. Rendering stored metadata through this type drops
/// anything outside the schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, deserialize_with = "lenient_integer")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id_issued_at: Option<i64>,
    #[serde(default, deserialize_with = "lenient_integer")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret_expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uris: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint_auth_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_statement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_client_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contacts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_type: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_integer")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_period: Option<i64>,
    #[serde(default, deserialize_with = "lenient_integer")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookback_period: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_references: Option<Vec<RegistryReference>>,
}

/// Whether an optional string field is effectively missing.
pub(crate) fn is_blank(value: Option<&str>) -> bool {
    value.map(str::trim).unwrap_or_default().is_empty()
}

/// Accept an integer-valued JSON number for an integer field even when the
/// upstream decoder produced a float. Truncates, matching the coercion
/// applied to the raw parameter map.
fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Ok(Some(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Some(f.trunc() as i64))
            } else {
                Err(serde::de::Error::custom(format!(
                    "number out of range: {}",
                    n
                )))
            }
        }
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a number, got {}",
            other
        ))),
    }
}
