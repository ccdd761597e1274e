//! FDX dynamic client registration validation and normalization.
//!
//! Checks an incoming registration submission against the FDX policy rules,
//! then fills in grant-type and auth-method defaults and corrects numeric
//! fields before the host pipeline persists the client.

use std::sync::Arc;

use serde_json::{Map, Number, Value};

use crate::config::DcrConfig;
use crate::errors::RegistrationError;

use super::response::{promote_embedded_json, render_response};
use super::rules::{check_mandatory, run_conditional_rules};
use super::types::*;

/// Synchronous collaborator that issues registration credentials and knows
/// the registration endpoint location. Owned by the host accelerator.
pub trait CredentialIssuer: Send + Sync {
    /// Issue a registration access token bound to the client's TLS
    /// certificate.
    fn issue_access_token(
        &self,
        client_id: &str,
        tls_certificate: &str,
    ) -> Result<String, RegistrationError>;

    /// Base URI the client id is appended to when building the
    /// `registration_client_uri`.
    fn registration_client_base_uri(&self) -> String;
}

/// FDX registration request validator.
pub struct RegistrationValidator {
    config: DcrConfig,
    issuer: Arc<dyn CredentialIssuer>,
}

impl RegistrationValidator {
    /// Create a new registration validator
    pub fn new(config: DcrConfig, issuer: Arc<dyn CredentialIssuer>) -> Self {
        Self { config, issuer }
    }

    /// Validate and normalize a new registration submission.
    pub fn validate_create(
        &self,
        request: &mut RegistrationRequest,
    ) -> Result<(), RegistrationError> {
        self.validate_request(request)
    }

    /// Validate and normalize an update to an existing registration.
    pub fn validate_update(
        &self,
        request: &mut RegistrationRequest,
    ) -> Result<(), RegistrationError> {
        self.validate_request(request)
    }

    /// Shared create/update algorithm: mandatory checks fail fast, the
    /// conditional rule table runs in full, and normalization is applied
    /// even when a conditional rule reported a violation, matching the
    /// host accelerator. Callers persist the request only on `Ok`.
    fn validate_request(
        &self,
        request: &mut RegistrationRequest,
    ) -> Result<(), RegistrationError> {
        check_mandatory(request)?;

        let violations = run_conditional_rules(request, &self.config);

        apply_allowed_grant_types(request);
        apply_allowed_token_endpoint_auth_method(request, &self.config);
        coerce_period_value(&mut request.request_parameters, DURATION_PERIOD);
        coerce_period_value(&mut request.request_parameters, LOOKBACK_PERIOD);

        match violations.into_iter().next() {
            Some(violation) => Err(violation),
            None => Ok(()),
        }
    }

    /// Render the client-facing JSON response from the stored metadata of a
    /// successfully registered client.
    ///
    /// Embedded JSON-object strings inside list-valued entries are promoted
    /// to structured values, issued credentials are injected when the
    /// modify-response flag is enabled, and the result is serialized through
    /// the FDX registration response schema.
    pub fn registration_response(
        &self,
        mut metadata: Map<String, Value>,
    ) -> Result<String, RegistrationError> {
        promote_embedded_json(&mut metadata);

        if self.config.modify_response.enabled() {
            let client_id = required_metadata_string(&metadata, CLIENT_ID)?;
            let tls_certificate = required_metadata_string(&metadata, TLS_CERT)?;

            if !metadata.contains_key(REGISTRATION_ACCESS_TOKEN) {
                let access_token = self
                    .issuer
                    .issue_access_token(&client_id, &tls_certificate)?;
                metadata.insert(
                    REGISTRATION_ACCESS_TOKEN.to_string(),
                    Value::String(access_token),
                );
            }

            let registration_client_uri =
                format!("{}{}", self.issuer.registration_client_base_uri(), client_id);
            metadata.insert(
                REGISTRATION_CLIENT_URI.to_string(),
                Value::String(registration_client_uri),
            );
        }

        render_response(metadata)
    }
}

fn required_metadata_string(
    metadata: &Map<String, Value>,
    key: &str,
) -> Result<String, RegistrationError> {
    match metadata.get(key) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(RegistrationError::CredentialIssuance(format!(
            "{} missing from stored metadata",
            key
        ))),
    }
}

/// Keep only the allowed grant types the recipient requested, preserving the
/// requester's relative order; if none were requested or none survive the
/// filter, fall back to the full allowed set.
fn apply_allowed_grant_types(request: &mut RegistrationRequest) {
    let mut grant_types: Vec<String> = request
        .core
        .grant_types
        .take()
        .map(|requested| {
            requested
                .into_iter()
                .filter(|grant_type| AllowedGrantType::is_allowed(grant_type))
                .collect()
        })
        .unwrap_or_default();

    if grant_types.is_empty() {
        grant_types = AllowedGrantType::ALL
            .iter()
            .map(|grant_type| grant_type.as_str().to_string())
            .collect();
    }

    request.request_parameters.insert(
        GRANT_TYPES.to_string(),
        Value::Array(grant_types.iter().cloned().map(Value::String).collect()),
    );
    request.core.grant_types = Some(grant_types);
}

/// Replace a blank or disallowed token endpoint auth method with the
/// configured default, falling back to `private_key_jwt` when the configured
/// default is itself outside the allowed set.
fn apply_allowed_token_endpoint_auth_method(request: &mut RegistrationRequest, config: &DcrConfig) {
    let requested = request
        .core
        .token_endpoint_auth_method
        .as_deref()
        .unwrap_or_default();

    if !requested.trim().is_empty() && TokenEndpointAuthMethod::is_allowed(requested) {
        return;
    }

    let auth_method = match config.default_token_endpoint_auth_method.as_deref() {
        Some(configured) if TokenEndpointAuthMethod::is_allowed(configured) => {
            configured.to_string()
        }
        _ => TokenEndpointAuthMethod::FALLBACK.as_str().to_string(),
    };

    request.request_parameters.insert(
        TOKEN_ENDPOINT_AUTH_METHOD.to_string(),
        Value::String(auth_method.clone()),
    );
    request.core.token_endpoint_auth_method = Some(auth_method);
}

/// Rewrite a float-valued period in the raw parameter map as an integer
/// (truncation, not rounding). Generic JSON decoding on the host side
/// delivers whole-number periods as floats.
fn coerce_period_value(request_parameters: &mut Map<String, Value>, key: &str) {
    if let Some(Value::Number(number)) = request_parameters.get(key) {
        if number.as_i64().is_none() {
            if let Some(float_value) = number.as_f64() {
                request_parameters.insert(
                    key.to_string(),
                    Value::Number(Number::from(float_value.trunc() as i64)),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StubCredentialIssuer {
        access_token: String,
        base_uri: String,
    }

    impl CredentialIssuer for StubCredentialIssuer {
        fn issue_access_token(
            &self,
            _client_id: &str,
            _tls_certificate: &str,
        ) -> Result<String, RegistrationError> {
            Ok(self.access_token.clone())
        }

        fn registration_client_base_uri(&self) -> String {
            self.base_uri.clone()
        }
    }

    fn issuer() -> Arc<dyn CredentialIssuer> {
        Arc::new(StubCredentialIssuer {
            access_token: "CCCCC".to_string(),
            base_uri: "https://host/register/".to_string(),
        })
    }

    fn validator(config: DcrConfig) -> RegistrationValidator {
        RegistrationValidator::new(config, issuer())
    }

    fn valid_request() -> RegistrationRequest {
        let parameters = json!({
            "client_name": "My Example Client",
            "redirect_uris": ["https://www.mockcompany.com/redirects/redirect1"],
            "scope": "ACCOUNT_DETAILED ACCOUNT_PAYMENTS TRANSACTIONS openid",
            "token_endpoint_auth_method": "private_key_jwt",
            "grant_types": ["client_credentials", "authorization_code", "refresh_token",
                            "urn:ietf:params:oauth:grant-type:jwt-bearer"],
            "duration_type": ["time_bound", "one_time"],
            "duration_period": 65,
            "lookback_period": 265
        });
        RegistrationRequest::from_request_parameters(parameters.as_object().unwrap().clone())
            .unwrap()
    }

    #[test]
    fn test_validate_create_normalizes_valid_request() {
        let mut request = valid_request();
        validator(DcrConfig::default())
            .validate_create(&mut request)
            .unwrap();

        // The jwt-bearer grant is filtered out, requester order preserved.
        assert_eq!(
            request.core.grant_types,
            Some(vec![
                "client_credentials".to_string(),
                "authorization_code".to_string(),
                "refresh_token".to_string(),
            ])
        );
        assert_eq!(
            request.request_parameters.get(GRANT_TYPES),
            Some(&json!(["client_credentials", "authorization_code", "refresh_token"]))
        );
        assert_eq!(
            request.core.token_endpoint_auth_method.as_deref(),
            Some("private_key_jwt")
        );
    }

    #[test]
    fn test_grant_type_defaulting_table() {
        let full_set = vec![
            "authorization_code".to_string(),
            "refresh_token".to_string(),
            "client_credentials".to_string(),
        ];
        let cases: Vec<(Option<Vec<&str>>, Vec<String>)> = vec![
            (None, full_set.clone()),
            (Some(vec![]), full_set.clone()),
            (Some(vec!["auth_code"]), full_set.clone()),
            (
                Some(vec!["authorization_code", "refresh_token"]),
                vec!["authorization_code".to_string(), "refresh_token".to_string()],
            ),
            (
                Some(vec!["authorization_code"]),
                vec!["authorization_code".to_string()],
            ),
        ];

        for (requested, expected) in cases {
            let mut request = valid_request();
            request.core.grant_types =
                requested.map(|types| types.into_iter().map(String::from).collect());
            apply_allowed_grant_types(&mut request);
            assert_eq!(request.core.grant_types, Some(expected.clone()));
            assert_eq!(
                request.request_parameters.get(GRANT_TYPES),
                Some(&json!(expected))
            );
        }
    }

    #[test]
    fn test_auth_method_defaulting_table() {
        let config = DcrConfig {
            default_token_endpoint_auth_method: "tls_client_auth".into(),
            ..DcrConfig::default()
        };
        let cases = [
            (None, "tls_client_auth"),
            (Some(""), "tls_client_auth"),
            (Some("private_key_jwt"), "private_key_jwt"),
            (Some("tls_client_auth"), "tls_client_auth"),
            (Some("sample_auth_method"), "tls_client_auth"),
        ];

        for (requested, expected) in cases {
            let mut request = valid_request();
            request.core.token_endpoint_auth_method = requested.map(String::from);
            apply_allowed_token_endpoint_auth_method(&mut request, &config);
            assert_eq!(
                request.core.token_endpoint_auth_method.as_deref(),
                Some(expected)
            );
        }
    }

    #[test]
    fn test_auth_method_falls_back_when_configured_default_disallowed() {
        let config = DcrConfig {
            default_token_endpoint_auth_method: "client_secret_basic".into(),
            ..DcrConfig::default()
        };
        let mut request = valid_request();
        request.core.token_endpoint_auth_method = None;
        apply_allowed_token_endpoint_auth_method(&mut request, &config);
        assert_eq!(
            request.core.token_endpoint_auth_method.as_deref(),
            Some("private_key_jwt")
        );
    }

    #[test]
    fn test_period_values_coerced_to_integers() {
        let mut request = valid_request();
        request
            .request_parameters
            .insert(DURATION_PERIOD.to_string(), json!(65.0));
        request
            .request_parameters
            .insert(LOOKBACK_PERIOD.to_string(), json!(265.9));

        validator(DcrConfig::default())
            .validate_create(&mut request)
            .unwrap();

        assert_eq!(request.request_parameters.get(DURATION_PERIOD), Some(&json!(65)));
        assert_eq!(request.request_parameters.get(LOOKBACK_PERIOD), Some(&json!(265)));
    }

    #[test]
    fn test_validation_is_idempotent_on_normalized_request() {
        let mut request = valid_request();
        let validator = validator(DcrConfig::default());
        validator.validate_create(&mut request).unwrap();

        let first_pass = request.clone();
        validator.validate_create(&mut request).unwrap();

        assert_eq!(request.core.grant_types, first_pass.core.grant_types);
        assert_eq!(
            request.core.token_endpoint_auth_method,
            first_pass.core.token_endpoint_auth_method
        );
        assert_eq!(request.request_parameters, first_pass.request_parameters);
    }

    #[test]
    fn test_rejected_request_still_normalized() {
        let mut request = valid_request();
        request.core.scope = Some("TAX PAYMENTS".to_string());
        request.core.grant_types = None;

        let err = validator(DcrConfig::default())
            .validate_create(&mut request)
            .unwrap_err();
        assert_eq!(err.description(), "Invalid scope requested");
        // Defaults were applied despite the rejection.
        assert_eq!(
            request.core.grant_types,
            Some(vec![
                "authorization_code".to_string(),
                "refresh_token".to_string(),
                "client_credentials".to_string(),
            ])
        );
    }

    #[test]
    fn test_mandatory_failure_reported_before_conditional_rules() {
        let mut request = valid_request();
        request.fdx.client_name = None;
        request.core.scope = Some("TAX".to_string());

        let err = validator(DcrConfig::default())
            .validate_create(&mut request)
            .unwrap_err();
        assert_eq!(
            err.description(),
            "Required parameter Client Name cannot be null or empty"
        );
    }

    #[test]
    fn test_registration_response_injects_issued_credentials() {
        let config = DcrConfig {
            modify_response: true.into(),
            ..DcrConfig::default()
        };
        let metadata = json!({
            "client_id": "AAAAAA",
            "tls_cert": "BBBBBB"
        });

        let response = validator(config)
            .registration_response(metadata.as_object().unwrap().clone())
            .unwrap();

        assert!(response.contains("\"registration_client_uri\":\"https://host/register/AAAAAA\""));
        assert!(response.contains("\"registration_access_token\":\"CCCCC\""));
    }

    #[test]
    fn test_registration_response_keeps_existing_access_token() {
        let config = DcrConfig {
            modify_response: true.into(),
            ..DcrConfig::default()
        };
        let metadata = json!({
            "client_id": "AAAAAA",
            "tls_cert": "BBBBBB",
            "registration_access_token": "EXISTING"
        });

        let response = validator(config)
            .registration_response(metadata.as_object().unwrap().clone())
            .unwrap();

        assert!(response.contains("\"registration_access_token\":\"EXISTING\""));
        assert!(response.contains("\"registration_client_uri\":\"https://host/register/AAAAAA\""));
    }

    #[test]
    fn test_registration_response_without_modify_flag_is_untouched() {
        let metadata = json!({
            "client_id": "AAAAAA",
            "tls_cert": "BBBBBB",
            "client_name": "My Example Client"
        });

        let response = validator(DcrConfig::default())
            .registration_response(metadata.as_object().unwrap().clone())
            .unwrap();

        assert!(!response.contains("registration_access_token"));
        assert!(!response.contains("registration_client_uri"));
        assert!(response.contains("\"client_name\":\"My Example Client\""));
    }
}
