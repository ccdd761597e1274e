//! Conditional validation rules for FDX registration requests.
//!
//! The rules form an explicit, ordered table. Every rule is evaluated against
//! the request even after an earlier rule has reported a violation, so a
//! violating request surfaces whichever check it trips first in table order.

use crate::config::DcrConfig;
use crate::errors::RegistrationError;

use super::types::{
    ConsentDurationType, RegistrationRequest, is_acceptable_scope_token, is_blank,
};

/// A named conditional check producing zero or more violations.
pub(crate) type ConditionalRule = (
    &'static str,
    fn(&RegistrationRequest, &DcrConfig) -> Vec<RegistrationError>,
);

/// Conditional checks in evaluation order.
pub(crate) const CONDITIONAL_RULES: &[ConditionalRule] = &[
    ("scope", check_scope),
    ("duration_type", check_duration_type),
    ("duration_period_positive", check_duration_period_positive),
    ("lookback_period_positive", check_lookback_period_positive),
    ("maximum_periods", check_maximum_periods),
    ("time_bound_duration_period", check_time_bound_duration_period),
    ("registry_references", check_registry_references),
];

/// Structural checks that fail fast before any conditional rule runs.
pub(crate) fn check_mandatory(request: &RegistrationRequest) -> Result<(), RegistrationError> {
    if is_blank(request.fdx.client_name.as_deref()) {
        return Err(RegistrationError::MandatoryFieldMissing(
            "Required parameter Client Name cannot be null or empty".to_string(),
        ));
    }

    if request
        .core
        .redirect_uris
        .as_ref()
        .map(Vec::is_empty)
        .unwrap_or(true)
    {
        return Err(RegistrationError::MandatoryFieldMissing(
            "Required parameter Redirect URIs can not be null or empty".to_string(),
        ));
    }

    Ok(())
}

/// Every scope token must be an FDX data cluster, `openid`, or
/// `offline_access`.
fn check_scope(request: &RegistrationRequest, _config: &DcrConfig) -> Vec<RegistrationError> {
    let Some(scope) = request.core.scope.as_deref() else {
        return Vec::new();
    };

    for token in scope.split_whitespace() {
        if !is_acceptable_scope_token(token) {
            tracing::error!(scope = token, "invalid scope requested");
            return vec![RegistrationError::PolicyViolation(
                "Invalid scope requested".to_string(),
            )];
        }
    }
    Vec::new()
}

fn check_duration_type(
    request: &RegistrationRequest,
    _config: &DcrConfig,
) -> Vec<RegistrationError> {
    let Some(duration_types) = request.fdx.duration_type.as_deref() else {
        return Vec::new();
    };

    for duration_type in duration_types {
        if !ConsentDurationType::is_recognized(duration_type) {
            tracing::error!(%duration_type, "invalid duration type requested");
            return vec![RegistrationError::PolicyViolation(
                "Invalid duration type requested".to_string(),
            )];
        }
    }
    Vec::new()
}

fn check_duration_period_positive(
    request: &RegistrationRequest,
    _config: &DcrConfig,
) -> Vec<RegistrationError> {
    match request.fdx.duration_period {
        Some(period) if period <= 0 => vec![RegistrationError::BoundViolation(
            "Duration Period cannot be zero or negative".to_string(),
        )],
        _ => Vec::new(),
    }
}

fn check_lookback_period_positive(
    request: &RegistrationRequest,
    _config: &DcrConfig,
) -> Vec<RegistrationError> {
    match request.fdx.lookback_period {
        Some(period) if period <= 0 => vec![RegistrationError::BoundViolation(
            "Lookback Period cannot be zero or negative".to_string(),
        )],
        _ => Vec::new(),
    }
}

/// Requested periods must not exceed the externally configured maxima. A
/// configured maximum that does not parse as an integer is itself a
/// validation failure.
fn check_maximum_periods(
    request: &RegistrationRequest,
    config: &DcrConfig,
) -> Vec<RegistrationError> {
    let mut violations = Vec::new();
    violations.extend(check_period_against_maximum(
        request.fdx.duration_period,
        config.maximum_duration_period.as_deref(),
        "Duration period",
    ));
    violations.extend(check_period_against_maximum(
        request.fdx.lookback_period,
        config.maximum_lookback_period.as_deref(),
        "Lookback period",
    ));
    violations
}

fn check_period_against_maximum(
    requested: Option<i64>,
    configured_maximum: Option<&str>,
    attribute: &str,
) -> Option<RegistrationError> {
    let requested = requested?;
    let configured_maximum = configured_maximum?;

    match configured_maximum.parse::<i64>() {
        Ok(maximum) if requested > maximum => {
            tracing::error!(
                attribute,
                requested,
                maximum,
                "requested period exceeds the maximum allowed period"
            );
            Some(RegistrationError::BoundViolation(format!(
                "{} should not exceed {} days",
                attribute, maximum
            )))
        }
        Ok(_) => None,
        Err(err) => {
            tracing::error!(attribute, %configured_maximum, %err, "error while resolving configs");
            Some(RegistrationError::ConfigurationError(
                "Invalid duration period or lookback period".to_string(),
            ))
        }
    }
}

/// A duration period is required whenever the requested duration types
/// include `time_bound`.
fn check_time_bound_duration_period(
    request: &RegistrationRequest,
    _config: &DcrConfig,
) -> Vec<RegistrationError> {
    let time_bound = request
        .fdx
        .duration_type
        .as_deref()
        .unwrap_or_default()
        .iter()
        .any(|d| d.as_str() == ConsentDurationType::TimeBound.as_str());

    if time_bound && request.fdx.duration_period.is_none() {
        tracing::error!("duration period not provided for time bound duration type");
        return vec![RegistrationError::ConditionalRequirement(
            "Duration period is required for time_bound duration type".to_string(),
        )];
    }
    Vec::new()
}

fn check_registry_references(
    request: &RegistrationRequest,
    _config: &DcrConfig,
) -> Vec<RegistrationError> {
    let Some(references) = request.fdx.registry_references.as_deref() else {
        return Vec::new();
    };

    let mut violations = Vec::new();
    for reference in references {
        if is_blank(reference.registered_entity_name.as_deref()) {
            violations.push(RegistrationError::MandatoryFieldMissing(
                "Registered Entity Name can not be null or empty in Registry References"
                    .to_string(),
            ));
        }
        if is_blank(reference.registered_entity_id.as_deref()) {
            violations.push(RegistrationError::MandatoryFieldMissing(
                "Registered Entity Id can not be null or empty in Registry References".to_string(),
            ));
        }
        if is_blank(reference.registry.as_deref()) {
            violations.push(RegistrationError::MandatoryFieldMissing(
                "Registry can not be null or empty in Registry References".to_string(),
            ));
        }
    }
    violations
}

/// Run every conditional rule, collecting all violations in table order.
pub(crate) fn run_conditional_rules(
    request: &RegistrationRequest,
    config: &DcrConfig,
) -> Vec<RegistrationError> {
    let mut violations = Vec::new();
    for (name, rule) in CONDITIONAL_RULES {
        let rule_violations = rule(request, config);
        for violation in &rule_violations {
            tracing::warn!(rule = name, error = %violation, "registration request violation");
        }
        violations.extend(rule_violations);
    }
    violations
}
