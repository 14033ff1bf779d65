//! Configuration validation.
//!
//! Semantic checks on top of what serde already guarantees syntactically.
//! Validation is a pure function: ShieldConfig -> Result<(), Vec<ValidationError>>.
//! All errors are collected and returned together, not just the first.

use thiserror::Error;

use crate::config::schema::ShieldConfig;
use crate::ratelimit::RateSpec;

/// A single semantic configuration problem.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("signature.secret_key must be at least 16 characters when verification is enabled")]
    WeakSecret,

    #[error("signature.secret_key is still the placeholder value")]
    PlaceholderSecret,

    #[error("signature.validity_window_secs must be greater than zero")]
    ZeroValidityWindow,

    #[error("signature.nonce_min_length must be at least 8")]
    NonceMinTooShort,

    #[error("rate_limit spec '{0}' is malformed (expected '<N>-<S|M|H|D>')")]
    BadRateSpec(String),

    #[error("abuse.max_requests must be greater than zero")]
    ZeroAbuseRate,

    #[error("abuse.window_secs must be greater than zero")]
    ZeroAbuseWindow,

    #[error("abuse.idle_horizon_secs ({horizon}) must exceed abuse.window_secs ({window})")]
    IdleHorizonTooShort { horizon: u64, window: u64 },

    #[error("content.replacement must not be empty")]
    EmptyReplacement,

    #[error("content length limit for '{0}' must be greater than zero")]
    ZeroLengthLimit(&'static str),
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &ShieldConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.signature.enabled {
        if config.signature.secret_key.len() < 16 {
            errors.push(ValidationError::WeakSecret);
        }
        if config.signature.secret_key == "CHANGE_ME_IN_PRODUCTION" {
            errors.push(ValidationError::PlaceholderSecret);
        }
        if config.signature.validity_window_secs == 0 {
            errors.push(ValidationError::ZeroValidityWindow);
        }
        if config.signature.nonce_min_length < 8 {
            errors.push(ValidationError::NonceMinTooShort);
        }
    }

    if config.rate_limit.enabled {
        if config.rate_limit.default_spec.parse::<RateSpec>().is_err() {
            errors.push(ValidationError::BadRateSpec(
                config.rate_limit.default_spec.clone(),
            ));
        }
        for spec in config.rate_limit.route_specs.values() {
            if spec.parse::<RateSpec>().is_err() {
                errors.push(ValidationError::BadRateSpec(spec.clone()));
            }
        }
    }

    if config.abuse.enabled {
        if config.abuse.max_requests == 0 {
            errors.push(ValidationError::ZeroAbuseRate);
        }
        if config.abuse.window_secs == 0 {
            errors.push(ValidationError::ZeroAbuseWindow);
        }
        if config.abuse.idle_horizon_secs <= config.abuse.window_secs {
            errors.push(ValidationError::IdleHorizonTooShort {
                horizon: config.abuse.idle_horizon_secs,
                window: config.abuse.window_secs,
            });
        }
    }

    if config.content.enabled {
        if config.content.replacement.is_empty() {
            errors.push(ValidationError::EmptyReplacement);
        }
        if config.content.title_max_chars == 0 {
            errors.push(ValidationError::ZeroLengthLimit("title"));
        }
        if config.content.body_max_chars == 0 {
            errors.push(ValidationError::ZeroLengthLimit("body"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ShieldConfig;

    #[test]
    fn default_config_is_valid() {
        let config = ShieldConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn enabled_signature_rejects_placeholder_secret() {
        let mut config = ShieldConfig::default();
        config.signature.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::PlaceholderSecret)));
    }

    #[test]
    fn bad_rate_spec_reported() {
        let mut config = ShieldConfig::default();
        config.rate_limit.default_spec = "nope".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::BadRateSpec(_))));
    }

    #[test]
    fn collects_multiple_errors() {
        let mut config = ShieldConfig::default();
        config.abuse.max_requests = 0;
        config.abuse.idle_horizon_secs = 10;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 2);
    }
}
