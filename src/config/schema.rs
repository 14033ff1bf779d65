//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the shield.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Classification of a checked payload field.
///
/// Title-like fields are short, plain-text values (topic titles, display
/// names); body-like fields may carry limited rich text (post bodies,
/// comments). The class decides the sanitizer mode and the length limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldClass {
    Title,
    Body,
}

/// Root configuration for the shield.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ShieldConfig {
    /// Listener configuration (bind address, timeout).
    pub listener: ListenerConfig,

    /// Request signature verification settings.
    pub signature: SignatureConfig,

    /// Fixed-window rate limiting settings.
    pub rate_limit: RateLimitConfig,

    /// Escalating abuse-block settings.
    pub abuse: AbuseConfig,

    /// Content safety settings (sanitizer + word filter).
    pub content: ContentConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Request signature verification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SignatureConfig {
    /// Enable signature verification.
    pub enabled: bool,

    /// Shared HMAC secret. Must be set when verification is enabled.
    pub secret_key: String,

    /// How far in the past a timestamp may lie, in seconds.
    pub validity_window_secs: u64,

    /// Minimum accepted nonce length.
    pub nonce_min_length: usize,

    /// When false, requests without any signature headers pass through
    /// unverified. Present-but-invalid headers always reject.
    pub require_signature: bool,

    /// Collapse rejection reasons into a generic message in responses.
    /// Reason categories are still logged internally.
    pub generic_errors: bool,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            secret_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            validity_window_secs: 300,
            nonce_min_length: 16,
            require_signature: true,
            generic_errors: true,
        }
    }
}

/// Fixed-window rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable fixed-window rate limiting.
    pub enabled: bool,

    /// Default rate spec, e.g. "300-M" (300 requests per minute).
    pub default_spec: String,

    /// Per-route overrides: path prefix -> rate spec.
    pub route_specs: HashMap<String, String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_spec: "300-M".to_string(),
            route_specs: HashMap::new(),
        }
    }
}

/// Escalating abuse-block configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AbuseConfig {
    /// Enable the escalating limiter.
    pub enabled: bool,

    /// Maximum requests per key per window before a block is imposed.
    pub max_requests: u32,

    /// Sliding window length in seconds.
    pub window_secs: u64,

    /// Block duration once the threshold is exceeded, in seconds.
    pub cooldown_secs: u64,

    /// How often the background sweep runs, in seconds.
    pub sweep_interval_secs: u64,

    /// Entries idle longer than this are evicted by the sweep.
    /// Should be substantially longer than the window itself.
    pub idle_horizon_secs: u64,
}

impl Default for AbuseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_secs: 60,
            cooldown_secs: 60,
            sweep_interval_secs: 60,
            idle_horizon_secs: 600,
        }
    }
}

/// Content safety configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Enable content checks on mutating requests.
    pub enabled: bool,

    /// Replacement token for filtered sensitive words.
    pub replacement: String,

    /// Initial sensitive word list, loaded at startup.
    pub words: Vec<String>,

    /// Canonical field table: payload field name -> field class.
    /// Every content check consumes this single map.
    pub fields: HashMap<String, FieldClass>,

    /// Maximum length (in characters) for title-class fields.
    pub title_max_chars: usize,

    /// Maximum length (in characters) for body-class fields.
    pub body_max_chars: usize,

    /// Reject requests outright when a title-class field matches a
    /// sensitive word, instead of filtering and continuing.
    pub title_reject_on_match: bool,

    /// Same policy toggle for body-class fields.
    pub body_reject_on_match: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        let mut fields = HashMap::new();
        fields.insert("title".to_string(), FieldClass::Title);
        fields.insert("nickname".to_string(), FieldClass::Title);
        fields.insert("content".to_string(), FieldClass::Body);
        fields.insert("body".to_string(), FieldClass::Body);
        fields.insert("description".to_string(), FieldClass::Body);

        Self {
            enabled: true,
            replacement: "***".to_string(),
            words: Vec::new(),
            fields,
            title_max_chars: 100,
            body_max_chars: 65_535,
            title_reject_on_match: false,
            body_reject_on_match: false,
        }
    }
}

impl ContentConfig {
    /// Length limit for a field class.
    pub fn max_chars(&self, class: FieldClass) -> usize {
        match class {
            FieldClass::Title => self.title_max_chars,
            FieldClass::Body => self.body_max_chars,
        }
    }

    /// Whether a sensitive-word match is fatal for a field class.
    pub fn reject_on_match(&self, class: FieldClass) -> bool {
        match class {
            FieldClass::Title => self.title_reject_on_match,
            FieldClass::Body => self.body_reject_on_match,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
