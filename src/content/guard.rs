//! Content safety coordination for mutating requests.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use thiserror::Error;

use crate::config::{ContentConfig, FieldClass};
use crate::content::sanitizer::{hostile_pattern, sanitize_rich, strip_all};
use crate::filter::WordFilter;
use crate::http::response::reject;
use crate::observability::metrics;

/// Maximum buffered request body, in bytes.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Audit annotation attached to the request after filtering, for logging
/// by downstream handlers. Never alters the response.
#[derive(Debug, Clone, Default)]
pub struct ContentAudit {
    /// Sensitive words that were found and replaced, in first-occurrence
    /// order across fields.
    pub matched_words: Vec<String>,
}

/// A fatal content problem. Soft issues (sensitive words under the
/// filter-only policy) never surface here; they are filtered in place.
#[derive(Debug, Error)]
pub enum ContentViolation {
    #[error("field '{field}' contains hostile markup ({pattern})")]
    Hostile { field: String, pattern: &'static str },

    #[error("field '{field}' exceeds {max} characters")]
    TooLong { field: String, max: usize },

    #[error("field '{field}' contains prohibited words")]
    Prohibited { field: String, words: Vec<String> },
}

impl ContentViolation {
    pub fn code(&self) -> &'static str {
        match self {
            ContentViolation::Hostile { .. } => "hostile_content",
            ContentViolation::TooLong { .. } => "field_too_long",
            ContentViolation::Prohibited { .. } => "prohibited_content",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            // Hostile markup and policy rejections are security denials;
            // an oversized field is an ordinary validation failure.
            ContentViolation::Hostile { .. } | ContentViolation::Prohibited { .. } => {
                StatusCode::FORBIDDEN
            }
            ContentViolation::TooLong { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

/// Orchestrates the sanitizer, the word filter, and per-class length
/// limits over the canonical field table.
pub struct ContentGuard {
    config: ContentConfig,
    filter: Arc<WordFilter>,
}

impl ContentGuard {
    pub fn new(config: ContentConfig, filter: Arc<WordFilter>) -> Self {
        Self { config, filter }
    }

    pub fn config(&self) -> &ContentConfig {
        &self.config
    }

    pub fn filter(&self) -> &Arc<WordFilter> {
        &self.filter
    }

    /// Check and clean every configured field present in the payload,
    /// mutating field values in place.
    ///
    /// Per field: hostile-pattern check on the original input (fatal),
    /// sanitize by class, word-filter (filter-and-continue by default,
    /// fatal under the per-class reject policy), then the class length
    /// limit.
    pub fn check_payload(&self, payload: &mut Value) -> Result<ContentAudit, ContentViolation> {
        let mut audit = ContentAudit::default();

        let Some(map) = payload.as_object_mut() else {
            return Ok(audit);
        };

        for (name, class) in &self.config.fields {
            let Some(value) = map.get_mut(name) else {
                continue;
            };
            let Some(text) = value.as_str() else {
                continue;
            };

            if let Some(pattern) = hostile_pattern(text) {
                return Err(ContentViolation::Hostile {
                    field: name.clone(),
                    pattern,
                });
            }

            let sanitized = match class {
                FieldClass::Title => strip_all(text),
                FieldClass::Body => sanitize_rich(text),
            };

            let matched = self.filter.find_all(&sanitized);
            let cleaned = if matched.is_empty() {
                sanitized
            } else if self.config.reject_on_match(*class) {
                return Err(ContentViolation::Prohibited {
                    field: name.clone(),
                    words: matched,
                });
            } else {
                for word in matched {
                    if !audit.matched_words.contains(&word) {
                        audit.matched_words.push(word);
                    }
                }
                self.filter.filter(&sanitized)
            };

            let max = self.config.max_chars(*class);
            if cleaned.chars().count() > max {
                return Err(ContentViolation::TooLong {
                    field: name.clone(),
                    max,
                });
            }

            *value = Value::String(cleaned);
        }

        Ok(audit)
    }
}

/// State for the content safety middleware.
#[derive(Clone)]
pub struct ContentState {
    pub guard: Arc<ContentGuard>,
}

/// Middleware applying content checks to state-changing methods.
/// GET/DELETE and friends pass through untouched.
pub async fn content_safety_middleware(
    State(state): State<ContentState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.guard.config().enabled {
        return next.run(request).await;
    }
    if !matches!(
        *request.method(),
        Method::POST | Method::PUT | Method::PATCH
    ) {
        return next.run(request).await;
    }

    let (mut parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            metrics::record_rejected("content", "body_too_large");
            return reject(
                StatusCode::PAYLOAD_TOO_LARGE,
                "body_too_large",
                "Request body too large",
            );
        }
    };

    // Only JSON payloads carry checkable fields; anything else is the
    // business layer's problem.
    let mut payload: Value = match serde_json::from_slice(&bytes) {
        Ok(payload) => payload,
        Err(_) => {
            let request = Request::from_parts(parts, Body::from(bytes));
            return next.run(request).await;
        }
    };

    match state.guard.check_payload(&mut payload) {
        Ok(audit) => {
            if !audit.matched_words.is_empty() {
                tracing::info!(words = ?audit.matched_words, "sensitive words filtered");
                metrics::record_words_filtered(audit.matched_words.len());
                parts.extensions.insert(audit);
            }
            let rewritten = match serde_json::to_vec(&payload) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!(error = %e, "failed to re-serialize cleaned payload");
                    return reject(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal",
                        "Internal error",
                    );
                }
            };
            let request = Request::from_parts(parts, Body::from(rewritten));
            next.run(request).await
        }
        Err(violation) => {
            tracing::warn!(code = violation.code(), %violation, "content rejected");
            metrics::record_rejected("content", violation.code());
            reject(violation.status(), violation.code(), &violation.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn guard(words: &[&str]) -> ContentGuard {
        let config = ContentConfig::default();
        let filter = Arc::new(WordFilter::new(
            words.iter().copied(),
            config.replacement.clone(),
        ));
        ContentGuard::new(config, filter)
    }

    #[test]
    fn sensitive_words_are_filtered_not_fatal() {
        let guard = guard(&["spam"]);
        let mut payload = json!({"title": "buy spam now", "content": "spam spam"});
        let audit = guard.check_payload(&mut payload).unwrap();
        assert_eq!(payload["title"], "buy *** now");
        assert_eq!(payload["content"], "*** ***");
        assert_eq!(audit.matched_words, vec!["spam".to_string()]);
    }

    #[test]
    fn hostile_markup_is_fatal() {
        let guard = guard(&[]);
        let mut payload = json!({"content": "<script>alert(1)</script>"});
        let violation = guard.check_payload(&mut payload).unwrap_err();
        assert!(matches!(violation, ContentViolation::Hostile { .. }));
        assert_eq!(violation.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn title_markup_is_stripped_body_keeps_formatting() {
        let guard = guard(&[]);
        let mut payload = json!({
            "title": "my <b>great</b> topic",
            "content": "some <b>bold</b> text"
        });
        guard.check_payload(&mut payload).unwrap();
        assert_eq!(payload["title"], "my great topic");
        assert_eq!(payload["content"], "some <b>bold</b> text");
    }

    #[test]
    fn reject_policy_escalates_matches() {
        let mut config = ContentConfig::default();
        config.title_reject_on_match = true;
        let filter = Arc::new(WordFilter::new(["spam"], config.replacement.clone()));
        let guard = ContentGuard::new(config, filter);

        let mut payload = json!({"title": "spam here"});
        let violation = guard.check_payload(&mut payload).unwrap_err();
        assert!(matches!(violation, ContentViolation::Prohibited { .. }));
    }

    #[test]
    fn over_long_title_is_a_validation_failure() {
        let mut config = ContentConfig::default();
        config.title_max_chars = 5;
        let filter = Arc::new(WordFilter::new(Vec::<String>::new(), "***"));
        let guard = ContentGuard::new(config, filter);

        let mut payload = json!({"title": "far too long for five"});
        let violation = guard.check_payload(&mut payload).unwrap_err();
        assert!(matches!(violation, ContentViolation::TooLong { max: 5, .. }));
        assert_eq!(violation.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unconfigured_fields_are_untouched() {
        let guard = guard(&["spam"]);
        let mut payload = json!({"unrelated": "spam stays here"});
        guard.check_payload(&mut payload).unwrap();
        assert_eq!(payload["unrelated"], "spam stays here");
    }

    #[test]
    fn non_string_fields_are_skipped() {
        let guard = guard(&["42"]);
        let mut payload = json!({"title": 42});
        guard.check_payload(&mut payload).unwrap();
        assert_eq!(payload["title"], 42);
    }

    #[test]
    fn non_object_payload_passes() {
        let guard = guard(&["spam"]);
        let mut payload = json!(["spam", "in", "an", "array"]);
        let audit = guard.check_payload(&mut payload).unwrap();
        assert!(audit.matched_words.is_empty());
    }
}
