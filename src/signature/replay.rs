//! Replay-protected signature verification.
//!
//! The guard owns no mutable state of its own; atomicity of nonce
//! consumption is pushed to the [`NonceStore`] contract.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::config::SignatureConfig;
use crate::signature::codec::{canonical_query, verify_digest};
use crate::signature::store::NonceStore;

/// Why a signed request was rejected.
///
/// Categories are distinguished internally for diagnostics; the HTTP
/// layer may collapse them into a generic message.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("missing signature header: {0}")]
    MissingHeader(&'static str),

    #[error("malformed timestamp")]
    MalformedTimestamp,

    #[error("timestamp is in the future")]
    Future,

    #[error("timestamp outside validity window")]
    Expired,

    #[error("nonce shorter than {0} characters")]
    NonceTooShort(usize),

    #[error("signature mismatch")]
    Mismatch,

    #[error("nonce already used")]
    Replay,

    #[error("nonce store unavailable")]
    StoreUnavailable,
}

impl VerifyError {
    /// Machine-distinguishable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            VerifyError::MissingHeader(_) => "missing_header",
            VerifyError::MalformedTimestamp => "malformed_timestamp",
            VerifyError::Future => "future",
            VerifyError::Expired => "expired",
            VerifyError::NonceTooShort(_) => "nonce_too_short",
            VerifyError::Mismatch => "mismatch",
            VerifyError::Replay => "replay",
            VerifyError::StoreUnavailable => "store_unavailable",
        }
    }
}

/// Current Unix timestamp in seconds. Returns 0 if the system clock is
/// before the epoch, which no sane system reports.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Validates timestamp freshness and nonce shape, checks the digest, and
/// consumes the nonce through the TTL store.
pub struct ReplayGuard {
    config: SignatureConfig,
    store: Arc<dyn NonceStore>,
}

impl ReplayGuard {
    pub fn new(config: SignatureConfig, store: Arc<dyn NonceStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &SignatureConfig {
        &self.config
    }

    /// Verify a signed request whose canonical body slot is the raw body.
    ///
    /// Check order: timestamp freshness, nonce shape, digest (constant
    /// time), then exactly-once nonce consumption. The store call happens
    /// only after the signature is valid, so garbage traffic cannot churn
    /// the store.
    pub fn verify(
        &self,
        method: &str,
        path: &str,
        timestamp: u64,
        nonce: &str,
        body: &str,
        provided: &str,
    ) -> Result<(), VerifyError> {
        let now = current_timestamp();

        if timestamp > now {
            return Err(VerifyError::Future);
        }
        if now - timestamp > self.config.validity_window_secs {
            return Err(VerifyError::Expired);
        }
        if nonce.chars().count() < self.config.nonce_min_length {
            return Err(VerifyError::NonceTooShort(self.config.nonce_min_length));
        }
        if !verify_digest(
            &self.config.secret_key,
            method,
            path,
            timestamp,
            nonce,
            body,
            provided,
        ) {
            return Err(VerifyError::Mismatch);
        }

        // TTL at least the validity window, so a nonce cannot be replayed
        // inside the window it was accepted in.
        let ttl = Duration::from_secs(self.config.validity_window_secs);
        match self.store.insert_if_absent(nonce, ttl) {
            Ok(true) => Ok(()),
            Ok(false) => Err(VerifyError::Replay),
            Err(e) => {
                // Fail closed: an unreachable store must not silently
                // disable replay protection.
                tracing::error!(error = %e, "nonce store failure during verification");
                Err(VerifyError::StoreUnavailable)
            }
        }
    }

    /// Verify a signed request whose canonical body slot is built from
    /// query parameters, sorted by key.
    pub fn verify_with_query<'a, I>(
        &self,
        method: &str,
        path: &str,
        timestamp: u64,
        nonce: &str,
        params: I,
        provided: &str,
    ) -> Result<(), VerifyError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let query = canonical_query(params);
        self.verify(method, path, timestamp, nonce, &query, provided)
    }
}
