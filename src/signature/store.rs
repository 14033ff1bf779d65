//! Nonce tracking store interface and in-process implementation.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Error from the nonce store.
#[derive(Debug, Error)]
pub enum NonceStoreError {
    /// The store is unreachable or failed. Callers must fail closed.
    #[error("nonce store unavailable: {0}")]
    Unavailable(String),
}

/// TTL-keyed store used for replay protection.
///
/// The only primitive is an atomic insert-if-absent. A separate
/// "has" followed by "set" would leave a race window in which two
/// concurrent requests carrying the same nonce both pass the check,
/// so that sequence is deliberately not part of this interface.
///
/// Implementations may block (e.g. a Redis round trip); callers bound
/// the call with a request-level timeout.
pub trait NonceStore: Send + Sync {
    /// Record `key` if it has not been seen within its TTL.
    ///
    /// Returns `Ok(true)` if the key was fresh and is now recorded,
    /// `Ok(false)` if the key was already present (replay).
    fn insert_if_absent(&self, key: &str, ttl: Duration) -> Result<bool, NonceStoreError>;
}

/// Maximum entries before the memory store forces an expiry sweep.
const MAX_ENTRIES: usize = 100_000;

/// In-process nonce store backed by a `HashMap` of expiry instants.
///
/// Suitable for a single process; multi-process deployments point the
/// [`NonceStore`] seam at a shared external store instead.
pub struct MemoryNonceStore {
    entries: Mutex<HashMap<String, Instant>>,
}

impl MemoryNonceStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Current number of tracked nonces (expired entries included until
    /// the next forced sweep).
    pub fn len(&self) -> usize {
        self.entries.lock().expect("nonce store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryNonceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NonceStore for MemoryNonceStore {
    fn insert_if_absent(&self, key: &str, ttl: Duration) -> Result<bool, NonceStoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("nonce store mutex poisoned");

        if entries.len() >= MAX_ENTRIES {
            entries.retain(|_, expiry| *expiry > now);
        }

        match entries.get(key) {
            Some(&expiry) if expiry > now => Ok(false),
            _ => {
                entries.insert(key.to_string(), now + ttl);
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_insert_succeeds_second_is_replay() {
        let store = MemoryNonceStore::new();
        let ttl = Duration::from_secs(60);
        assert!(store.insert_if_absent("nonce-a", ttl).unwrap());
        assert!(!store.insert_if_absent("nonce-a", ttl).unwrap());
    }

    #[test]
    fn distinct_nonces_are_independent() {
        let store = MemoryNonceStore::new();
        let ttl = Duration::from_secs(60);
        assert!(store.insert_if_absent("nonce-a", ttl).unwrap());
        assert!(store.insert_if_absent("nonce-b", ttl).unwrap());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn expired_nonce_can_be_reused() {
        let store = MemoryNonceStore::new();
        assert!(store.insert_if_absent("nonce-a", Duration::ZERO).unwrap());
        assert!(store.insert_if_absent("nonce-a", Duration::from_secs(60)).unwrap());
    }
}
