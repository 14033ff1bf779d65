//! Canonical string construction and HMAC computation.
//!
//! Pure functions, stateless, safe for unlimited concurrent calls.

use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Build the canonical signable string:
/// `METHOD\nPATH\nTIMESTAMP\nNONCE\nBODY` with the method upper-cased.
pub fn canonical_string(
    method: &str,
    path: &str,
    timestamp: u64,
    nonce: &str,
    body: &str,
) -> String {
    format!(
        "{}\n{}\n{}\n{}\n{}",
        method.to_uppercase(),
        path,
        timestamp,
        nonce,
        body
    )
}

/// Deterministic canonical form of query parameters: keys sorted
/// ascending, joined as `key=value&key=value`. Input order is irrelevant.
pub fn canonical_query<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut pairs: Vec<(&str, &str)> = params.into_iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Compute the request signature: lowercase hex HMAC-SHA-256 over the
/// canonical string, 64 characters.
pub fn sign(secret: &str, method: &str, path: &str, timestamp: u64, nonce: &str, body: &str) -> String {
    let canonical = canonical_string(method, path, timestamp, nonce, body);
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(canonical.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Like [`sign`], but the body slot carries the sorted query parameters
/// instead of a request body. Used for signed GET requests.
pub fn sign_with_query<'a, I>(
    secret: &str,
    method: &str,
    path: &str,
    timestamp: u64,
    nonce: &str,
    params: I,
) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    sign(secret, method, path, timestamp, nonce, &canonical_query(params))
}

/// Constant-time comparison of a supplied hex signature against the
/// expected digest for the canonical string. Never short-circuits on the
/// first differing byte; any mismatch is reported without detail.
pub fn verify_digest(
    secret: &str,
    method: &str,
    path: &str,
    timestamp: u64,
    nonce: &str,
    body: &str,
    provided_hex: &str,
) -> bool {
    let provided = match hex::decode(provided_hex) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let canonical = canonical_string(method, path, timestamp, nonce, body);
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(canonical.as_bytes());
    // Mac::verify_slice compares in constant time.
    mac.verify_slice(&provided).is_ok()
}

/// Generate a random alphanumeric nonce of the given length.
/// Convenience for signed callers and tests.
pub fn generate_nonce(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Client-side helper: a ready-to-send signature header set with a
/// fresh timestamp and nonce.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub timestamp: u64,
    pub nonce: String,
    pub signature: String,
}

impl SignedRequest {
    /// Sign a request over its raw body.
    pub fn for_body(secret: &str, method: &str, path: &str, body: &str) -> Self {
        let timestamp = crate::signature::current_timestamp();
        let nonce = generate_nonce(24);
        let signature = sign(secret, method, path, timestamp, &nonce, body);
        Self {
            timestamp,
            nonce,
            signature,
        }
    }

    /// Sign a bodyless request over its query parameters.
    pub fn for_query<'a, I>(secret: &str, method: &str, path: &str, params: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let timestamp = crate::signature::current_timestamp();
        let nonce = generate_nonce(24);
        let signature = sign_with_query(secret, method, path, timestamp, &nonce, params);
        Self {
            timestamp,
            nonce,
            signature,
        }
    }

    /// The three signature headers as name/value pairs.
    pub fn headers(&self) -> [(&'static str, String); 3] {
        [
            (crate::signature::TIMESTAMP_HEADER, self.timestamp.to_string()),
            (crate::signature::NONCE_HEADER, self.nonce.clone()),
            (crate::signature::SIGNATURE_HEADER, self.signature.clone()),
        ]
    }
}
