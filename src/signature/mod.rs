//! Request signature subsystem.
//!
//! # Data Flow
//! ```text
//! X-Timestamp / X-Nonce / X-Signature headers
//!     → codec.rs (canonical string, HMAC-SHA-256, hex)
//!     → replay.rs (freshness, nonce shape, constant-time compare)
//!     → store.rs (atomic insert-if-absent, TTL ≥ validity window)
//! ```
//!
//! # Design Decisions
//! - Signing is a pure function; all state lives behind the store seam
//! - Nonce consumption is one atomic primitive, never check-then-set
//! - Store failure fails closed for signature-protected routes

pub mod codec;
pub mod middleware;
pub mod replay;
pub mod store;

/// Header carrying the Unix timestamp of the signed request.
pub const TIMESTAMP_HEADER: &str = "x-timestamp";
/// Header carrying the per-request nonce.
pub const NONCE_HEADER: &str = "x-nonce";
/// Header carrying the lowercase hex HMAC digest.
pub const SIGNATURE_HEADER: &str = "x-signature";

pub use codec::{
    canonical_query, canonical_string, generate_nonce, sign, sign_with_query, SignedRequest,
};
pub use middleware::{signature_middleware, SignatureState};
pub use replay::{current_timestamp, ReplayGuard, VerifyError};
pub use store::{MemoryNonceStore, NonceStore, NonceStoreError};
