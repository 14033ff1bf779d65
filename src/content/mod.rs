//! Content safety subsystem.
//!
//! # Data Flow
//! ```text
//! Mutating request (POST/PUT/PATCH):
//!     → guard.rs (canonical field table: which fields, which class)
//!     → sanitizer.rs (hostile check, strip or allow-list markup)
//!     → word filter (filter-and-continue, or reject per class policy)
//!     → length limits per class
//!     → cleaned payload forwarded, audit attached to extensions
//! ```
//!
//! # Design Decisions
//! - Hostile markup rejects outright; sensitive words filter by default
//! - The reject-on-match escalation is a per-class config toggle
//! - One field table in config, consumed by every check

pub mod guard;
pub mod sanitizer;

pub use guard::{
    content_safety_middleware, ContentAudit, ContentGuard, ContentState, ContentViolation,
};
pub use sanitizer::{hostile_pattern, sanitize_rich, strip_all};
