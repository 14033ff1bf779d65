//! Rate limiting subsystem with two cooperating strategies.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → middleware.rs (resolve client IP, pick route limiter)
//!     → escalating.rs (abuse block, punitive cooldown)
//!     → fixed_window.rs (advisory throttling, X-RateLimit-* headers)
//!     → Pass or 429 with retry guidance
//! ```
//!
//! # Design Decisions
//! - Fixed windows for predictable throttling, escalating blocks for abuse
//! - One mutex per limiter table; the sweep holds it per deletion batch
//! - A background task bounds memory under high key cardinality

pub mod escalating;
pub mod fixed_window;
pub mod middleware;

pub use escalating::{spawn_sweeper, Decision, EscalatingLimiter};
pub use fixed_window::{FixedWindowLimiter, RateSpec, RateSpecError, RateStatus};
pub use middleware::{extract_client_ip, rate_limit_middleware, RateLimiterState};
