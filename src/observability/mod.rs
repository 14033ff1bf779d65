//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields, request IDs)
//!     → metrics.rs (counters for rejections, filtered words, sweeps)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging via the tracing crate, level set from config
//! - Metrics are cheap (atomic increments) and recorded at denial sites

pub mod metrics;
