//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ShieldConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - The field-name → field-class table lives here, once, and every
//!   content check consumes the same map

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{
    AbuseConfig, ContentConfig, FieldClass, ListenerConfig, ObservabilityConfig, RateLimitConfig,
    ShieldConfig, SignatureConfig,
};
