//! Forum Shield
//!
//! Request-integrity and content-safety middleware for a forum backend,
//! built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌────────────────────────────────────────────┐
//!                    │                FORUM SHIELD                 │
//!                    │                                            │
//!   Client Request   │  ┌───────────┐  ┌───────────┐  ┌────────┐ │
//!   ─────────────────┼─▶│ ratelimit │─▶│ signature │─▶│content │ │
//!                    │  │ fixed win │  │ HMAC +    │  │sanitize│ │
//!                    │  │ + abuse   │  │ replay    │  │+ filter│ │
//!                    │  └───────────┘  └───────────┘  └───┬────┘ │
//!                    │                                    │      │
//!                    │                                    ▼      │
//!   Client Response  │                            ┌────────────┐ │
//!   ◀────────────────┼────────────────────────────│   forum    │ │
//!                    │                            │  backend   │ │
//!                    │                            └────────────┘ │
//!                    │                                            │
//!                    │  ┌──────────────────────────────────────┐ │
//!                    │  │        Cross-Cutting Concerns         │ │
//!                    │  │  config · observability · lifecycle   │ │
//!                    │  └──────────────────────────────────────┘ │
//!                    └────────────────────────────────────────────┘
//! ```
//!
//! Every check engine is constructed explicitly from configuration and
//! injected into its middleware; there are no process-wide singletons.

// Core subsystems
pub mod config;
pub mod content;
pub mod filter;
pub mod http;
pub mod ratelimit;
pub mod signature;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ShieldConfig;
pub use http::ShieldServer;
pub use lifecycle::Shutdown;
