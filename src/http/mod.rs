//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware chain)
//!     → request.rs (request id)
//!     → [rate limits → signature → content checks]
//!     → forum backend (stub handler here)
//!     → response.rs (rejection bodies, rate headers)
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdLayer, X_REQUEST_ID};
pub use server::ShieldServer;
