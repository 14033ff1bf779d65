//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → Validate → Build shield state → Spawn sweeper → Serve
//!
//! Shutdown:
//!     Ctrl+C → broadcast shutdown → sweeper exits → server drains → Exit
//! ```

pub mod shutdown;

pub use shutdown::{shutdown_signal, Shutdown};
