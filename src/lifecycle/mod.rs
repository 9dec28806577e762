//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build connectors → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Signal or trigger → Stop accepting → Finish in-flight calls → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener starts last (traffic only when connectors are ready)

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
