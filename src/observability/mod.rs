//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Request ID attached to every inbound span
//! - Metrics are cheap (atomic increments); no-ops until a recorder is installed
//! - Auth material never appears in logs or metric labels

pub mod logging;
pub mod metrics;
