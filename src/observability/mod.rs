//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, navigation spans)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stderr (pretty or JSON lines)
//!     → any `metrics` recorder the embedding application installs
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Navigation id flows through every event of a navigation via its span
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
