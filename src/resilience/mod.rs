//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Navigation lifecycle:
//!     → retries.rs (redirect budget, suspense restart budget)
//!     → timeouts.rs (deadline on suspense waits and transitions)
//! ```
//!
//! # Design Decisions
//! - Every external wait has a deadline
//! - Every restart loop has a cap

pub mod retries;
pub mod timeouts;

pub use retries::RetryBudget;
pub use timeouts::{with_timeout, TimedOut};
