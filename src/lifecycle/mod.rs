//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (CLI):
//!     Load manifest → Validate → Build router → Spawn background tasks
//!
//! Shutdown (shutdown.rs):
//!     Ctrl-C / end of command → trigger() → cache janitor and manifest
//!     watcher loops exit
//! ```
//!
//! # Design Decisions
//! - Background tasks never outlive the coordinator's broadcast
//! - Tasks subscribe before they are spawned, so no signal is missed

pub mod shutdown;

pub use shutdown::Shutdown;
