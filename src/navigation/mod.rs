//! Navigation subsystem.
//!
//! # Data Flow
//! ```text
//! Router::navigate(url | (route, params))
//!     → controller.rs (uuid + cancellation token; previous live one cancelled)
//!     → lifecycle.rs
//!         Matching      → routing engine (or fallback route)
//!         Guarding      → guard.rs (leaf route's guards, in order)
//!         Loading       → hooks.rs before-complete chain
//!                          (loader.rs built-in hook first, cache-aware)
//!         Transitioning → transition.rs backend, if configured
//!         Committing    → publish tree, history.rs push, complete hooks
//!     → PendingNavigation resolves to Arc<RouteMatch> | NavigationError
//!
//! Redirect / suspension → back to Matching with the same token
//! Failure → Failed state, error hooks, global error handler
//! ```
//!
//! # Design Decisions
//! - No scheduler thread: each navigation is one Tokio task
//! - State is published on a watch channel by the live navigation only
//! - Cancelled navigations never commit and never run error hooks

pub mod controller;
pub mod error;
pub mod guard;
pub mod history;
pub mod hooks;
pub(crate) mod lifecycle;
pub mod loader;
pub mod state;
pub mod transition;

pub use controller::NavigationController;
pub use error::{ErrorKind, NavigationError, NavigationResult};
pub use guard::{Guard, GuardContext, GuardOutcome};
pub use history::{HistoryBackend, MemoryHistory};
pub use hooks::{HookHandle, HookPhase, HookRegistry, NavigationEvent};
pub use loader::{LoadError, Loader, LoaderContext};
pub use state::NavigationState;
pub use transition::{TransitionBackend, TransitionError};
