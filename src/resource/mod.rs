//! Resource and cache subsystem.
//!
//! # Data Flow
//! ```text
//! Loader
//!     → store.rs (reuse a Resource by key)
//!     → suspense.rs (spawned computation, Pending → Success | Error)
//!     → read(): value | Failed(error) | Pending(Suspense)
//!
//! Built-in loader hook
//!     → cache.rs (lookup by route + location; TTL, priority, tags)
//!     → miss: run loader, store with the route's cache policy
//! ```
//!
//! # Design Decisions
//! - Cache is injected explicitly, never a process-wide singleton
//! - Suspense handles are type-erased so any resource can suspend a navigation

pub mod cache;
pub mod store;
pub mod suspense;

use std::future::Future;

pub use cache::{Cache, CacheEntry, CacheStats, EntryOptions, Priority};
pub use store::ResourceStore;
pub use suspense::{ReadError, Resource, ResourceError, ResourceStatus, Suspense};

/// Start `future` and wrap it in a [`Resource`].
pub fn create_resource<T, E, F>(future: F) -> Resource<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    F: Future<Output = Result<T, E>> + Send + 'static,
{
    Resource::new(future)
}
