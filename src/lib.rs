//! Waymark: hierarchical URL router with a navigation lifecycle.
//!
//! # Architecture Overview
//!
//! ```text
//!   "/users/42?tab=posts"
//!          │
//!          ▼
//!   ┌──────────────┐    ┌──────────────┐    ┌──────────────────────────┐
//!   │   routing    │───▶│    router    │───▶│        navigation        │
//!   │ matchers,    │    │ registry,    │    │ guards → loaders → hooks │
//!   │ routes,      │    │ live token,  │    │ → transition → commit    │
//!   │ engine       │    │ current tree │    └────────────┬─────────────┘
//!   └──────────────┘    └──────────────┘                 │
//!                                                         ▼
//!                              ┌──────────────────────────────────────┐
//!                              │ resource: cache, resources, suspense │
//!                              └──────────────────────────────────────┘
//!
//!   Cross-cutting: config (TOML manifest), observability (tracing,
//!   metrics), resilience (timeouts, retry budgets), lifecycle (shutdown)
//! ```

pub mod config;
pub mod lifecycle;
pub mod navigation;
pub mod observability;
pub mod resilience;
pub mod resource;
pub mod router;
pub mod routing;

pub use config::RouterConfig;
pub use lifecycle::Shutdown;
pub use navigation::{
    ErrorKind, Guard, GuardOutcome, HistoryBackend, LoadError, Loader, LoaderContext,
    MemoryHistory, NavigationError, NavigationState,
};
pub use resource::{create_resource, Cache, EntryOptions, Priority, Resource, ResourceStore};
pub use router::{NavigationTarget, PendingNavigation, Router, RouterBuilder};
pub use routing::{
    end, optional, param, path, query, query_optional, wildcard, Location, Matcher, ParamValue,
    Params, Route, RouteError, RouteId, RouteMatch, RouteRegistry, Schema,
};
