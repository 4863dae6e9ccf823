//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! manifest file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → loader::build_routes → Route[] → RouteRegistry
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new manifest
//!     → validation.rs validates
//!     → RouteRegistry::replace (atomic swap of the route table)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal manifests
//! - Validation separates syntactic (serde) from semantic checks
//! - Loaders, guards and views are code, so manifests only carry patterns,
//!   names, cache policies and free-form metadata

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{build_routes, load_config, parse_config, ConfigError};
pub use schema::{
    CacheConfig, CachePolicyConfig, LogFormat, NavigationConfig, ObservabilityConfig, RouteConfig,
    RouterConfig,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
