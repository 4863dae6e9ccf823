//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route definition:
//!     Matcher[] or "/users/:id<integer>"
//!     → pattern.rs (textual form → Matcher[])
//!     → route.rs (sequence checks, id, metadata)
//!     → parser.rs (path matchers + query descriptors, compiled lazily)
//!
//! Resolution:
//!     "/users/42?tab=a"
//!     → location.rs (pathname, search, hash)
//!     → registry.rs (current route snapshot)
//!     → engine.rs (run every parser, pick parent + child)
//!     → matched.rs (RouteMatch tree)
//! ```
//!
//! # Design Decisions
//! - Routes are a flat, ordered list; nesting falls out of prefix lengths
//! - Registry order breaks ties
//! - Deterministic: same route list and location always yield the same tree

pub mod engine;
pub mod location;
pub mod matched;
pub mod matcher;
pub mod params;
pub mod parser;
pub mod pattern;
pub mod registry;
pub mod route;
pub mod schema;

pub use engine::{resolve, resolve_nested, MatchError};
pub use location::{Location, LocationError};
pub use matched::{MatchSummary, RouteData, RouteMatch};
pub use matcher::{end, optional, param, path, query, query_optional, wildcard, Matcher, MatcherKind};
pub use params::{ParamValue, Params};
pub use parser::{CompiledParser, QueryError};
pub use registry::RouteRegistry;
pub use route::{Route, RouteError, RouteId, RouteMeta, View};
pub use schema::{Schema, SchemaError};
