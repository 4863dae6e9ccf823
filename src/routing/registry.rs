//! Route registry.
//!
//! # Responsibilities
//! - Hold the flat, ordered list of registered routes
//! - Support runtime add/remove/replace
//! - Hand out consistent snapshots to the matching engine
//!
//! # Design Decisions
//! - `ArcSwap` snapshot: readers never lock, writers swap the whole list
//! - Insertion order is preserved and semantically significant (tie breaks)
//! - A removal racing a navigation may make that navigation miss

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::routing::engine::{self, MatchError};
use crate::routing::location::Location;
use crate::routing::matched::RouteMatch;
use crate::routing::route::{Route, RouteId};

pub struct RouteRegistry {
    routes: ArcSwap<Vec<Route>>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self {
            routes: ArcSwap::from_pointee(Vec::new()),
        }
    }

    pub fn from_routes<I: IntoIterator<Item = Route>>(routes: I) -> Self {
        Self {
            routes: ArcSwap::from_pointee(routes.into_iter().collect()),
        }
    }

    /// Append a route. Later routes lose ties against earlier ones.
    pub fn add(&self, route: Route) -> RouteId {
        let id = route.id();
        self.routes.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(route.clone());
            next
        });
        tracing::debug!(route = %route, id = %id, "Route registered");
        id
    }

    /// Remove a route by id. Returns the removed route.
    pub fn remove(&self, id: RouteId) -> Option<Route> {
        let mut removed = None;
        self.routes.rcu(|current| {
            removed = current.iter().find(|r| r.id() == id).cloned();
            current
                .iter()
                .filter(|r| r.id() != id)
                .cloned()
                .collect::<Vec<_>>()
        });
        if let Some(route) = &removed {
            tracing::debug!(route = %route, id = %id, "Route removed");
        }
        removed
    }

    /// Replace the whole table atomically.
    pub fn replace<I: IntoIterator<Item = Route>>(&self, routes: I) {
        let routes: Vec<Route> = routes.into_iter().collect();
        tracing::info!(count = routes.len(), "Route table replaced");
        self.routes.store(Arc::new(routes));
    }

    pub fn snapshot(&self) -> Arc<Vec<Route>> {
        self.routes.load_full()
    }

    pub fn get(&self, id: RouteId) -> Option<Route> {
        self.routes.load().iter().find(|r| r.id() == id).cloned()
    }

    pub fn by_name(&self, name: &str) -> Option<Route> {
        self.routes
            .load()
            .iter()
            .find(|r| r.name() == Some(name))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.routes.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.load().is_empty()
    }

    /// Single-level resolution against the current snapshot.
    pub fn resolve(&self, location: &Location) -> Result<Option<RouteMatch>, MatchError> {
        engine::resolve(&self.snapshot(), location)
    }

    /// Arbitrary-depth resolution against the current snapshot.
    pub fn resolve_nested(&self, location: &Location) -> Result<Option<RouteMatch>, MatchError> {
        engine::resolve_nested(&self.snapshot(), location)
    }
}

impl Default for RouteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RouteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.routes.load().iter()).finish()
    }
}
