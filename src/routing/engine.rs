//! Matching engine.
//!
//! # Responsibilities
//! - Run every registered route's parser against a pathname
//! - Select the parent (shortest success) and its single child (first
//!   strictly-longer success, in registry order)
//! - Merge path captures with validated query values
//!
//! # Design Decisions
//! - Ties on consumed length resolve by registry order
//! - Path validation failures silently exclude a route; query validation
//!   failures are errors because they happen after route selection
//! - One nesting level per call; `resolve_nested` layers deeper chains on top

use thiserror::Error;

use crate::routing::location::Location;
use crate::routing::matched::RouteMatch;
use crate::routing::parser::{PathMatch, QueryError};
use crate::routing::route::{Route, RouteId};

/// A selected route whose query parameters failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("route {route} rejected the query string: {source}")]
pub struct MatchError {
    pub route: RouteId,
    #[source]
    pub source: QueryError,
}

struct Candidate<'r> {
    route: &'r Route,
    path: PathMatch,
}

fn candidates<'r>(routes: &'r [Route], pathname: &str) -> Vec<Candidate<'r>> {
    routes
        .iter()
        .filter_map(|route| {
            route
                .parser()
                .parse_path(pathname)
                .map(|path| Candidate { route, path })
        })
        .collect()
}

/// First candidate with the smallest consumed length greater than `floor`.
fn shortest_above<'a, 'r>(candidates: &'a [Candidate<'r>], floor: Option<usize>) -> Option<&'a Candidate<'r>> {
    candidates
        .iter()
        .filter(|c| floor.map_or(true, |f| c.path.consumed > f))
        .fold(None, |best: Option<&Candidate<'r>>, c| match best {
            Some(b) if b.path.consumed <= c.path.consumed => Some(b),
            _ => Some(c),
        })
}

fn node(candidate: &Candidate<'_>, location: &Location) -> Result<RouteMatch, MatchError> {
    let query = candidate
        .route
        .parser()
        .resolve_query(&location.search)
        .map_err(|source| MatchError {
            route: candidate.route.id(),
            source,
        })?;

    let mut params = candidate.path.params.clone();
    for (name, value) in query {
        params.entry(name).or_insert(value);
    }

    Ok(RouteMatch::new(
        candidate.route.clone(),
        params,
        candidate.path.consumed,
        location,
    ))
}

/// Resolve `location` into a parent match with at most one child.
///
/// `Ok(None)` means no route matched.
pub fn resolve(routes: &[Route], location: &Location) -> Result<Option<RouteMatch>, MatchError> {
    let candidates = candidates(routes, &location.pathname);

    let Some(parent) = shortest_above(&candidates, None) else {
        return Ok(None);
    };
    let child = candidates
        .iter()
        .find(|c| c.path.consumed > parent.path.consumed);

    let mut tree = node(parent, location)?;
    if let Some(child) = child {
        tree = tree.with_child(node(child, location)?);
    }
    Ok(Some(tree))
}

/// Resolve `location` into a chain of arbitrary depth.
///
/// Each level is the shortest success strictly longer than the level above
/// it, so layout routes nest naturally (`/` → `/users` → `/users/:id`).
pub fn resolve_nested(routes: &[Route], location: &Location) -> Result<Option<RouteMatch>, MatchError> {
    let candidates = candidates(routes, &location.pathname);

    let mut chain = Vec::new();
    let mut floor = None;
    while let Some(level) = shortest_above(&candidates, floor) {
        chain.push(node(level, location)?);
        floor = Some(level.path.consumed);
    }
    Ok(RouteMatch::from_chain(chain))
}
