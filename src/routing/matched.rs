//! Match tree nodes.

use serde::Serialize;

use crate::routing::location::Location;
use crate::routing::params::Params;
use crate::routing::route::{Route, RouteId};

/// Data produced by a loader for one match node.
pub type RouteData = serde_json::Value;

/// One node of a match tree: a route, its resolved parameters and an
/// optional single child.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Route,
    pub params: Params,
    /// Pathname prefix consumed by this route.
    pub pathname: String,
    /// Raw query string (no leading `?`).
    pub search: String,
    /// Raw hash (no leading `#`).
    pub hash: String,
    pub data: Option<RouteData>,
    pub child: Option<Box<RouteMatch>>,
}

impl RouteMatch {
    pub(crate) fn new(route: Route, params: Params, consumed: usize, location: &Location) -> Self {
        let pathname = match &location.pathname[..consumed] {
            "" => "/".to_string(),
            prefix => prefix.to_string(),
        };
        Self {
            route,
            params,
            pathname,
            search: location.search.clone(),
            hash: location.hash.clone(),
            data: None,
            child: None,
        }
    }

    /// Node standing in for an unmatched location.
    pub fn fallback(route: Route, location: &Location) -> Self {
        Self {
            route,
            params: Params::new(),
            pathname: location.pathname.clone(),
            search: location.search.clone(),
            hash: location.hash.clone(),
            data: None,
            child: None,
        }
    }

    pub fn with_child(mut self, child: RouteMatch) -> Self {
        self.child = Some(Box::new(child));
        self
    }

    pub fn with_data(mut self, data: RouteData) -> Self {
        self.data = Some(data);
        self
    }

    /// Deepest node of the tree.
    pub fn leaf(&self) -> &RouteMatch {
        let mut node = self;
        while let Some(child) = node.child.as_deref() {
            node = child;
        }
        node
    }

    /// Nodes from root to leaf.
    pub fn iter(&self) -> impl Iterator<Item = &RouteMatch> {
        std::iter::successors(Some(self), |node| node.child.as_deref())
    }

    pub fn depth(&self) -> usize {
        self.iter().count()
    }

    /// Split the tree into its nodes, root first. Child links are cleared.
    pub fn into_chain(self) -> Vec<RouteMatch> {
        let mut chain = Vec::new();
        let mut next = Some(self);
        while let Some(mut node) = next {
            next = node.child.take().map(|child| *child);
            chain.push(node);
        }
        chain
    }

    /// Rebuild a tree from nodes ordered root first.
    pub fn from_chain(chain: Vec<RouteMatch>) -> Option<RouteMatch> {
        chain.into_iter().rev().fold(None, |child, mut node| {
            node.child = child.map(Box::new);
            Some(node)
        })
    }

    /// Whether any node of the tree matched `id`.
    pub fn contains(&self, id: RouteId) -> bool {
        self.iter().any(|node| node.route.id() == id)
    }

    /// Serializable view of the tree.
    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            route: self.route.id(),
            name: self.route.name().map(str::to_string),
            pattern: self.route.pattern(),
            params: self.params.clone(),
            pathname: self.pathname.clone(),
            search: self.search.clone(),
            hash: self.hash.clone(),
            data: self.data.clone(),
            child: self.child.as_ref().map(|c| Box::new(c.summary())),
        }
    }
}

/// Serializable form of a [`RouteMatch`].
#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub route: RouteId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub pattern: String,
    pub params: Params,
    pub pathname: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub search: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<RouteData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child: Option<Box<MatchSummary>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_navigation() {
        let loc = Location::parse("/users/42").unwrap();
        let root = RouteMatch::new(Route::root(), Params::new(), 0, &loc);
        let users = RouteMatch::new(Route::parse("/users").unwrap(), Params::new(), 6, &loc);
        let tree = root.with_child(users);

        assert_eq!(tree.pathname, "/");
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.leaf().pathname, "/users");

        let json = serde_json::to_value(tree.summary()).unwrap();
        assert_eq!(json["child"]["pattern"], "/users");
    }

    #[test]
    fn test_chain_round_trip() {
        let loc = Location::parse("/a").unwrap();
        let tree = RouteMatch::new(Route::root(), Params::new(), 0, &loc)
            .with_child(RouteMatch::new(Route::parse("/a").unwrap(), Params::new(), 2, &loc));

        let chain = tree.into_chain();
        assert_eq!(chain.len(), 2);
        assert!(chain.iter().all(|node| node.child.is_none()));

        let rebuilt = RouteMatch::from_chain(chain).unwrap();
        assert_eq!(rebuilt.pathname, "/");
        assert_eq!(rebuilt.leaf().pathname, "/a");
        assert!(RouteMatch::from_chain(Vec::new()).is_none());
    }
}
