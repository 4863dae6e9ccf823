//! Parser assembly.
//!
//! # Responsibilities
//! - Split a route's matchers into path-consuming steps and query descriptors
//! - Sequence the path steps into one composite path parser
//! - Validate declared query parameters against a raw query string
//!
//! # Design Decisions
//! - First capture wins on duplicate parameter names
//! - A failing step aborts only this route's candidacy (`None`), never the match
//! - Query validation is deferred: only the engine holds the real query string

use std::collections::HashMap;

use thiserror::Error;

use crate::routing::matcher::{Matcher, StepError};
use crate::routing::params::{ParamValue, Params};
use crate::routing::route::RouteError;
use crate::routing::schema::{Schema, SchemaError};

/// A declared query parameter awaiting validation.
#[derive(Debug, Clone)]
pub struct QueryDescriptor {
    pub name: String,
    pub schema: Schema,
}

/// Result of a successful path parse.
#[derive(Debug, Clone, PartialEq)]
pub struct PathMatch {
    /// Number of pathname bytes consumed from index 0.
    pub consumed: usize,
    pub params: Params,
}

/// A query value that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("query parameter {name:?} is invalid: {source}")]
pub struct QueryError {
    pub name: String,
    #[source]
    pub source: SchemaError,
}

/// Composite parser compiled from a matcher sequence.
#[derive(Debug, Clone)]
pub struct CompiledParser {
    path: Vec<Matcher>,
    queries: Vec<QueryDescriptor>,
}

impl CompiledParser {
    /// Compile a matcher sequence. An empty sequence is rejected.
    pub fn compile(matchers: &[Matcher]) -> Result<Self, RouteError> {
        if matchers.is_empty() {
            return Err(RouteError::Empty);
        }
        Ok(Self::assemble(matchers))
    }

    pub(crate) fn assemble(matchers: &[Matcher]) -> Self {
        let (path, declared): (Vec<_>, Vec<_>) =
            matchers.iter().cloned().partition(Matcher::consumes_path);

        let queries = declared
            .into_iter()
            .filter_map(|m| match m {
                Matcher::Query { name, schema } => Some(QueryDescriptor { name, schema }),
                _ => None,
            })
            .collect();

        Self { path, queries }
    }

    pub fn path_matchers(&self) -> &[Matcher] {
        &self.path
    }

    pub fn queries(&self) -> &[QueryDescriptor] {
        &self.queries
    }

    /// Run the path steps in order from index 0 of `pathname`.
    pub fn parse_path(&self, pathname: &str) -> Option<PathMatch> {
        let mut rest = pathname;
        let mut params = Params::new();

        for matcher in &self.path {
            match matcher.parse(rest) {
                Ok((remaining, capture)) => {
                    if let Some((name, value)) = capture {
                        params.entry(name).or_insert(value);
                    }
                    rest = remaining;
                }
                Err(StepError::NoMatch) => return None,
                Err(e @ StepError::Invalid { .. }) => {
                    tracing::trace!(pathname = %pathname, matcher = %matcher, error = %e, "Route excluded by parameter validation");
                    return None;
                }
            }
        }

        Some(PathMatch {
            consumed: pathname.len() - rest.len(),
            params,
        })
    }

    /// Validate every declared query parameter against `search`
    /// (without the leading `?`).
    pub fn resolve_query(&self, search: &str) -> Result<Params, QueryError> {
        let mut raw: HashMap<String, String> = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(search.as_bytes()) {
            raw.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }

        let mut params = Params::new();
        for descriptor in &self.queries {
            let value = raw.get(&descriptor.name).map(|v| ParamValue::coerce(v));
            match descriptor.schema.validate(value) {
                Ok(Some(value)) => {
                    params.insert(descriptor.name.clone(), value);
                }
                Ok(None) => {}
                Err(source) => {
                    return Err(QueryError {
                        name: descriptor.name.clone(),
                        source,
                    })
                }
            }
        }
        Ok(params)
    }
}
