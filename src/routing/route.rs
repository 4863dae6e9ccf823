//! Route definitions.
//!
//! # Responsibilities
//! - Build immutable routes from ordered matcher sequences
//! - Enforce sequence invariants (wildcard placement, terminator last)
//! - Extend routes (parent matchers + more) and apply enhancers
//!   (loader, guard, cache policy, view, custom metadata)
//! - Build URLs from a parameter bag
//!
//! # Design Decisions
//! - No parent back-reference: extension copies matchers into a new value
//! - Every definition, extension or enhancer application yields a new id
//! - Metadata is a closed set of capabilities plus an `extra` JSON map
//! - The composite parser is compiled lazily on first match

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::navigation::guard::Guard;
use crate::navigation::loader::Loader;
use crate::resource::cache::EntryOptions;
use crate::routing::matcher::{self, Matcher, MatcherKind};
use crate::routing::params::Params;
use crate::routing::parser::CompiledParser;
use crate::routing::pattern;

static NEXT_ROUTE_ID: AtomicU64 = AtomicU64::new(1);

/// Monotonic route identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RouteId(u64);

impl RouteId {
    fn next() -> Self {
        RouteId(NEXT_ROUTE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Invalid route definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("a route needs at least one matcher")]
    Empty,
    #[error("a route may contain at most one wildcard")]
    MultipleWildcards,
    #[error("wildcard {0:?} must be the last path matcher")]
    WildcardNotLast(String),
    #[error("the end marker must be the last matcher")]
    TerminatorNotLast,
    #[error("invalid pattern {pattern:?}: {reason}")]
    Pattern { pattern: String, reason: String },
}

/// Opaque view handle for the rendering layer.
pub type View = Arc<dyn Any + Send + Sync>;

/// Capabilities attached to a route.
#[derive(Clone, Default)]
pub struct RouteMeta {
    pub loader: Option<Loader>,
    pub guards: Vec<Guard>,
    pub cache_policy: Option<EntryOptions>,
    pub view: Option<View>,
    /// Free-form entries for layered features.
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl fmt::Debug for RouteMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMeta")
            .field("loader", &self.loader.is_some())
            .field("guards", &self.guards.len())
            .field("cache_policy", &self.cache_policy)
            .field("view", &self.view.is_some())
            .field("extra", &self.extra)
            .finish()
    }
}

struct RouteInner {
    id: RouteId,
    name: Option<String>,
    matchers: Arc<[Matcher]>,
    meta: RouteMeta,
    parser: OnceLock<CompiledParser>,
}

/// Immutable route definition. Cloning is cheap.
#[derive(Clone)]
pub struct Route {
    inner: Arc<RouteInner>,
}

impl Route {
    /// Create a route from an ordered matcher sequence.
    pub fn new<I>(matchers: I) -> Result<Self, RouteError>
    where
        I: IntoIterator<Item = Matcher>,
    {
        let matchers: Arc<[Matcher]> = matchers.into_iter().collect();
        validate_sequence(&matchers)?;
        Ok(Self::from_parts(None, matchers, RouteMeta::default()))
    }

    /// The root route (`/`).
    pub fn root() -> Self {
        Self::from_parts(None, Arc::from(vec![matcher::path("")]), RouteMeta::default())
    }

    /// Create a route from its textual pattern, e.g. `/users/:id<integer>`.
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        Self::new(pattern::parse_pattern(pattern)?)
    }

    fn from_parts(name: Option<String>, matchers: Arc<[Matcher]>, meta: RouteMeta) -> Self {
        Self {
            inner: Arc::new(RouteInner {
                id: RouteId::next(),
                name,
                matchers,
                meta,
                parser: OnceLock::new(),
            }),
        }
    }

    /// New route made of this route's matchers followed by `more`.
    ///
    /// Guards carry over; loader, view, cache policy and name do not.
    pub fn extend<I>(&self, more: I) -> Result<Self, RouteError>
    where
        I: IntoIterator<Item = Matcher>,
    {
        let matchers: Arc<[Matcher]> = self
            .inner
            .matchers
            .iter()
            .cloned()
            .chain(more)
            .collect();
        validate_sequence(&matchers)?;
        let meta = RouteMeta {
            guards: self.inner.meta.guards.clone(),
            ..RouteMeta::default()
        };
        Ok(Self::from_parts(None, matchers, meta))
    }

    /// Extend with a textual pattern fragment.
    pub fn extend_pattern(&self, pattern: &str) -> Result<Self, RouteError> {
        self.extend(pattern::parse_pattern(pattern)?)
    }

    fn enhance(&self, apply: impl FnOnce(&mut Option<String>, &mut RouteMeta)) -> Self {
        let mut name = self.inner.name.clone();
        let mut meta = self.inner.meta.clone();
        apply(&mut name, &mut meta);
        Self::from_parts(name, Arc::clone(&self.inner.matchers), meta)
    }

    pub fn named(&self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.enhance(|slot, _| *slot = Some(name))
    }

    pub fn with_loader(&self, loader: Loader) -> Self {
        self.enhance(|_, meta| meta.loader = Some(loader))
    }

    pub fn with_guard(&self, guard: Guard) -> Self {
        self.enhance(|_, meta| meta.guards.push(guard))
    }

    pub fn with_cache_policy(&self, policy: EntryOptions) -> Self {
        self.enhance(|_, meta| meta.cache_policy = Some(policy))
    }

    pub fn with_view<V: Any + Send + Sync>(&self, view: V) -> Self {
        self.enhance(|_, meta| meta.view = Some(Arc::new(view)))
    }

    pub fn with_meta(&self, key: impl Into<String>, value: serde_json::Value) -> Self {
        let key = key.into();
        self.enhance(|_, meta| {
            meta.extra.insert(key, value);
        })
    }

    pub fn id(&self) -> RouteId {
        self.inner.id
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.inner.matchers
    }

    pub fn meta(&self) -> &RouteMeta {
        &self.inner.meta
    }

    pub fn loader(&self) -> Option<&Loader> {
        self.inner.meta.loader.as_ref()
    }

    pub fn guards(&self) -> &[Guard] {
        &self.inner.meta.guards
    }

    pub fn cache_policy(&self) -> Option<&EntryOptions> {
        self.inner.meta.cache_policy.as_ref()
    }

    /// Downcast the attached view.
    pub fn view<V: Any + Send + Sync>(&self) -> Option<&V> {
        self.inner.meta.view.as_deref()?.downcast_ref::<V>()
    }

    pub fn extra(&self, key: &str) -> Option<&serde_json::Value> {
        self.inner.meta.extra.get(key)
    }

    /// Composite parser, compiled on first use.
    pub fn parser(&self) -> &CompiledParser {
        self.inner
            .parser
            .get_or_init(|| CompiledParser::assemble(&self.inner.matchers))
    }

    /// Build a URL (`/path?query`) or `None` if a required parameter is
    /// missing or invalid.
    pub fn build(&self, params: &Params) -> Option<String> {
        let mut pathname = String::new();
        for matcher in self.matchers() {
            pathname.push_str(&matcher.build(params)?);
        }
        if pathname.is_empty() {
            pathname.push('/');
        }

        let mut query = url::form_urlencoded::Serializer::new(String::new());
        let mut has_query = false;
        for (name, value) in self.matchers().iter().filter_map(|m| m.build_query(params)) {
            query.append_pair(&name, &value);
            has_query = true;
        }

        if has_query {
            Some(format!("{}?{}", pathname, query.finish()))
        } else {
            Some(pathname)
        }
    }

    /// Textual pattern for this route.
    pub fn pattern(&self) -> String {
        let mut path = String::new();
        let mut queries = Vec::new();
        let mut terminated = false;
        for matcher in self.matchers() {
            match matcher {
                Matcher::Query { .. } => queries.push(matcher.to_string()),
                Matcher::End => terminated = true,
                other => path.push_str(&other.to_string()),
            }
        }
        if path.is_empty() {
            path.push('/');
        }
        if terminated {
            path.push('$');
        }
        if !queries.is_empty() {
            path.push('?');
            path.push_str(&queries.join("&"));
        }
        path
    }

    pub fn ptr_eq(&self, other: &Route) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("pattern", &self.pattern())
            .field("meta", &self.inner.meta)
            .finish()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.name {
            Some(name) => write!(f, "{} ({})", name, self.pattern()),
            None => f.write_str(&self.pattern()),
        }
    }
}

fn validate_sequence(matchers: &[Matcher]) -> Result<(), RouteError> {
    if matchers.is_empty() {
        return Err(RouteError::Empty);
    }

    if let Some(pos) = matchers.iter().position(|m| m.kind() == MatcherKind::Terminator) {
        if pos != matchers.len() - 1 {
            return Err(RouteError::TerminatorNotLast);
        }
    }

    let wildcards: Vec<usize> = matchers
        .iter()
        .enumerate()
        .filter(|(_, m)| m.kind() == MatcherKind::Wildcard)
        .map(|(i, _)| i)
        .collect();
    match wildcards.as_slice() {
        [] => Ok(()),
        [pos] => {
            let trailing_path = matchers[pos + 1..]
                .iter()
                .any(|m| m.consumes_path() && m.kind() != MatcherKind::Terminator);
            if trailing_path {
                let name = matchers[*pos].param_name().unwrap_or_default().to_string();
                Err(RouteError::WildcardNotLast(name))
            } else {
                Ok(())
            }
        }
        _ => Err(RouteError::MultipleWildcards),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;
    use crate::routing::matcher::{end, optional, param, path, query, query_optional, wildcard};
    use crate::routing::schema::Schema;

    #[test]
    fn test_sequence_invariants() {
        assert_eq!(Route::new(Vec::new()).unwrap_err(), RouteError::Empty);
        assert_eq!(
            Route::new([wildcard("a"), wildcard("b")]).unwrap_err(),
            RouteError::MultipleWildcards
        );
        assert_eq!(
            Route::new([wildcard("a"), path("x")]).unwrap_err(),
            RouteError::WildcardNotLast("a".into())
        );
        assert_eq!(
            Route::new([end(), path("x")]).unwrap_err(),
            RouteError::TerminatorNotLast
        );
        assert!(Route::new([path("files"), wildcard("rest"), query("q", Schema::any()), end()]).is_ok());
    }

    #[test]
    fn test_ids_are_unique_per_application() {
        let base = Route::new([path("users")]).unwrap();
        let named = base.named("users");
        let extended = base.extend([param("id", Schema::any())]).unwrap();
        assert_ne!(base.id(), named.id());
        assert_ne!(base.id(), extended.id());
        assert_eq!(named.name(), Some("users"));
        assert_eq!(base.name(), None);
    }

    #[test]
    fn test_extend_copies_matchers_and_guards() {
        let admin = Route::new([path("admin")])
            .unwrap()
            .with_guard(Guard::allow_if(|_| true))
            .with_meta("title", serde_json::json!("Admin"));
        let users = admin.extend([path("users")]).unwrap();
        assert_eq!(users.matchers().len(), 2);
        assert_eq!(users.guards().len(), 1);
        assert!(users.extra("title").is_none());
        assert_eq!(admin.matchers().len(), 1);
    }

    #[test]
    fn test_build_urls() {
        let user = Route::new([
            path("users"),
            param("id", Schema::integer()),
            optional("edit"),
            query_optional("tab", Schema::text()),
        ])
        .unwrap();
        assert_eq!(user.build(&params! { "id" => 42 }).as_deref(), Some("/users/42"));
        assert_eq!(
            user.build(&params! { "id" => 42, "edit" => true, "tab" => "posts" }).as_deref(),
            Some("/users/42/edit?tab=posts")
        );
        assert_eq!(user.build(&params! {}), None);
        assert_eq!(Route::root().build(&params! {}).as_deref(), Some("/"));
    }

    #[test]
    fn test_pattern_rendering() {
        let route = Route::new([
            path("users"),
            param("id", Schema::integer()),
            query_optional("tab", Schema::any()),
            end(),
        ])
        .unwrap();
        assert_eq!(route.pattern(), "/users/:id<integer>$?[tab]");
        assert_eq!(Route::root().pattern(), "/");
    }

    #[test]
    fn test_view_downcast() {
        struct Page(&'static str);
        let route = Route::root().with_view(Page("home"));
        assert_eq!(route.view::<Page>().map(|p| p.0), Some("home"));
        assert!(route.view::<String>().is_none());
    }
}
