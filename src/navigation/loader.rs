//! Route data loaders.
//!
//! # Responsibilities
//! - Define the loader function type and what it receives
//! - Provide the built-in before-complete hook that fills each node's data
//!   slot, honoring the route's cache policy
//!
//! # Design Decisions
//! - Loaders signal "not ready yet" with `LoadError::Pending(Suspense)`; the
//!   lifecycle waits on it and restarts the navigation
//! - Every node's loader runs concurrently; results land in tree order and
//!   the first failure or suspension wins
//! - Only routes with a cache policy touch the cache

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::{try_join_all, BoxFuture, FutureExt};
use thiserror::Error;

use crate::observability::metrics;
use crate::resource::{Cache, ReadError, ResourceError, ResourceStore, Suspense};
use crate::routing::{Params, Route, RouteData, RouteMatch};

/// What a loader receives for one match node.
#[derive(Clone)]
pub struct LoaderContext {
    pub route: Route,
    pub params: Params,
    /// Pathname prefix matched by this node.
    pub pathname: String,
    pub search: String,
    pub cache: Arc<Cache<RouteData>>,
    pub resources: ResourceStore<RouteData>,
}

#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// A resource the loader depends on is still pending.
    #[error("waiting on a pending resource")]
    Pending(Suspense),
    #[error("{message}")]
    Failed {
        route: Option<String>,
        message: String,
    },
}

impl LoadError {
    pub fn failed(message: impl fmt::Display) -> Self {
        LoadError::Failed {
            route: None,
            message: message.to_string(),
        }
    }

    /// Attribute a failure to `route` unless it already names one.
    pub fn at_route(self, route: &Route) -> Self {
        match self {
            LoadError::Failed { route: None, message } => LoadError::Failed {
                route: Some(route.to_string()),
                message,
            },
            other => other,
        }
    }
}

impl<E: fmt::Display> From<ReadError<E>> for LoadError {
    fn from(error: ReadError<E>) -> Self {
        match error {
            ReadError::Pending(suspense) => LoadError::Pending(suspense),
            ReadError::Failed(error) => LoadError::failed(error),
            ReadError::Abandoned => LoadError::failed("resource computation was abandoned"),
        }
    }
}

impl From<ResourceError> for LoadError {
    fn from(error: ResourceError) -> Self {
        LoadError::failed(error)
    }
}

type LoaderFn = dyn Fn(LoaderContext) -> BoxFuture<'static, Result<RouteData, LoadError>> + Send + Sync;

/// Async data loader attached to a route. Cloning is cheap.
#[derive(Clone)]
pub struct Loader {
    load: Arc<LoaderFn>,
}

impl Loader {
    pub fn new<F, Fut>(load: F) -> Self
    where
        F: Fn(LoaderContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RouteData, LoadError>> + Send + 'static,
    {
        Self {
            load: Arc::new(move |ctx| load(ctx).boxed()),
        }
    }

    pub async fn load(&self, ctx: LoaderContext) -> Result<RouteData, LoadError> {
        (self.load)(ctx).await
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Loader")
    }
}

/// Cache key for one node: route id, matched prefix and query.
pub fn cache_key(node: &RouteMatch) -> String {
    if node.search.is_empty() {
        format!("route:{}:{}", node.route.id().get(), node.pathname)
    } else {
        format!("route:{}:{}?{}", node.route.id().get(), node.pathname, node.search)
    }
}

/// Run every node's loader concurrently and store the results in the nodes'
/// data slots.
pub async fn load_tree(
    tree: RouteMatch,
    cache: &Arc<Cache<RouteData>>,
    resources: &ResourceStore<RouteData>,
) -> Result<RouteMatch, LoadError> {
    let mut chain = tree.into_chain();

    let loaded = try_join_all(chain.iter().map(|node| load_node(node, cache, resources))).await?;
    for (node, data) in chain.iter_mut().zip(loaded) {
        if data.is_some() {
            node.data = data;
        }
    }

    RouteMatch::from_chain(chain).ok_or_else(|| LoadError::failed("empty match tree"))
}

/// Load one node: cache hit, or run the loader and store under the route's
/// cache policy. `None` if the route has no loader.
async fn load_node(
    node: &RouteMatch,
    cache: &Arc<Cache<RouteData>>,
    resources: &ResourceStore<RouteData>,
) -> Result<Option<RouteData>, LoadError> {
    let route = &node.route;
    let Some(loader) = route.loader() else {
        return Ok(None);
    };
    let key = cache_key(node);
    let policy = route.cache_policy();

    if policy.is_some() {
        if let Some(data) = cache.get(&key) {
            tracing::debug!(route = %route, key = %key, "Loader served from cache");
            return Ok(Some(data));
        }
    }

    let ctx = LoaderContext {
        route: route.clone(),
        params: node.params.clone(),
        pathname: node.pathname.clone(),
        search: node.search.clone(),
        cache: Arc::clone(cache),
        resources: resources.clone(),
    };
    let started = Instant::now();
    let outcome = loader.load(ctx).await;
    metrics::record_loader(&route.pattern(), loader_outcome(&outcome), started.elapsed());

    let data = outcome.map_err(|e| e.at_route(route))?;
    if let Some(policy) = policy {
        cache.set(key, data.clone(), policy.clone());
    }
    Ok(Some(data))
}

fn loader_outcome(outcome: &Result<RouteData, LoadError>) -> &'static str {
    match outcome {
        Ok(_) => "success",
        Err(LoadError::Pending(_)) => "pending",
        Err(LoadError::Failed { .. }) => "error",
    }
}

/// The built-in before-complete hook: [`load_tree`] bound to a cache and
/// resource store.
pub fn loader_hook(
    cache: Arc<Cache<RouteData>>,
    resources: ResourceStore<RouteData>,
) -> impl Fn(RouteMatch) -> BoxFuture<'static, Result<RouteMatch, LoadError>> + Send + Sync + 'static {
    move |tree| {
        let cache = Arc::clone(&cache);
        let resources = resources.clone();
        async move { load_tree(tree, &cache, &resources).await }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::EntryOptions;
    use crate::routing::{Location, RouteRegistry};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn resolve(routes: Vec<Route>, url: &str) -> RouteMatch {
        RouteRegistry::from_routes(routes)
            .resolve(&Location::parse(url).unwrap())
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_loads_every_node() {
        let root = Route::root().with_loader(Loader::new(|_| async { Ok(json!("layout")) }));
        let user = Route::parse("/users/:id")
            .unwrap()
            .with_loader(Loader::new(|ctx: LoaderContext| async move {
                Ok(json!({ "id": ctx.params["id"].to_string() }))
            }));

        let tree = resolve(vec![root, user], "/users/9");
        let cache = Arc::new(Cache::new(8));
        let loaded = load_tree(tree, &cache, &ResourceStore::new()).await.unwrap();

        assert_eq!(loaded.data, Some(json!("layout")));
        assert_eq!(loaded.leaf().data, Some(json!({ "id": "9" })));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_cache_policy_reuses_data() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let route = Route::parse("/stats")
            .unwrap()
            .with_cache_policy(EntryOptions::new().tag("stats"))
            .with_loader(Loader::new(move |_| {
                let n = counted.fetch_add(1, Ordering::SeqCst);
                async move { Ok(json!(n)) }
            }));

        let cache = Arc::new(Cache::new(8));
        let store = ResourceStore::new();
        for _ in 0..2 {
            let tree = resolve(vec![route.clone()], "/stats");
            let loaded = load_tree(tree, &cache, &store).await.unwrap();
            assert_eq!(loaded.data, Some(json!(0)));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.invalidate_by_tags(["stats"]), 1);
    }

    #[tokio::test]
    async fn test_failure_names_route() {
        let route = Route::parse("/broken")
            .unwrap()
            .with_loader(Loader::new(|_| async { Err(LoadError::failed("db down")) }));
        let tree = resolve(vec![route], "/broken");

        match load_tree(tree, &Arc::new(Cache::new(1)), &ResourceStore::new()).await {
            Err(LoadError::Failed { route, message }) => {
                assert_eq!(route.as_deref(), Some("/broken"));
                assert_eq!(message, "db down");
            }
            other => panic!("expected failure, got {:?}", other.map(|t| t.data)),
        }
    }

    #[tokio::test]
    async fn test_pending_resource_suspends() {
        let (tx, rx) = tokio::sync::oneshot::channel::<RouteData>();
        let rx = Arc::new(std::sync::Mutex::new(Some(rx)));
        let route = Route::parse("/slow").unwrap().with_loader(Loader::new(move |ctx: LoaderContext| {
            let rx = Arc::clone(&rx);
            async move {
                let resource = ctx.resources.get_or_create("slow", move || async move {
                    let rx = rx.lock().unwrap().take();
                    match rx {
                        Some(rx) => rx.await.map_err(ResourceError::new),
                        None => Err(ResourceError::new("already consumed")),
                    }
                });
                Ok(resource.read()?)
            }
        }));

        let cache = Arc::new(Cache::new(1));
        let store = ResourceStore::new();
        let suspense = match load_tree(resolve(vec![route.clone()], "/slow"), &cache, &store).await {
            Err(LoadError::Pending(suspense)) => suspense,
            other => panic!("expected suspension, got {:?}", other.map(|t| t.data)),
        };

        tx.send(json!("ready")).unwrap();
        suspense.wait().await;
        let loaded = load_tree(resolve(vec![route], "/slow"), &cache, &store).await.unwrap();
        assert_eq!(loaded.data, Some(json!("ready")));
    }

    #[tokio::test]
    async fn test_nodes_load_concurrently() {
        let sleepy = |label: &'static str| {
            Loader::new(move |_| async move {
                tokio::time::sleep(std::time::Duration::from_millis(150)).await;
                Ok(json!(label))
            })
        };
        let root = Route::root().with_loader(sleepy("layout"));
        let users = Route::parse("/users").unwrap().with_loader(sleepy("users"));

        let tree = resolve(vec![root, users], "/users");
        let started = Instant::now();
        let loaded = load_tree(tree, &Arc::new(Cache::new(4)), &ResourceStore::new())
            .await
            .unwrap();

        assert!(started.elapsed() < std::time::Duration::from_millis(280));
        assert_eq!(loaded.data, Some(json!("layout")));
        assert_eq!(loaded.leaf().data, Some(json!("users")));
    }
}
