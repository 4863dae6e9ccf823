//! Router facade.
//!
//! # Responsibilities
//! - Own the route registry, hooks, cache, resource store and backends
//! - Start navigations (cancelling the live one) and hand back their futures
//! - Expose pure matching and URL building
//! - Publish the committed match tree and the navigation state
//!
//! # Design Decisions
//! - Each navigation runs on its own Tokio task; the returned
//!   `PendingNavigation` only observes it
//! - Exactly one live navigation; the `live` lock is also the commit lock
//! - The committed tree is swapped atomically (`ArcSwapOption`)

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use arc_swap::ArcSwapOption;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::{build_routes, ConfigError, NavigationConfig, RouterConfig};
use crate::navigation::controller::NavigationController;
use crate::navigation::error::{NavigationError, NavigationResult};
use crate::navigation::history::{HistoryBackend, MemoryHistory};
use crate::navigation::hooks::{HookHandle, HookRegistry};
use crate::navigation::lifecycle;
use crate::navigation::loader::loader_hook;
use crate::navigation::state::NavigationState;
use crate::navigation::transition::TransitionBackend;
use crate::resource::{Cache, ResourceStore};
use crate::routing::{Location, Params, Route, RouteData, RouteId, RouteMatch, RouteRegistry};

/// Global handler for failed navigations.
pub type ErrorHandler = Arc<dyn Fn(&NavigationError) + Send + Sync>;

/// Where to navigate: a URL or a route plus parameters.
#[derive(Debug, Clone)]
pub enum NavigationTarget {
    Url(String),
    Route(Route, Params),
}

impl From<&str> for NavigationTarget {
    fn from(url: &str) -> Self {
        NavigationTarget::Url(url.to_string())
    }
}

impl From<String> for NavigationTarget {
    fn from(url: String) -> Self {
        NavigationTarget::Url(url)
    }
}

impl From<(Route, Params)> for NavigationTarget {
    fn from((route, params): (Route, Params)) -> Self {
        NavigationTarget::Route(route, params)
    }
}

impl From<(&Route, Params)> for NavigationTarget {
    fn from((route, params): (&Route, Params)) -> Self {
        NavigationTarget::Route(route.clone(), params)
    }
}

pub(crate) struct RouterInner {
    pub(crate) registry: Arc<RouteRegistry>,
    pub(crate) hooks: HookRegistry,
    pub(crate) cache: Arc<Cache<RouteData>>,
    pub(crate) resources: ResourceStore<RouteData>,
    pub(crate) history: Arc<dyn HistoryBackend>,
    pub(crate) transition: Option<Arc<dyn TransitionBackend>>,
    pub(crate) fallback: ArcSwapOption<Route>,
    pub(crate) error_handler: Option<ErrorHandler>,
    pub(crate) current: ArcSwapOption<RouteMatch>,
    pub(crate) live: Mutex<Option<Arc<NavigationController>>>,
    pub(crate) state: watch::Sender<NavigationState>,
    pub(crate) settings: NavigationConfig,
    _loader_hook: HookHandle,
}

impl RouterInner {
    /// Publish `state` on behalf of `nav`, if it is still live.
    pub(crate) fn publish(&self, nav: &NavigationController, state: NavigationState) {
        let live = self.live.lock().expect("live navigation mutex poisoned");
        if live.as_ref().is_some_and(|l| l.id == nav.id) && !nav.is_cancelled() {
            self.send_state(state);
        }
    }

    /// Publish a final `state` for `nav` and release the live slot.
    pub(crate) fn finish(&self, nav: &NavigationController, state: NavigationState) {
        let mut live = self.live.lock().expect("live navigation mutex poisoned");
        if live.as_ref().is_some_and(|l| l.id == nav.id) {
            *live = None;
            self.send_state(state);
        }
    }

    pub(crate) fn send_state(&self, next: NavigationState) {
        let previous = self.state.send_replace(next);
        if !previous.can_transition_to(next) {
            tracing::debug!(from = %previous, to = %next, "Unexpected navigation state change");
        }
    }
}

/// URL router with a navigation lifecycle. Cloning is cheap.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }

    /// Build a router from a validated manifest.
    pub fn from_config(config: &RouterConfig) -> Result<Self, ConfigError> {
        let routes = build_routes(config)?;
        let fallback = config
            .fallback
            .as_deref()
            .and_then(|name| routes.iter().find(|r| r.name() == Some(name)).cloned());

        let mut builder = Router::builder()
            .routes(routes)
            .cache(Arc::new(Cache::from_config(&config.cache)))
            .settings(config.navigation.clone());
        if let Some(fallback) = fallback {
            builder = builder.fallback(fallback);
        }
        Ok(builder.build())
    }

    pub fn registry(&self) -> &Arc<RouteRegistry> {
        &self.inner.registry
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.inner.hooks
    }

    pub fn cache(&self) -> &Arc<Cache<RouteData>> {
        &self.inner.cache
    }

    pub fn resources(&self) -> &ResourceStore<RouteData> {
        &self.inner.resources
    }

    pub fn history(&self) -> &Arc<dyn HistoryBackend> {
        &self.inner.history
    }

    pub fn settings(&self) -> &NavigationConfig {
        &self.inner.settings
    }

    pub fn add_route(&self, route: Route) -> RouteId {
        self.inner.registry.add(route)
    }

    pub fn remove_route(&self, id: RouteId) -> Option<Route> {
        self.inner.registry.remove(id)
    }

    /// Replace the route table and fallback, e.g. after a manifest reload.
    pub fn replace_routes(&self, routes: Vec<Route>, fallback: Option<Route>) {
        self.inner.registry.replace(routes);
        self.inner.fallback.store(fallback.map(Arc::new));
    }

    pub fn set_fallback(&self, fallback: Option<Route>) {
        self.inner.fallback.store(fallback.map(Arc::new));
    }

    pub fn fallback(&self) -> Option<Route> {
        self.inner.fallback.load_full().map(|r| (*r).clone())
    }

    /// Resolve `url` without navigating (parent plus at most one child).
    pub fn match_url(&self, url: &str) -> Result<Option<RouteMatch>, NavigationError> {
        let location = Location::parse(url)?;
        Ok(self.inner.registry.resolve(&location)?)
    }

    /// Resolve `url` into a chain of arbitrary depth without navigating.
    pub fn match_nested(&self, url: &str) -> Result<Option<RouteMatch>, NavigationError> {
        let location = Location::parse(url)?;
        Ok(self.inner.registry.resolve_nested(&location)?)
    }

    /// Build a URL for `route`, or `None` if the parameters do not fit.
    pub fn build(&self, route: &Route, params: &Params) -> Option<String> {
        route.build(params)
    }

    /// Build a URL for the registered route called `name`.
    pub fn build_named(&self, name: &str, params: &Params) -> Option<String> {
        self.inner.registry.by_name(name)?.build(params)
    }

    /// Committed match tree.
    pub fn current(&self) -> Option<Arc<RouteMatch>> {
        self.inner.current.load_full()
    }

    pub fn state(&self) -> NavigationState {
        *self.inner.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<NavigationState> {
        self.inner.state.subscribe()
    }

    /// Id of the live navigation, if one is running.
    pub fn live_navigation(&self) -> Option<Uuid> {
        self.inner
            .live
            .lock()
            .expect("live navigation mutex poisoned")
            .as_ref()
            .map(|nav| nav.id)
    }

    /// Start a navigation. Must be called within a Tokio runtime.
    ///
    /// A target that cannot be built resolves to a validation failure
    /// without touching the live navigation.
    pub fn navigate(&self, target: impl Into<NavigationTarget>) -> PendingNavigation {
        let url = match target.into() {
            NavigationTarget::Url(url) => url,
            NavigationTarget::Route(route, params) => match route.build(&params) {
                Some(url) => url,
                None => {
                    tracing::debug!(route = %route, "Navigation target cannot be built");
                    return PendingNavigation::ready(Err(NavigationError::Unbuildable {
                        route: route.to_string(),
                    }));
                }
            },
        };
        self.start(url, false)
    }

    /// Navigate to a URL the history backend already points at.
    pub fn navigate_from_history(&self, url: impl Into<String>) -> PendingNavigation {
        self.start(url.into(), true)
    }

    /// Move back in history and navigate there. `None` at the oldest entry.
    pub fn back(&self) -> Option<PendingNavigation> {
        let url = self.inner.history.back()?;
        Some(self.navigate_from_history(url))
    }

    /// Move forward in history and navigate there. `None` at the newest entry.
    pub fn forward(&self) -> Option<PendingNavigation> {
        let url = self.inner.history.forward()?;
        Some(self.navigate_from_history(url))
    }

    /// Cancel the live navigation. Returns `false` if none was running.
    pub fn cancel(&self) -> bool {
        let mut live = self.inner.live.lock().expect("live navigation mutex poisoned");
        match live.take() {
            Some(nav) => {
                nav.cancel();
                self.inner.send_state(NavigationState::Cancelled);
                tracing::info!(navigation = %nav.id, "Navigation cancelled");
                true
            }
            None => false,
        }
    }

    fn start(&self, url: String, history_driven: bool) -> PendingNavigation {
        let nav = Arc::new(NavigationController::new(url, history_driven));
        {
            let mut live = self.inner.live.lock().expect("live navigation mutex poisoned");
            if let Some(previous) = live.replace(Arc::clone(&nav)) {
                previous.cancel();
                tracing::debug!(
                    previous = %previous.id,
                    next = %nav.id,
                    "Navigation superseded"
                );
            }
        }

        let inner = Arc::clone(&self.inner);
        let task_nav = Arc::clone(&nav);
        let handle = tokio::spawn(async move { lifecycle::run(&inner, &task_nav).await });
        PendingNavigation {
            controller: Some(nav),
            state: PendingState::Running(handle),
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.inner.registry.len())
            .field("state", &self.state())
            .field("current", &self.current().map(|tree| tree.summary()))
            .finish()
    }
}

enum PendingState {
    Ready(Option<NavigationResult>),
    Running(JoinHandle<NavigationResult>),
}

/// Deferred result of [`Router::navigate`].
///
/// The navigation runs whether or not this future is polled; dropping it
/// does not cancel the navigation.
pub struct PendingNavigation {
    controller: Option<Arc<NavigationController>>,
    state: PendingState,
}

impl PendingNavigation {
    fn ready(result: NavigationResult) -> Self {
        Self {
            controller: None,
            state: PendingState::Ready(Some(result)),
        }
    }

    /// Navigation id; `None` if the navigation never started.
    pub fn id(&self) -> Option<Uuid> {
        self.controller.as_ref().map(|nav| nav.id)
    }

    /// Cancel this navigation (no-op once it has settled).
    pub fn cancel(&self) {
        if let Some(nav) = &self.controller {
            nav.cancel();
        }
    }
}

impl Future for PendingNavigation {
    type Output = NavigationResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.state {
            PendingState::Ready(result) => Poll::Ready(
                result
                    .take()
                    .unwrap_or(Err(NavigationError::Internal("navigation polled after completion".into()))),
            ),
            PendingState::Running(handle) => match Pin::new(handle).poll(cx) {
                Poll::Pending => Poll::Pending,
                Poll::Ready(Ok(result)) => Poll::Ready(result),
                Poll::Ready(Err(e)) => Poll::Ready(Err(NavigationError::Internal(e.to_string()))),
            },
        }
    }
}

/// Assembles a [`Router`].
#[derive(Default)]
pub struct RouterBuilder {
    registry: Option<Arc<RouteRegistry>>,
    routes: Vec<Route>,
    cache: Option<Arc<Cache<RouteData>>>,
    resources: Option<ResourceStore<RouteData>>,
    history: Option<Arc<dyn HistoryBackend>>,
    transition: Option<Arc<dyn TransitionBackend>>,
    fallback: Option<Route>,
    error_handler: Option<ErrorHandler>,
    settings: NavigationConfig,
}

impl RouterBuilder {
    /// Append a route to the registry.
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    pub fn routes<I: IntoIterator<Item = Route>>(mut self, routes: I) -> Self {
        self.routes.extend(routes);
        self
    }

    /// Share an existing registry. Routes added via `route` are appended.
    pub fn registry(mut self, registry: Arc<RouteRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn cache(mut self, cache: Arc<Cache<RouteData>>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn resources(mut self, resources: ResourceStore<RouteData>) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn history(mut self, history: Arc<dyn HistoryBackend>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn transition(mut self, transition: Arc<dyn TransitionBackend>) -> Self {
        self.transition = Some(transition);
        self
    }

    /// Route substituted when nothing matches.
    pub fn fallback(mut self, route: Route) -> Self {
        self.fallback = Some(route);
        self
    }

    /// Called for every failed (not cancelled) navigation.
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&NavigationError) + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    pub fn settings(mut self, settings: NavigationConfig) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> Router {
        let registry = self.registry.unwrap_or_default();
        for route in self.routes {
            registry.add(route);
        }
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(Cache::new(crate::config::CacheConfig::default().capacity)));
        let resources = self.resources.unwrap_or_default();
        let history = self
            .history
            .unwrap_or_else(|| Arc::new(MemoryHistory::new()));

        let hooks = HookRegistry::new();
        let loader = hooks.on_before_complete(loader_hook(Arc::clone(&cache), resources.clone()));
        let (state, _) = watch::channel(NavigationState::Idle);

        tracing::debug!(routes = registry.len(), "Router built");
        Router {
            inner: Arc::new(RouterInner {
                registry,
                hooks,
                cache,
                resources,
                history,
                transition: self.transition,
                fallback: ArcSwapOption::from(self.fallback.map(Arc::new)),
                error_handler: self.error_handler,
                current: ArcSwapOption::empty(),
                live: Mutex::new(None),
                state,
                settings: self.settings,
                _loader_hook: loader,
            }),
        }
    }
}
