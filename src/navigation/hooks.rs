//! Lifecycle hooks.
//!
//! # Responsibilities
//! - Register and unregister callbacks per phase
//! - Run before-complete hooks sequentially, threading the match tree
//! - Run start/complete/error hooks concurrently and await them all
//!
//! # Design Decisions
//! - Hook lists are snapshotted before running, so a hook may unregister
//!   itself (or others) without deadlocking
//! - Handles hold a weak reference; dropping the router makes them inert

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use futures_util::future::{join_all, BoxFuture, FutureExt};
use serde::Serialize;
use uuid::Uuid;

use crate::navigation::error::NavigationError;
use crate::navigation::loader::LoadError;
use crate::routing::RouteMatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookPhase {
    Start,
    BeforeComplete,
    Complete,
    Error,
}

/// Payload for start, complete and error hooks.
#[derive(Debug, Clone)]
pub struct NavigationEvent {
    pub navigation: Uuid,
    pub phase: HookPhase,
    /// Target URL (after redirects, for complete and error events).
    pub url: String,
    pub tree: Option<Arc<RouteMatch>>,
    pub error: Option<NavigationError>,
}

type EventHook = Arc<dyn Fn(NavigationEvent) -> BoxFuture<'static, ()> + Send + Sync>;
type TreeHook = Arc<dyn Fn(RouteMatch) -> BoxFuture<'static, Result<RouteMatch, LoadError>> + Send + Sync>;

#[derive(Default)]
struct HookLists {
    next_id: AtomicU64,
    start: Mutex<Vec<(u64, EventHook)>>,
    before_complete: Mutex<Vec<(u64, TreeHook)>>,
    complete: Mutex<Vec<(u64, EventHook)>>,
    error: Mutex<Vec<(u64, EventHook)>>,
}

impl HookLists {
    /// Event hook list for `phase`. Before-complete hooks live in their own
    /// list and have no event list.
    fn events(&self, phase: HookPhase) -> Option<&Mutex<Vec<(u64, EventHook)>>> {
        match phase {
            HookPhase::Start => Some(&self.start),
            HookPhase::Complete => Some(&self.complete),
            HookPhase::Error => Some(&self.error),
            HookPhase::BeforeComplete => None,
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Per-router hook registry. Cloning shares the registry.
#[derive(Clone, Default)]
pub struct HookRegistry {
    lists: Arc<HookLists>,
}

/// Registration token returned by the `on_*` methods.
#[must_use = "dropping the handle keeps the hook registered; call unregister() to remove it"]
pub struct HookHandle {
    lists: Weak<HookLists>,
    phase: HookPhase,
    id: u64,
}

impl HookHandle {
    pub fn phase(&self) -> HookPhase {
        self.phase
    }

    /// Remove the hook. Returns `false` if it was already gone.
    pub fn unregister(self) -> bool {
        let Some(lists) = self.lists.upgrade() else {
            return false;
        };
        match lists.events(self.phase) {
            Some(list) => remove(list, self.id),
            None => remove(&lists.before_complete, self.id),
        }
    }
}

impl fmt::Debug for HookHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookHandle")
            .field("phase", &self.phase)
            .field("id", &self.id)
            .finish()
    }
}

fn remove<T>(list: &Mutex<Vec<(u64, T)>>, id: u64) -> bool {
    let mut list = list.lock().expect("hook list mutex poisoned");
    let before = list.len();
    list.retain(|(hook_id, _)| *hook_id != id);
    list.len() != before
}

fn snapshot<T: Clone>(list: &Mutex<Vec<(u64, T)>>) -> Vec<T> {
    list.lock()
        .expect("hook list mutex poisoned")
        .iter()
        .map(|(_, hook)| hook.clone())
        .collect()
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_event<F, Fut>(
        &self,
        phase: HookPhase,
        list: fn(&HookLists) -> &Mutex<Vec<(u64, EventHook)>>,
        hook: F,
    ) -> HookHandle
    where
        F: Fn(NavigationEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.lists.next_id();
        let hook: EventHook = Arc::new(move |event| hook(event).boxed());
        list(&self.lists)
            .lock()
            .expect("hook list mutex poisoned")
            .push((id, hook));
        HookHandle {
            lists: Arc::downgrade(&self.lists),
            phase,
            id,
        }
    }

    pub fn on_start<F, Fut>(&self, hook: F) -> HookHandle
    where
        F: Fn(NavigationEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.add_event(HookPhase::Start, |lists| &lists.start, hook)
    }

    pub fn on_complete<F, Fut>(&self, hook: F) -> HookHandle
    where
        F: Fn(NavigationEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.add_event(HookPhase::Complete, |lists| &lists.complete, hook)
    }

    pub fn on_error<F, Fut>(&self, hook: F) -> HookHandle
    where
        F: Fn(NavigationEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.add_event(HookPhase::Error, |lists| &lists.error, hook)
    }

    /// Register a hook that receives and returns the match tree before commit.
    pub fn on_before_complete<F, Fut>(&self, hook: F) -> HookHandle
    where
        F: Fn(RouteMatch) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RouteMatch, LoadError>> + Send + 'static,
    {
        let id = self.lists.next_id();
        let hook: TreeHook = Arc::new(move |tree| hook(tree).boxed());
        self.lists
            .before_complete
            .lock()
            .expect("hook list mutex poisoned")
            .push((id, hook));
        HookHandle {
            lists: Arc::downgrade(&self.lists),
            phase: HookPhase::BeforeComplete,
            id,
        }
    }

    pub fn len(&self, phase: HookPhase) -> usize {
        match self.lists.events(phase) {
            Some(list) => list.lock().expect("hook list mutex poisoned").len(),
            None => self
                .lists
                .before_complete
                .lock()
                .expect("hook list mutex poisoned")
                .len(),
        }
    }

    /// Run every hook of the event's phase concurrently.
    pub async fn run_event(&self, event: NavigationEvent) {
        let Some(list) = self.lists.events(event.phase) else {
            tracing::debug!(phase = ?event.phase, "No event hooks for this phase");
            return;
        };
        let hooks = snapshot(list);
        if hooks.is_empty() {
            return;
        }
        join_all(hooks.iter().map(|hook| hook(event.clone()))).await;
    }

    /// Thread `tree` through the before-complete hooks in registration order.
    pub async fn run_before_complete(&self, mut tree: RouteMatch) -> Result<RouteMatch, LoadError> {
        for hook in snapshot(&self.lists.before_complete) {
            tree = hook(tree).await?;
        }
        Ok(tree)
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("start", &self.len(HookPhase::Start))
            .field("before_complete", &self.len(HookPhase::BeforeComplete))
            .field("complete", &self.len(HookPhase::Complete))
            .field("error", &self.len(HookPhase::Error))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{Location, Route};
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn event(phase: HookPhase) -> NavigationEvent {
        NavigationEvent {
            navigation: Uuid::new_v4(),
            phase,
            url: "/".into(),
            tree: None,
            error: None,
        }
    }

    #[tokio::test]
    async fn test_event_hooks_all_run() {
        let hooks = HookRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let count = Arc::clone(&count);
            let _ = hooks.on_complete(move |_| {
                let count = Arc::clone(&count);
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                }
            });
        }

        hooks.run_event(event(HookPhase::Complete)).await;
        hooks.run_event(event(HookPhase::Start)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_before_complete_event_reaches_no_event_list() {
        let hooks = HookRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&count);
        let _error = hooks.on_error(move |_| {
            let counted = Arc::clone(&counted);
            async move {
                counted.fetch_add(1, Ordering::SeqCst);
            }
        });

        hooks.run_event(event(HookPhase::BeforeComplete)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(hooks.len(HookPhase::BeforeComplete), 0);
        assert_eq!(hooks.len(HookPhase::Error), 1);
    }

    #[tokio::test]
    async fn test_unregister() {
        let hooks = HookRegistry::new();
        let handle = hooks.on_error(|_| async {});
        assert_eq!(hooks.len(HookPhase::Error), 1);
        assert!(handle.unregister());
        assert_eq!(hooks.len(HookPhase::Error), 0);

        let orphan = HookRegistry::new().on_start(|_| async {});
        assert!(!orphan.unregister());
    }

    #[tokio::test]
    async fn test_before_complete_runs_in_order() {
        let hooks = HookRegistry::new();
        let _first = hooks.on_before_complete(|tree: RouteMatch| async move {
            Ok(tree.with_data(json!(["first"])))
        });
        let _second = hooks.on_before_complete(|mut tree: RouteMatch| async move {
            if let Some(serde_json::Value::Array(items)) = tree.data.as_mut() {
                items.push(json!("second"));
            }
            Ok(tree)
        });

        let loc = Location::parse("/").unwrap();
        let tree = RouteMatch::fallback(Route::root(), &loc);
        let tree = hooks.run_before_complete(tree).await.unwrap();
        assert_eq!(tree.data, Some(json!(["first", "second"])));
    }

    #[tokio::test]
    async fn test_before_complete_short_circuits() {
        let hooks = HookRegistry::new();
        let ran = Arc::new(AtomicUsize::new(0));
        let _fail = hooks.on_before_complete(|_| async { Err(LoadError::failed("nope")) });
        let counter = Arc::clone(&ran);
        let _after = hooks.on_before_complete(move |tree| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok(tree) }
        });

        let loc = Location::parse("/").unwrap();
        let result = hooks
            .run_before_complete(RouteMatch::fallback(Route::root(), &loc))
            .await;
        assert!(matches!(result, Err(LoadError::Failed { .. })));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }
}
