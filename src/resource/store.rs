//! Keyed resource reuse.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;

use crate::resource::suspense::{Resource, ResourceError};

/// Shares one [`Resource`] per key between readers.
///
/// Failed resources stay in the store until invalidated, so a failing
/// computation is not retried behind the caller's back.
pub struct ResourceStore<T, E = ResourceError> {
    resources: Arc<DashMap<String, Resource<T, E>>>,
}

impl<T, E> Clone for ResourceStore<T, E> {
    fn clone(&self) -> Self {
        Self {
            resources: Arc::clone(&self.resources),
        }
    }
}

impl<T, E> Default for ResourceStore<T, E> {
    fn default() -> Self {
        Self {
            resources: Arc::new(DashMap::new()),
        }
    }
}

impl<T, E> ResourceStore<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing resource for `key`, or a new one started from `make()`.
    pub fn get_or_create<F, Fut>(&self, key: impl Into<String>, make: F) -> Resource<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let key = key.into();
        self.resources
            .entry(key)
            .or_insert_with(|| Resource::new(make()))
            .clone()
    }

    pub fn get(&self, key: &str) -> Option<Resource<T, E>> {
        self.resources.get(key).map(|r| r.clone())
    }

    pub fn invalidate(&self, key: &str) -> bool {
        let removed = self.resources.remove(key).is_some();
        if removed {
            tracing::debug!(key = %key, "Resource invalidated");
        }
        removed
    }

    pub fn clear(&self) {
        self.resources.clear();
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
