//! Suspense-style async values.
//!
//! # Responsibilities
//! - Start a computation immediately and track Pending → Success | Error
//! - Let synchronous readers either take the value or get a handle to wait on
//!
//! # Design Decisions
//! - State lives in a `watch` channel so any number of readers can observe it
//! - `Suspense` is type-erased (a shared unit future) so it can travel through
//!   loader errors regardless of the resource's value type
//! - Resolved resources never change again

use std::fmt;
use std::future::Future;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

/// Error type for resources created from string-ish failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ResourceError(pub String);

impl ResourceError {
    pub fn new(message: impl fmt::Display) -> Self {
        Self(message.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    Pending,
    Success,
    Error,
}

/// Outcome of a synchronous [`Resource::read`].
#[derive(Debug, Clone, Error)]
pub enum ReadError<E> {
    /// Not settled yet; wait on the handle and read again.
    #[error("resource is still pending")]
    Pending(Suspense),
    #[error("{0}")]
    Failed(E),
    /// The computation ended without producing a value.
    #[error("resource computation was abandoned")]
    Abandoned,
}

/// Handle that resolves once a resource settles.
#[derive(Clone)]
pub struct Suspense {
    inner: Shared<BoxFuture<'static, ()>>,
}

impl Suspense {
    pub async fn wait(&self) {
        self.inner.clone().await
    }

    pub fn is_settled(&self) -> bool {
        self.inner.peek().is_some()
    }
}

impl fmt::Debug for Suspense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suspense")
            .field("settled", &self.is_settled())
            .finish()
    }
}

#[derive(Debug, Clone)]
enum Slot<T, E> {
    Pending,
    Ready(T),
    Failed(E),
}

impl<T, E> Slot<T, E> {
    fn is_pending(&self) -> bool {
        matches!(self, Slot::Pending)
    }
}

/// An async computation readable synchronously.
#[derive(Clone)]
pub struct Resource<T, E = ResourceError> {
    rx: watch::Receiver<Slot<T, E>>,
    suspense: Suspense,
}

impl<T, E> Resource<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Spawn `future` on the current Tokio runtime.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (tx, rx) = watch::channel(Slot::Pending);
        tokio::spawn(async move {
            let slot = match future.await {
                Ok(value) => Slot::Ready(value),
                Err(error) => Slot::Failed(error),
            };
            tx.send_replace(slot);
        });
        Self::from_receiver(rx)
    }

    /// An already-resolved resource.
    pub fn ready(value: T) -> Self {
        let (_tx, rx) = watch::channel(Slot::Ready(value));
        Self::from_receiver(rx)
    }

    fn from_receiver(rx: watch::Receiver<Slot<T, E>>) -> Self {
        let mut waiter = rx.clone();
        let inner = async move {
            let _ = waiter.wait_for(|slot| !slot.is_pending()).await;
        }
        .boxed()
        .shared();
        Self {
            rx,
            suspense: Suspense { inner },
        }
    }

    pub fn status(&self) -> ResourceStatus {
        match &*self.rx.borrow() {
            Slot::Pending => ResourceStatus::Pending,
            Slot::Ready(_) => ResourceStatus::Success,
            Slot::Failed(_) => ResourceStatus::Error,
        }
    }

    /// Take the value, the original error, or a handle to wait on.
    pub fn read(&self) -> Result<T, ReadError<E>> {
        match &*self.rx.borrow() {
            Slot::Ready(value) => Ok(value.clone()),
            Slot::Failed(error) => Err(ReadError::Failed(error.clone())),
            Slot::Pending if self.rx.has_changed().is_err() => Err(ReadError::Abandoned),
            Slot::Pending => Err(ReadError::Pending(self.suspense.clone())),
        }
    }

    /// The value if already resolved successfully.
    pub fn peek(&self) -> Option<T> {
        match &*self.rx.borrow() {
            Slot::Ready(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn suspense(&self) -> Suspense {
        self.suspense.clone()
    }

    /// Wait for the computation and return its outcome.
    pub async fn settled(&self) -> Result<T, ReadError<E>> {
        self.suspense.wait().await;
        self.read()
    }
}

impl<T, E> fmt::Debug for Resource<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match &*self.rx.borrow() {
            Slot::Pending => "pending",
            Slot::Ready(_) => "success",
            Slot::Failed(_) => "error",
        };
        f.debug_struct("Resource").field("status", &status).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_pending_then_ready() {
        let (tx, rx) = oneshot::channel::<u32>();
        let resource: Resource<u32> =
            Resource::new(async move { rx.await.map_err(ResourceError::new) });

        assert_eq!(resource.status(), ResourceStatus::Pending);
        assert_eq!(resource.peek(), None);
        let suspense = match resource.read() {
            Err(ReadError::Pending(suspense)) => suspense,
            other => panic!("expected pending, got {:?}", other),
        };

        tx.send(7).unwrap();
        suspense.wait().await;
        assert!(suspense.is_settled());
        assert_eq!(resource.read().unwrap(), 7);
        assert_eq!(resource.status(), ResourceStatus::Success);
    }

    #[tokio::test]
    async fn test_failure_surfaces_original_error() {
        let resource: Resource<u32> =
            Resource::new(async { Err(ResourceError::new("boom")) });
        match resource.settled().await {
            Err(ReadError::Failed(error)) => assert_eq!(error, ResourceError::new("boom")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(resource.status(), ResourceStatus::Error);
        assert_eq!(resource.peek(), None);
    }

    #[tokio::test]
    async fn test_ready_resource() {
        let resource: Resource<&'static str> = Resource::ready("done");
        assert_eq!(resource.read().unwrap(), "done");
        tokio::time::timeout(Duration::from_millis(50), resource.suspense().wait())
            .await
            .unwrap();
    }
}
