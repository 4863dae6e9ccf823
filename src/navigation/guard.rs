//! Navigation guards.
//!
//! A guard inspects the prospective match tree and decides whether the
//! navigation may proceed. Guards run sequentially; the first non-`Allow`
//! outcome short-circuits the rest.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};

use crate::routing::RouteMatch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Allow,
    Deny(Option<String>),
    Redirect(String),
}

impl GuardOutcome {
    pub fn deny(reason: impl Into<String>) -> Self {
        GuardOutcome::Deny(Some(reason.into()))
    }

    pub fn redirect(url: impl Into<String>) -> Self {
        GuardOutcome::Redirect(url.into())
    }
}

/// What a guard sees.
#[derive(Debug, Clone)]
pub struct GuardContext {
    /// Target URL of the navigation (after any redirects so far).
    pub url: String,
    /// Prospective match tree.
    pub to: Arc<RouteMatch>,
    /// Currently committed match tree, if any.
    pub from: Option<Arc<RouteMatch>>,
}

type GuardFn = dyn Fn(GuardContext) -> BoxFuture<'static, GuardOutcome> + Send + Sync;

/// An async guard function. Cloning is cheap.
#[derive(Clone)]
pub struct Guard {
    check: Arc<GuardFn>,
}

impl Guard {
    pub fn new<F, Fut>(check: F) -> Self
    where
        F: Fn(GuardContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = GuardOutcome> + Send + 'static,
    {
        Self {
            check: Arc::new(move |ctx| check(ctx).boxed()),
        }
    }

    /// Synchronous allow/deny predicate.
    pub fn allow_if<F>(predicate: F) -> Self
    where
        F: Fn(&GuardContext) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        Self::new(move |ctx| {
            let allowed = predicate(&ctx);
            async move {
                if allowed {
                    GuardOutcome::Allow
                } else {
                    GuardOutcome::Deny(None)
                }
            }
        })
    }

    /// Always redirect to `url`.
    pub fn redirect_to(url: impl Into<String>) -> Self {
        let url = url.into();
        Self::new(move |_| {
            let url = url.clone();
            async move { GuardOutcome::Redirect(url) }
        })
    }

    pub async fn check(&self, ctx: GuardContext) -> GuardOutcome {
        (self.check)(ctx).await
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard")
    }
}

/// Evaluate `guards` in order and return the first non-`Allow` outcome.
pub async fn run_guards(guards: &[Guard], ctx: &GuardContext) -> GuardOutcome {
    for guard in guards {
        match guard.check(ctx.clone()).await {
            GuardOutcome::Allow => continue,
            outcome => return outcome,
        }
    }
    GuardOutcome::Allow
}
