//! The navigation lifecycle.
//!
//! # Responsibilities
//! - Drive one navigation: match → guard → load → transition → commit
//! - Follow guard redirects and restart after loader suspensions, both capped
//! - Stop at every cancellation checkpoint and discard late results
//! - Run error hooks and the global error handler on failure
//!
//! # Design Decisions
//! - Cancellation is cooperative: checked at the start of every pass, after
//!   loading, while waiting on a suspense, and under the commit lock
//! - Redirects and suspensions restart from Matching with the same token
//! - Nothing is committed unless every phase succeeded

use std::sync::Arc;

use tracing::Instrument;

use crate::navigation::controller::NavigationController;
use crate::navigation::error::{NavigationError, NavigationResult};
use crate::navigation::guard::{run_guards, GuardContext, GuardOutcome};
use crate::navigation::hooks::{HookPhase, NavigationEvent};
use crate::navigation::loader::LoadError;
use crate::navigation::state::NavigationState;
use crate::observability::metrics;
use crate::resilience::{with_timeout, RetryBudget};
use crate::router::RouterInner;
use crate::routing::{Location, RouteMatch};

/// Run `nav` to completion against `inner`.
pub(crate) async fn run(inner: &RouterInner, nav: &NavigationController) -> NavigationResult {
    let span = tracing::info_span!("navigation", id = %nav.id, target = %nav.target);
    async {
        tracing::debug!(history_driven = nav.history_driven, "Navigation started");
        inner
            .hooks
            .run_event(event(nav, HookPhase::Start, &nav.target, None, None))
            .await;

        let result = drive(inner, nav).await;
        let elapsed = nav.started.elapsed();
        match &result {
            Ok(tree) => {
                metrics::record_navigation("success", elapsed);
                tracing::info!(
                    route = %tree.leaf().route,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Navigation committed"
                );
            }
            Err(NavigationError::Cancelled) => {
                inner.finish(nav, NavigationState::Cancelled);
                metrics::record_navigation("cancelled", elapsed);
                tracing::debug!("Navigation cancelled");
            }
            Err(error) => {
                metrics::record_navigation(error.kind().as_str(), elapsed);
                tracing::warn!(kind = %error.kind(), error = %error, "Navigation failed");
            }
        }
        result
    }
    .instrument(span)
    .await
}

async fn drive(inner: &RouterInner, nav: &NavigationController) -> NavigationResult {
    let settings = &inner.settings;
    let mut redirects = RetryBudget::new(settings.max_redirects);
    let mut suspensions = RetryBudget::new(settings.max_suspense_retries);
    let mut url = nav.target.clone();

    loop {
        if nav.is_cancelled() {
            return Err(NavigationError::Cancelled);
        }

        inner.publish(nav, NavigationState::Matching);
        let location = match Location::parse(&url) {
            Ok(location) => location,
            Err(e) => return fail(inner, nav, &url, e.into()).await,
        };
        let tree = match resolve(inner, &location) {
            Ok(tree) => Arc::new(tree),
            Err(e) => return fail(inner, nav, &url, e).await,
        };

        inner.publish(nav, NavigationState::Guarding);
        let ctx = GuardContext {
            url: url.clone(),
            to: Arc::clone(&tree),
            from: inner.current.load_full(),
        };
        match run_guards(tree.leaf().route.guards(), &ctx).await {
            GuardOutcome::Allow => {}
            GuardOutcome::Deny(reason) => {
                let error = NavigationError::GuardRejected {
                    url: url.clone(),
                    reason,
                };
                return fail(inner, nav, &url, error).await;
            }
            GuardOutcome::Redirect(next) => {
                if !redirects.try_consume() {
                    let error = NavigationError::RedirectLimit {
                        url: next,
                        limit: redirects.limit(),
                    };
                    return fail(inner, nav, &url, error).await;
                }
                tracing::debug!(from = %url, to = %next, "Guard redirected navigation");
                url = next;
                continue;
            }
        }
        drop(ctx);

        inner.publish(nav, NavigationState::Loading);
        let tree = Arc::try_unwrap(tree).unwrap_or_else(|shared| (*shared).clone());
        let loaded = match inner.hooks.run_before_complete(tree).await {
            Ok(tree) => tree,
            Err(LoadError::Pending(suspense)) => {
                if !suspensions.try_consume() {
                    let error = NavigationError::SuspenseLimit {
                        limit: suspensions.limit(),
                    };
                    return fail(inner, nav, &url, error).await;
                }
                metrics::record_suspension();
                tracing::debug!(attempt = suspensions.used(), "Loader suspended, waiting on resource");

                let limit = settings.suspense_timeout();
                tokio::select! {
                    _ = nav.cancelled() => return Err(NavigationError::Cancelled),
                    waited = with_timeout(limit, suspense.wait()) => {
                        if waited.is_err() {
                            return fail(inner, nav, &url, NavigationError::SuspenseTimeout(limit)).await;
                        }
                    }
                }
                continue;
            }
            Err(LoadError::Failed { route, message }) => {
                let error = NavigationError::LoaderFailed {
                    route: route.unwrap_or_else(|| "before-complete hook".to_string()),
                    message,
                };
                return fail(inner, nav, &url, error).await;
            }
        };

        if nav.is_cancelled() {
            return Err(NavigationError::Cancelled);
        }
        let tree = Arc::new(loaded);

        if let Some(transition) = &inner.transition {
            inner.publish(nav, NavigationState::Transitioning);
            let from = inner.current.load_full();
            let outcome = with_timeout(
                settings.transition_timeout(),
                transition.run(from, Arc::clone(&tree)),
            )
            .await;
            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(timed_out) => Some(timed_out.to_string()),
            };
            if let Some(message) = failure {
                return fail(inner, nav, &url, NavigationError::Transition(message)).await;
            }
        }

        commit(inner, nav, &tree, &location)?;
        inner
            .hooks
            .run_event(event(nav, HookPhase::Complete, &url, Some(Arc::clone(&tree)), None))
            .await;
        inner.finish(nav, NavigationState::Idle);
        return Ok(tree);
    }
}

fn resolve(inner: &RouterInner, location: &Location) -> Result<RouteMatch, NavigationError> {
    if let Some(tree) = inner.registry.resolve(location)? {
        metrics::record_match("hit");
        return Ok(tree);
    }
    match inner.fallback.load_full() {
        Some(route) => {
            metrics::record_match("fallback");
            tracing::debug!(fallback = %route, "No route matched, using fallback");
            Ok(RouteMatch::fallback((*route).clone(), location))
        }
        None => {
            metrics::record_match("miss");
            Err(NavigationError::RouteNotFound {
                url: location.href(),
            })
        }
    }
}

/// Publish `tree` if `nav` is still live. Holds the live lock throughout so
/// a competing navigation cannot commit in between.
fn commit(
    inner: &RouterInner,
    nav: &NavigationController,
    tree: &Arc<RouteMatch>,
    location: &Location,
) -> Result<(), NavigationError> {
    let live = inner.live.lock().expect("live navigation mutex poisoned");
    if nav.is_cancelled() || !live.as_ref().is_some_and(|l| l.id == nav.id) {
        return Err(NavigationError::Cancelled);
    }

    inner.send_state(NavigationState::Committing);
    inner.current.store(Some(Arc::clone(tree)));
    if !nav.history_driven {
        inner.history.push(&location.href());
    }
    tracing::debug!(url = %location, "Match tree committed");
    Ok(())
}

async fn fail(
    inner: &RouterInner,
    nav: &NavigationController,
    url: &str,
    error: NavigationError,
) -> NavigationResult {
    if error.is_cancelled() || nav.is_cancelled() {
        return Err(NavigationError::Cancelled);
    }

    inner.finish(nav, NavigationState::Failed);
    inner
        .hooks
        .run_event(event(nav, HookPhase::Error, url, None, Some(error.clone())))
        .await;
    if let Some(handler) = &inner.error_handler {
        handler(&error);
    }
    Err(error)
}

fn event(
    nav: &NavigationController,
    phase: HookPhase,
    url: &str,
    tree: Option<Arc<RouteMatch>>,
    error: Option<NavigationError>,
) -> NavigationEvent {
    NavigationEvent {
        navigation: nav.id,
        phase,
        url: url.to_string(),
        tree,
        error,
    }
}
