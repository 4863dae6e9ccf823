//! Transition backends.
//!
//! A transition backend gets the outgoing and incoming match trees after
//! loading and before commit, e.g. to run a view transition. The router
//! bounds each call with its transition timeout.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::routing::RouteMatch;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransitionError(pub String);

pub trait TransitionBackend: Send + Sync {
    fn run(
        &self,
        from: Option<Arc<RouteMatch>>,
        to: Arc<RouteMatch>,
    ) -> BoxFuture<'static, Result<(), TransitionError>>;
}
