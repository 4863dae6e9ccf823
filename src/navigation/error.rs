//! Navigation failures.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::routing::{LocationError, MatchError, RouteMatch};

/// Coarse failure category exposed to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    ValidationFailed,
    RouteNotFound,
    GuardRejected,
    LoaderFailed,
    Cancelled,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::ValidationFailed => "validation-failed",
            ErrorKind::RouteNotFound => "route-not-found",
            ErrorKind::GuardRejected => "guard-rejected",
            ErrorKind::LoaderFailed => "loader-failed",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
pub enum NavigationError {
    #[error("route cannot be built from the given parameters")]
    Unbuildable { route: String },

    #[error(transparent)]
    InvalidLocation(#[from] LocationError),

    #[error(transparent)]
    InvalidQuery(#[from] MatchError),

    #[error("no route matches {url:?}")]
    RouteNotFound { url: String },

    #[error("navigation to {url:?} rejected by guard{}", reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    GuardRejected { url: String, reason: Option<String> },

    #[error("too many redirects (limit {limit}) while navigating to {url:?}")]
    RedirectLimit { url: String, limit: u32 },

    #[error("loader for {route} failed: {message}")]
    LoaderFailed { route: String, message: String },

    #[error("resource did not settle within {0:?}")]
    SuspenseTimeout(Duration),

    #[error("navigation suspended more than {limit} times")]
    SuspenseLimit { limit: u32 },

    #[error("navigation was cancelled")]
    Cancelled,

    #[error("transition failed: {0}")]
    Transition(String),

    #[error("navigation task failed: {0}")]
    Internal(String),
}

impl NavigationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NavigationError::Unbuildable { .. }
            | NavigationError::InvalidLocation(_)
            | NavigationError::InvalidQuery(_) => ErrorKind::ValidationFailed,
            NavigationError::RouteNotFound { .. } => ErrorKind::RouteNotFound,
            NavigationError::GuardRejected { .. } | NavigationError::RedirectLimit { .. } => {
                ErrorKind::GuardRejected
            }
            NavigationError::LoaderFailed { .. }
            | NavigationError::SuspenseTimeout(_)
            | NavigationError::SuspenseLimit { .. } => ErrorKind::LoaderFailed,
            NavigationError::Cancelled => ErrorKind::Cancelled,
            NavigationError::Transition(_) | NavigationError::Internal(_) => ErrorKind::Unknown,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, NavigationError::Cancelled)
    }
}

/// Result of a navigation: the committed match tree or the failure.
pub type NavigationResult = Result<Arc<RouteMatch>, NavigationError>;
