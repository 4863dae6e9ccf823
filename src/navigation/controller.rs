//! Navigation controller tokens.

use std::time::Instant;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Identity and cancellation handle of one navigation.
#[derive(Debug)]
pub struct NavigationController {
    pub id: Uuid,
    /// URL the navigation was started with (before redirects).
    pub target: String,
    /// Started from a history move; commit does not push a new entry.
    pub history_driven: bool,
    pub started: Instant,
    token: CancellationToken,
}

impl NavigationController {
    pub fn new(target: impl Into<String>, history_driven: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            target: target.into(),
            history_driven,
            started: Instant::now(),
            token: CancellationToken::new(),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the navigation is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}
