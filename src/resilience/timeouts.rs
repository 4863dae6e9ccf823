//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound suspense waits and transition backends with a deadline
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - The timed-out future is dropped; work it spawned keeps running

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("timed out after {0:?}")]
pub struct TimedOut(pub Duration);

/// Await `future` for at most `limit`.
pub async fn with_timeout<F: Future>(limit: Duration, future: F) -> Result<F::Output, TimedOut> {
    tokio::time::timeout(limit, future)
        .await
        .map_err(|_| TimedOut(limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_in_time() {
        let value = with_timeout(Duration::from_millis(50), async { 3 }).await;
        assert_eq!(value, Ok(3));
    }

    #[tokio::test]
    async fn test_times_out() {
        let result = with_timeout(Duration::from_millis(10), std::future::pending::<()>()).await;
        assert_eq!(result, Err(TimedOut(Duration::from_millis(10))));
    }
}
