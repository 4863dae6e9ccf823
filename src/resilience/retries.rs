//! Retry budgets.
//!
//! # Responsibilities
//! - Cap how often a navigation follows guard redirects
//! - Cap how often a navigation restarts after a loader suspends
//!
//! # Design Decisions
//! - One budget per navigation and per concern; budgets are not shared
//! - Restarts are immediate (the suspense wait is the delay), so no backoff

/// Counts attempts against a fixed limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    limit: u32,
    used: u32,
}

impl RetryBudget {
    pub fn new(limit: u32) -> Self {
        Self { limit, used: 0 }
    }

    /// Spend one attempt. Returns `false` once the budget is exhausted.
    pub fn try_consume(&mut self) -> bool {
        if self.used >= self.limit {
            return false;
        }
        self.used += 1;
        true
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn remaining(&self) -> u32 {
        self.limit - self.used
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}
