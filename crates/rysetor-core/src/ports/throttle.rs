//! Throttling of guessable actions: logins and admin-key approvals.

use std::time::Duration;

/// Whether an attempt may go ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Proceed,
    /// Too many recent attempts; the client should retry after this delay.
    Wait(Duration),
}

/// Counts attempts per client address.
pub trait AttemptThrottle: Send + Sync {
    /// Record one attempt from `client`.
    fn attempt(&self, client: &str) -> Verdict;
}
