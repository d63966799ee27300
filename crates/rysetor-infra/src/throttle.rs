//! Per-client attempt throttle backed by governor's keyed GCRA limiter.
//!
//! Counters live in this process only; replicas do not share them.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};

use rysetor_core::ports::{AttemptThrottle, Verdict};

/// Idle clients are forgotten once this many are tracked.
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// How many attempts a client gets per window.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    pub attempts: u32,
    pub window: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            attempts: 20,
            window: Duration::from_secs(60),
        }
    }
}

impl ThrottleConfig {
    /// Reads `RATE_LIMIT_MAX_REQUESTS` and `RATE_LIMIT_WINDOW_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name: &str| std::env::var(name).ok().and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            attempts: var("RATE_LIMIT_MAX_REQUESTS")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.attempts),
            window: var("RATE_LIMIT_WINDOW_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.window),
        }
    }

    /// A full burst of `attempts`, refilled evenly over `window`.
    fn quota(&self) -> Quota {
        let burst = NonZeroU32::new(self.attempts).unwrap_or(NonZeroU32::MIN);
        let refill = self.window / burst.get();

        Quota::with_period(refill)
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst)
    }
}

pub struct GovernorThrottle {
    clients: RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>,
    clock: DefaultClock,
}

impl GovernorThrottle {
    pub fn new(config: &ThrottleConfig) -> Self {
        Self {
            clients: RateLimiter::keyed(config.quota()),
            clock: DefaultClock::default(),
        }
    }
}

impl AttemptThrottle for GovernorThrottle {
    fn attempt(&self, client: &str) -> Verdict {
        if self.clients.len() > MAX_TRACKED_CLIENTS {
            self.clients.retain_recent();
        }

        match self.clients.check_key(&client.to_owned()) {
            Ok(()) => Verdict::Proceed,
            Err(not_until) => Verdict::Wait(not_until.wait_time_from(self.clock.now())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttle(attempts: u32) -> GovernorThrottle {
        GovernorThrottle::new(&ThrottleConfig {
            attempts,
            window: Duration::from_secs(60),
        })
    }

    #[test]
    fn burst_is_spent_then_client_waits() {
        let throttle = throttle(2);

        assert_eq!(throttle.attempt("10.0.0.1"), Verdict::Proceed);
        assert_eq!(throttle.attempt("10.0.0.1"), Verdict::Proceed);

        match throttle.attempt("10.0.0.1") {
            Verdict::Wait(delay) => assert!(delay > Duration::ZERO),
            Verdict::Proceed => panic!("third attempt should be throttled"),
        }
    }

    #[test]
    fn clients_are_counted_separately() {
        let throttle = throttle(1);

        assert_eq!(throttle.attempt("10.0.0.1"), Verdict::Proceed);
        assert!(matches!(throttle.attempt("10.0.0.1"), Verdict::Wait(_)));
        assert_eq!(throttle.attempt("10.0.0.2"), Verdict::Proceed);
    }

    #[test]
    fn degenerate_config_still_builds() {
        let throttle = GovernorThrottle::new(&ThrottleConfig {
            attempts: 0,
            window: Duration::ZERO,
        });

        assert_eq!(throttle.attempt("10.0.0.1"), Verdict::Proceed);
    }
}
