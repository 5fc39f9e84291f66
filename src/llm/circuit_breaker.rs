//! Circuit breaker for the text-completion endpoint

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    /// Reset timeout elapsed; the next call probes the endpoint
    HalfOpen,
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    consecutive_failures: usize,
    opened_at: Option<Instant>,
}

/// Trips after `failure_threshold` consecutive failures and stays open for
/// `reset_timeout`
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    failure_threshold: usize,
    reset_timeout: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: usize, reset_timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
            failure_threshold: failure_threshold.max(1),
            reset_timeout,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether calls should be rejected right now
    pub fn is_open(&self) -> bool {
        let mut inner = self.lock();
        if inner.state != BreakerState::Open {
            return false;
        }
        match inner.opened_at {
            Some(opened) if opened.elapsed() >= self.reset_timeout => {
                inner.state = BreakerState::HalfOpen;
                false
            }
            _ => true,
        }
    }

    pub fn mark_success(&self) {
        let mut inner = self.lock();
        inner.state = BreakerState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
    }

    pub fn mark_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures += 1;
        // A failed probe re-opens immediately.
        if inner.state == BreakerState::HalfOpen
            || inner.consecutive_failures >= self.failure_threshold
        {
            inner.state = BreakerState::Open;
            inner.opened_at = Some(Instant::now());
        }
    }

    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    pub fn consecutive_failures(&self) -> usize {
        self.lock().consecutive_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_by_default() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(30));
        assert!(!breaker.is_open());
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[test]
    fn test_opens_after_threshold() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(30));
        breaker.mark_failure();
        breaker.mark_failure();
        assert!(!breaker.is_open());

        breaker.mark_failure();
        assert!(breaker.is_open());
        assert_eq!(breaker.state(), BreakerState::Open);
    }

    #[test]
    fn test_success_resets_count() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(30));
        breaker.mark_failure();
        breaker.mark_failure();
        breaker.mark_success();
        assert_eq!(breaker.consecutive_failures(), 0);
        breaker.mark_failure();
        assert!(!breaker.is_open());
    }

    #[test]
    fn test_half_open_probe() {
        let breaker = CircuitBreaker::new(2, Duration::from_millis(50));
        breaker.mark_failure();
        breaker.mark_failure();
        assert!(breaker.is_open());

        std::thread::sleep(Duration::from_millis(80));
        assert!(!breaker.is_open());
        assert_eq!(breaker.state(), BreakerState::HalfOpen);

        breaker.mark_failure();
        assert!(breaker.is_open());
    }
}
