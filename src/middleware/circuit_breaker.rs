use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::config::CircuitConfig;

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Model calls pass through
    Closed,
    /// Model calls fail fast until the reset window elapses
    Open,
    /// A single trial call is let through to see if the model recovered;
    /// other calls fail fast until it reports back
    HalfOpen,
}

/// Circuit breaker in front of the vision model.
///
/// A hung or down model would otherwise cost every request four full timeouts.
/// Failing fast still yields "N/A" for the affected categories.
#[derive(Clone)]
pub struct CircuitBreaker {
    inner: Arc<Mutex<BreakerInner>>,
    failure_threshold: usize,
    reset_after: Duration,
}

struct BreakerInner {
    state: CircuitState,
    consecutive_failures: usize,
    opened_at: Option<Instant>,
    /// Start of the outstanding half-open trial call
    trial_started: Option<Instant>,
    trips: usize,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: usize, reset_after: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                trial_started: None,
                trips: 0,
            })),
            failure_threshold: failure_threshold.max(1),
            reset_after,
        }
    }

    pub fn from_config(config: &CircuitConfig) -> Self {
        Self::new(config.failure_threshold, config.reset_after)
    }

    /// Returns false while the circuit is open, and while half-open with a trial call outstanding.
    ///
    /// A trial call that never reports back (e.g. its future was dropped by a timeout) is
    /// replaced once `reset_after` has passed.
    pub fn allow_request(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let elapsed = inner.opened_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed >= self.reset_after {
                    inner.state = CircuitState::HalfOpen;
                    inner.trial_started = Some(Instant::now());
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => match inner.trial_started {
                Some(started) if started.elapsed() < self.reset_after => false,
                _ => {
                    inner.trial_started = Some(Instant::now());
                    true
                }
            },
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        inner.consecutive_failures = 0;
        inner.state = CircuitState::Closed;
        inner.opened_at = None;
        inner.trial_started = None;
    }

    /// Record a failed call. Returns true if this failure tripped the circuit.
    pub fn record_failure(&self) -> bool {
        let mut inner = self.inner.lock();
        inner.consecutive_failures += 1;

        let should_open = match inner.state {
            CircuitState::HalfOpen => true,
            CircuitState::Closed => inner.consecutive_failures >= self.failure_threshold,
            CircuitState::Open => false,
        };

        if should_open {
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
            inner.trial_started = None;
            inner.trips += 1;
        }
        should_open
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn trips(&self) -> usize {
        self.inner.lock().trips
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opens_after_threshold() {
        let breaker = CircuitBreaker::new(3, Duration::from_secs(60));

        assert!(!breaker.record_failure());
        assert!(!breaker.record_failure());
        assert!(breaker.allow_request());
        assert!(breaker.record_failure());

        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.allow_request());
        assert_eq!(breaker.trips(), 1);
    }

    #[test]
    fn test_success_resets_failure_count() {
        let breaker = CircuitBreaker::new(2, Duration::from_secs(60));

        breaker.record_failure();
        breaker.record_success();
        breaker.record_failure();

        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_trial_call() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(10));
        breaker.record_failure();
        assert!(!breaker.allow_request());

        std::thread::sleep(Duration::from_millis(20));
        assert!(breaker.allow_request());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        // Only one trial call goes out
        assert!(!breaker.allow_request());

        // A failed trial call reopens immediately
        assert!(breaker.record_failure());
        assert_eq!(breaker.state(), CircuitState::Open);

        std::thread::sleep(Duration::from_millis(20));
        assert!(breaker.allow_request());
        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_allows_single_trial_call() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(50));
        breaker.record_failure();
        std::thread::sleep(Duration::from_millis(60));

        let allowed = (0..4).filter(|_| breaker.allow_request()).count();
        assert_eq!(allowed, 1);

        breaker.record_success();
        assert_eq!((0..4).filter(|_| breaker.allow_request()).count(), 4);
    }

    #[test]
    fn test_abandoned_trial_call_is_replaced() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(20));
        breaker.record_failure();
        std::thread::sleep(Duration::from_millis(30));

        assert!(breaker.allow_request());
        assert!(!breaker.allow_request());

        // The trial call never reports back
        std::thread::sleep(Duration::from_millis(30));
        assert!(breaker.allow_request());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
    }
}
