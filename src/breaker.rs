//! # Circuit breaker
//!
//! Process-local fault isolation for the upstream catalog.
//!
//! ```text
//!            failures >= threshold              cooldown elapsed
//!  Closed ─────────────────────────▶ Open ─────────────────────────▶ HalfOpen
//!    ▲                                 ▲                                │
//!    │           probe succeeded       │         probe failed           │
//!    └─────────────────────────────────┼────────────────────────────────┤
//!                                      └────────────────────────────────┘
//! ```
//!
//! All state lives in one [`BreakerState`] behind a single mutex and changes
//! only through the methods below, so a transition is never observed half
//! done. Half-open admits exactly one probe; everything else fails fast until
//! the probe reports back.
//!
//! Failures are only counted while recent: if the previous failure is older
//! than the failure window, the count restarts before the new one is added.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::BreakerConfig;
use crate::error::CatalogError;

/// Operational mode of the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation, all calls pass.
    Closed,
    /// Failing fast until the cooldown elapses.
    Open,
    /// One probe call is allowed through to test recovery.
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
pub struct BreakerSettings {
    pub failure_threshold: u32,
    pub cooldown: Duration,
    pub failure_window: Duration,
}

impl From<&BreakerConfig> for BreakerSettings {
    fn from(c: &BreakerConfig) -> Self {
        Self {
            failure_threshold: c.failure_threshold.max(1),
            cooldown: Duration::from_secs(c.cooldown_secs),
            failure_window: Duration::from_secs(c.failure_window_secs),
        }
    }
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self::from(&BreakerConfig::default())
    }
}

#[derive(Debug)]
struct BreakerState {
    circuit: CircuitState,
    failures: u32,
    last_failure: Option<Instant>,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

impl BreakerState {
    fn closed() -> Self {
        Self {
            circuit: CircuitState::Closed,
            failures: 0,
            last_failure: None,
            opened_at: None,
            probe_in_flight: false,
        }
    }

    fn open(&mut self, now: Instant) {
        self.circuit = CircuitState::Open;
        self.opened_at = Some(now);
        self.probe_in_flight = false;
    }

    fn remaining(&self, cooldown: Duration, now: Instant) -> Duration {
        self.opened_at
            .map(|t| cooldown.saturating_sub(now.saturating_duration_since(t)))
            .unwrap_or(Duration::ZERO)
    }
}

/// Point-in-time view for status endpoints and logs.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub failures: u32,
    pub failure_threshold: u32,
    /// Milliseconds until a probe is admitted; zero unless open.
    pub retry_in_ms: u64,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    settings: BreakerSettings,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(settings: BreakerSettings) -> Self {
        Self {
            settings,
            state: Mutex::new(BreakerState::closed()),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state.lock().circuit
    }

    /// Ask permission for one upstream call.
    ///
    /// Moves Open to HalfOpen once the cooldown has elapsed and hands the
    /// single probe slot to this caller.
    pub fn try_acquire(&self) -> Result<(), CatalogError> {
        let now = Instant::now();
        let mut s = self.state.lock();
        match s.circuit {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let remaining = s.remaining(self.settings.cooldown, now);
                if remaining.is_zero() {
                    s.circuit = CircuitState::HalfOpen;
                    s.probe_in_flight = true;
                    info!("circuit half-open, admitting probe");
                    Ok(())
                } else {
                    Err(CatalogError::CircuitOpen { remaining })
                }
            }
            CircuitState::HalfOpen => {
                if s.probe_in_flight {
                    Err(CatalogError::CircuitOpen {
                        remaining: Duration::ZERO,
                    })
                } else {
                    s.probe_in_flight = true;
                    Ok(())
                }
            }
        }
    }

    /// A call succeeded: close the circuit and forget past failures.
    pub fn record_success(&self) {
        let mut s = self.state.lock();
        if s.circuit != CircuitState::Closed {
            info!(previous = ?s.circuit, "circuit closed after successful call");
        }
        *s = BreakerState::closed();
    }

    /// A call failed in a way that counts against upstream health.
    pub fn record_failure(&self) {
        let now = Instant::now();
        let mut s = self.state.lock();

        if let Some(last) = s.last_failure {
            if now.saturating_duration_since(last) > self.settings.failure_window {
                s.failures = 0;
            }
        }
        s.failures = s.failures.saturating_add(1);
        s.last_failure = Some(now);

        match s.circuit {
            CircuitState::HalfOpen => {
                s.open(now);
                warn!(
                    cooldown_secs = self.settings.cooldown.as_secs(),
                    "probe failed, circuit re-opened"
                );
            }
            CircuitState::Closed if s.failures >= self.settings.failure_threshold => {
                s.open(now);
                warn!(
                    failures = s.failures,
                    cooldown_secs = self.settings.cooldown.as_secs(),
                    "circuit opened"
                );
            }
            _ => {}
        }
    }

    /// The admitted call ended with an outcome that says nothing about
    /// upstream health (e.g. 404). Frees the half-open probe slot.
    pub fn release(&self) {
        let mut s = self.state.lock();
        if s.circuit == CircuitState::HalfOpen {
            s.probe_in_flight = false;
        }
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let s = self.state.lock();
        let retry_in = match s.circuit {
            CircuitState::Open => s.remaining(self.settings.cooldown, Instant::now()),
            _ => Duration::ZERO,
        };
        BreakerSnapshot {
            state: s.circuit,
            failures: s.failures,
            failure_threshold: self.settings.failure_threshold,
            retry_in_ms: retry_in.as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn breaker(threshold: u32, cooldown_ms: u64, window_ms: u64) -> CircuitBreaker {
        CircuitBreaker::new(BreakerSettings {
            failure_threshold: threshold,
            cooldown: Duration::from_millis(cooldown_ms),
            failure_window: Duration::from_millis(window_ms),
        })
    }

    #[test]
    fn test_opens_at_threshold() {
        let b = breaker(5, 60_000, 60_000);
        for _ in 0..4 {
            b.record_failure();
            assert_eq!(b.state(), CircuitState::Closed);
        }
        b.record_failure();
        assert_eq!(b.state(), CircuitState::Open);
        let err = b.try_acquire().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CircuitOpen);
    }

    #[test]
    fn test_half_open_admits_exactly_one_probe() {
        let b = breaker(1, 20, 60_000);
        b.record_failure();
        assert!(b.try_acquire().is_err());
        std::thread::sleep(Duration::from_millis(40));

        assert!(b.try_acquire().is_ok());
        assert_eq!(b.state(), CircuitState::HalfOpen);
        assert!(b.try_acquire().is_err());
        assert!(b.try_acquire().is_err());
    }

    #[test]
    fn test_probe_success_closes_and_resets() {
        let b = breaker(2, 20, 60_000);
        b.record_failure();
        b.record_failure();
        std::thread::sleep(Duration::from_millis(40));
        b.try_acquire().unwrap();
        b.record_success();
        assert_eq!(b.state(), CircuitState::Closed);
        assert_eq!(b.snapshot().failures, 0);
        b.record_failure();
        assert_eq!(b.state(), CircuitState::Closed);
    }

    #[test]
    fn test_probe_failure_reopens_with_fresh_cooldown() {
        let b = breaker(1, 30, 60_000);
        b.record_failure();
        std::thread::sleep(Duration::from_millis(50));
        b.try_acquire().unwrap();
        b.record_failure();
        assert_eq!(b.state(), CircuitState::Open);
        assert!(b.try_acquire().is_err());
        assert!(b.snapshot().retry_in_ms > 0);
    }

    #[test]
    fn test_stale_failures_do_not_count() {
        let b = breaker(2, 60_000, 20);
        b.record_failure();
        std::thread::sleep(Duration::from_millis(40));
        b.record_failure();
        assert_eq!(b.state(), CircuitState::Closed);
        assert_eq!(b.snapshot().failures, 1);
    }

    #[test]
    fn test_release_frees_probe_slot() {
        let b = breaker(1, 10, 60_000);
        b.record_failure();
        std::thread::sleep(Duration::from_millis(30));
        b.try_acquire().unwrap();
        b.release();
        assert!(b.try_acquire().is_ok());
    }
}
