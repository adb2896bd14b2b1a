//! Per-provider circuit breaker.
//!
//! An explicit three-state machine owned by each provider instance:
//!
//! - **Closed**: normal operation, calls are allowed through.
//! - **Open**: the provider keeps failing; calls fail fast for a
//!   cool-down period without touching the network.
//! - **HalfOpen**: cool-down elapsed; exactly one probe call is allowed
//!   to test recovery.
//!
//! The breaker counts consecutive transient outcomes as seen *after*
//! the retry policy has run. State is in-memory and resets on restart.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

/// Default number of consecutive failures before opening the circuit.
const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Default cool-down before transitioning from Open to HalfOpen.
const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Circuit breaker state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CircuitState {
    /// Normal operation - calls are allowed.
    Closed,
    /// Provider is failing - calls are rejected.
    Open,
    /// Testing recovery - a single probe call is allowed.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
            Self::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

/// Circuit breaker configuration.
#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Consecutive transient failures before opening the circuit.
    pub failure_threshold: u32,
    /// How long the circuit stays open before allowing a probe.
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

#[derive(Debug)]
struct CircuitInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    /// Set while a HalfOpen probe is in flight; a probe that never
    /// completes (dropped future) is superseded after another cooldown.
    probe_started: Option<Instant>,
}

/// Circuit breaker for a single provider instance.
///
/// Thread-safe; shared across concurrent calls through the same
/// provider. Failure domains are independent: each wrapped provider
/// owns its own breaker.
pub struct CircuitBreaker {
    provider: String,
    inner: Mutex<CircuitInner>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(provider: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            provider: provider.into(),
            inner: Mutex::new(CircuitInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probe_started: None,
            }),
            config,
        }
    }

    /// Lock the state, recovering from poison if necessary. Recovering is
    /// safe here: the worst case is a slightly stale circuit view.
    fn lock(&self) -> MutexGuard<'_, CircuitInner> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("circuit breaker mutex for '{}' was poisoned", self.provider);
            poisoned.into_inner()
        })
    }

    /// Whether a call may proceed right now.
    ///
    /// Handles the Open -> HalfOpen transition when the cool-down has
    /// elapsed; the call that observes the transition becomes the probe.
    /// While a probe is in flight, concurrent calls are rejected.
    pub fn try_acquire(&self) -> bool {
        let mut inner = self.lock();

        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|t| t.elapsed() >= self.config.cooldown)
                    .unwrap_or(true);
                if elapsed {
                    info!(
                        "circuit breaker: '{}' transitioning Open -> HalfOpen, probing",
                        self.provider
                    );
                    inner.state = CircuitState::HalfOpen;
                    inner.probe_started = Some(Instant::now());
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => match inner.probe_started {
                Some(started) if started.elapsed() < self.config.cooldown => false,
                _ => {
                    // The previous probe never reported back; allow another.
                    inner.probe_started = Some(Instant::now());
                    true
                }
            },
        }
    }

    /// Record a successful (or non-transient, upstream-reachable) outcome.
    ///
    /// Resets the consecutive-failure counter; a HalfOpen probe success
    /// closes the circuit.
    pub fn record_success(&self) {
        let mut inner = self.lock();

        if inner.state != CircuitState::Closed {
            info!(
                "circuit breaker: closing circuit for '{}' after successful probe",
                self.provider
            );
        }
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.probe_started = None;
    }

    /// Record a transient failure outcome (post-retry).
    ///
    /// In Closed state the consecutive counter grows and may open the
    /// circuit; in HalfOpen any failure reopens it and restarts the
    /// cool-down.
    pub fn record_failure(&self) {
        let mut inner = self.lock();

        inner.consecutive_failures += 1;

        match inner.state {
            CircuitState::Closed => {
                if inner.consecutive_failures >= self.config.failure_threshold {
                    info!(
                        "circuit breaker: opening circuit for '{}' after {} consecutive failures",
                        self.provider, inner.consecutive_failures
                    );
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                } else {
                    debug!(
                        "circuit breaker: failure for '{}' ({}/{})",
                        self.provider, inner.consecutive_failures, self.config.failure_threshold
                    );
                }
            }
            CircuitState::HalfOpen => {
                info!(
                    "circuit breaker: reopening circuit for '{}' after failed probe",
                    self.provider
                );
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                inner.probe_started = None;
            }
            CircuitState::Open => {
                // Late failure report; keep the circuit open.
                inner.opened_at = Some(Instant::now());
            }
        }
    }

    /// The current state as last recorded. An Open circuit whose
    /// cool-down has elapsed still reports Open until a call probes it.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// The current consecutive-failure count.
    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }
}
