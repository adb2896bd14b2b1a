//! Per-provider resilience: bounded retry composed with a circuit breaker.
//!
//! [`ResilientProvider`] decorates any [`RateProvider`] and implements the
//! same trait, so resilience is transparent to callers. Policies compose
//! in a fixed order: retry innermost, circuit breaker outermost - the
//! breaker sees the fully-retried outcome before deciding to trip.
//!
//! Every provider instance owns its own breaker (independent failure
//! domains) while all instances share identical policy configuration.

mod circuit_breaker;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use retry::RetryPolicy;

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::warn;

use crate::errors::{RateError, RetryClass};
use crate::models::{Rate, RateTable};
use crate::provider::{ProviderCapabilities, RateProvider};

/// Decorator adding retry and circuit breaking to a rate provider.
///
/// Cancellation is drop-based: dropping a call's future aborts any
/// remaining retry attempts immediately, and because breaker outcomes
/// are only recorded after a completed attempt, a cancelled call never
/// counts as a circuit-breaker failure.
pub struct ResilientProvider {
    inner: Arc<dyn RateProvider>,
    retry: RetryPolicy,
    breaker: CircuitBreaker,
}

impl ResilientProvider {
    pub fn new(
        inner: Arc<dyn RateProvider>,
        retry: RetryPolicy,
        breaker_config: CircuitBreakerConfig,
    ) -> Self {
        let breaker = CircuitBreaker::new(inner.id(), breaker_config);
        Self {
            inner,
            retry,
            breaker,
        }
    }

    /// Current circuit state, for observability.
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Run one outbound operation through retry then the circuit breaker.
    async fn execute<T, F, Fut>(&self, op: F) -> Result<T, RateError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, RateError>>,
    {
        if !self.breaker.try_acquire() {
            return Err(RateError::CircuitOpen(self.inner.id().to_string()));
        }

        let mut attempt = 0u32;
        let outcome = loop {
            match op().await {
                Ok(value) => break Ok(value),
                Err(err)
                    if err.retry_class() == RetryClass::Transient
                        && attempt < self.retry.max_attempts =>
                {
                    attempt += 1;
                    let delay = self.retry.backoff_delay(attempt);
                    warn!(
                        "provider '{}': transient failure, retry {}/{} in {:?}: {}",
                        self.inner.id(),
                        attempt,
                        self.retry.max_attempts,
                        delay,
                        err
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => break Err(err),
            }
        };

        // The breaker sees only completed, fully-retried outcomes. A
        // non-transient error still proves the upstream is reachable.
        match &outcome {
            Ok(_) => self.breaker.record_success(),
            Err(err) if err.retry_class() == RetryClass::Transient => {
                self.breaker.record_failure()
            }
            Err(_) => self.breaker.record_success(),
        }

        outcome
    }
}

#[async_trait]
impl RateProvider for ResilientProvider {
    fn id(&self) -> &'static str {
        self.inner.id()
    }

    fn priority(&self) -> u8 {
        self.inner.priority()
    }

    fn capabilities(&self) -> ProviderCapabilities {
        self.inner.capabilities()
    }

    async fn fetch_latest(
        &self,
        base: &str,
        symbols: Option<&[String]>,
    ) -> Result<RateTable, RateError> {
        self.execute(|| self.inner.fetch_latest(base, symbols))
            .await
    }

    async fn fetch_historical(
        &self,
        date: NaiveDate,
        base: &str,
        symbols: Option<&[String]>,
    ) -> Result<RateTable, RateError> {
        self.execute(|| self.inner.fetch_historical(date, base, symbols))
            .await
    }

    async fn fetch_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        base: &str,
        symbols: Option<&[String]>,
    ) -> Result<BTreeMap<NaiveDate, RateTable>, RateError> {
        self.execute(|| self.inner.fetch_range(start, end, base, symbols))
            .await
    }

    async fn fetch_pair(&self, from: &str, to: &str) -> Result<Option<Rate>, RateError> {
        self.execute(|| self.inner.fetch_pair(from, to)).await
    }
}
