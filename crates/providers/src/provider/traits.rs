//! Rate provider trait definitions.
//!
//! This module defines the core `RateProvider` trait that all upstream
//! exchange-rate sources must implement.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::RateError;
use crate::models::{Rate, RateTable};

/// Describes what a rate provider can do natively.
#[derive(Clone, Copy, Debug)]
pub struct ProviderCapabilities {
    /// Whether the upstream exposes a native date-range endpoint.
    /// Providers without one synthesize ranges from per-day historical
    /// fetches with partial-result semantics.
    pub supports_native_range: bool,
}

/// Trait for exchange-rate providers.
///
/// Implement this trait to add support for a new upstream source. Every
/// method validates its currency arguments against the excluded set
/// before performing any I/O and rejects malformed or excluded codes
/// with [`RateError::UnsupportedCurrency`].
///
/// Cancellation is drop-based: dropping a returned future aborts the
/// operation; no partial state is recorded.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// A constant string like "FRANKFURTER" or "CURRENCYLAYER". Used for
    /// logging, circuit breaker events, and registry resolution.
    fn id(&self) -> &'static str;

    /// Provider priority for ordering. Lower values = higher priority.
    fn priority(&self) -> u8 {
        10
    }

    /// Describes what this provider can do natively.
    fn capabilities(&self) -> ProviderCapabilities;

    /// Fetch the latest rate table for a base currency.
    ///
    /// `symbols` narrows the request sent upstream; pass `None` for the
    /// complete table (the cache-population paths always do).
    async fn fetch_latest(
        &self,
        base: &str,
        symbols: Option<&[String]>,
    ) -> Result<RateTable, RateError>;

    /// Fetch the rate table for a base currency on a specific date.
    async fn fetch_historical(
        &self,
        date: NaiveDate,
        base: &str,
        symbols: Option<&[String]>,
    ) -> Result<RateTable, RateError>;

    /// Fetch one rate table per day over an inclusive date range.
    ///
    /// Providers without native range support synthesize this from
    /// per-day historical fetches; days that fail are logged and omitted
    /// rather than failing the whole range.
    async fn fetch_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        base: &str,
        symbols: Option<&[String]>,
    ) -> Result<BTreeMap<NaiveDate, RateTable>, RateError>;

    /// Fetch the latest rate for a single currency pair.
    ///
    /// Returns `Ok(None)` when the upstream answered but has no rate for
    /// the pair.
    async fn fetch_pair(&self, from: &str, to: &str) -> Result<Option<Rate>, RateError>;
}
