//! Rate provider abstractions and implementations.
//!
//! This module contains:
//! - The `RateProvider` trait that all upstream sources implement
//! - Concrete provider implementations (Frankfurter, ExchangeRate Host,
//!   Currencylayer)
//!
//! # Architecture
//!
//! Each variant maps a distinct upstream wire format into the common
//! [`Rate`](crate::models::Rate)/[`RateTable`](crate::models::RateTable)
//! model. Providers validate currency codes against the excluded set
//! before any I/O and silently drop upstream fields that are not
//! well-formed, non-excluded currency codes.
//!
//! Providers do not retry or circuit-break themselves; resilience is
//! layered on by [`ResilientProvider`](crate::resilience::ResilientProvider).

mod traits;

pub mod currencylayer;
pub mod exchangerate_host;
pub mod frankfurter;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::warn;

use crate::errors::RateError;
use crate::models::RateTable;

// Re-exports
pub use traits::{ProviderCapabilities, RateProvider};

/// Synthesize a date-range fetch for providers without native range
/// support by issuing one historical fetch per day.
///
/// A failure on an individual day is logged and that day is omitted from
/// the result rather than aborting the whole range (partial-result
/// semantics).
pub(crate) async fn fetch_range_by_day<P>(
    provider: &P,
    start: NaiveDate,
    end: NaiveDate,
    base: &str,
    symbols: Option<&[String]>,
) -> Result<BTreeMap<NaiveDate, RateTable>, RateError>
where
    P: RateProvider + ?Sized,
{
    let mut tables = BTreeMap::new();
    let mut day = start;
    while day <= end {
        match provider.fetch_historical(day, base, symbols).await {
            Ok(table) => {
                tables.insert(day, table);
            }
            Err(err) => {
                warn!(
                    "provider '{}': dropping day {} from range {}..{}: {}",
                    provider.id(),
                    day,
                    start,
                    end,
                    err
                );
            }
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    Ok(tables)
}
